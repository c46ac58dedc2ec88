//! Binary buffer codec for descriptor matrices, keypoint lists, and 3D
//! point arrays.
//!
//! All wire forms are little-endian and length-prefixed:
//!
//! ```text
//! matrix:    [rows:i32][cols:i32][type_tag:i32][payload_len:i32][payload bytes]
//! keypoints: [count:i32] then per record:
//!            [x:f32][y:f32][size:f32][angle:f32][response:f32][octave:i32][class_id:i32]
//! points3d:  [count:i32][count x f32]   (count is the scalar count, % 3 == 0)
//! ```
//!
//! Decoding is defensive: dimensions are range-checked and the total size is
//! computed in 64-bit arithmetic *before* any cast or allocation, so a
//! hostile header can neither overflow the size computation nor make the
//! decoder allocate an attacker-chosen amount of memory.

use crate::fingerprint::{DescriptorMatrix, ElemType, Keypoint};

use thiserror::Error;

/// Largest accepted matrix dimension on either axis.
pub const MAX_DIM: i32 = 32768;

/// Bytes per encoded keypoint record: 5 x f32 + 2 x i32.
const KEYPOINT_RECORD_LEN: usize = 28;

/// Decoding failures for the binary wire forms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A dimension or count field is out of range, or the type tag is unknown.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// A declared length disagrees with the computed size.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The stream ended before the declared content was read.
    #[error("truncated data at byte {offset}")]
    TruncatedData { offset: usize },
}

/// Validate matrix dimensions and return the exact payload length.
///
/// Checks, in order: rows/cols positive, rows/cols within [`MAX_DIM`], and
/// `rows * cols * elem_size` within `i32::MAX` computed in i64 before any
/// truncating cast.
pub(crate) fn checked_payload_len(
    rows: i32,
    cols: i32,
    elem_type: ElemType,
) -> Result<usize, CodecError> {
    if rows <= 0 || cols <= 0 {
        return Err(CodecError::InvalidDimensions(format!(
            "rows and cols must be positive, got {rows}x{cols}"
        )));
    }
    if rows > MAX_DIM || cols > MAX_DIM {
        return Err(CodecError::InvalidDimensions(format!(
            "rows and cols must be <= {MAX_DIM}, got {rows}x{cols}"
        )));
    }
    let total = rows as i64 * cols as i64 * elem_type.byte_width() as i64;
    if total > i32::MAX as i64 {
        return Err(CodecError::InvalidDimensions(format!(
            "matrix byte size {total} exceeds i32::MAX"
        )));
    }
    Ok(total as usize)
}

// ─────────────────────────────────────────────────────────────────────────
// Encoding
// ─────────────────────────────────────────────────────────────────────────

/// Encode a matrix into its length-prefixed wire form.
pub fn encode_matrix(matrix: &DescriptorMatrix) -> Vec<u8> {
    let payload = matrix.payload();
    let mut out = Vec::with_capacity(16 + payload.len());
    out.extend_from_slice(&matrix.rows().to_le_bytes());
    out.extend_from_slice(&matrix.cols().to_le_bytes());
    out.extend_from_slice(&matrix.elem_type().tag().to_le_bytes());
    out.extend_from_slice(&(payload.len() as i32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Encode a keypoint list as a count-prefixed sequence of fixed records.
pub fn encode_keypoints(keypoints: &[Keypoint]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + keypoints.len() * KEYPOINT_RECORD_LEN);
    out.extend_from_slice(&(keypoints.len() as i32).to_le_bytes());
    for kp in keypoints {
        out.extend_from_slice(&kp.x.to_le_bytes());
        out.extend_from_slice(&kp.y.to_le_bytes());
        out.extend_from_slice(&kp.size.to_le_bytes());
        out.extend_from_slice(&kp.angle.to_le_bytes());
        out.extend_from_slice(&kp.response.to_le_bytes());
        out.extend_from_slice(&kp.octave.to_le_bytes());
        out.extend_from_slice(&kp.class_id.to_le_bytes());
    }
    out
}

/// Encode a flat 3D point array (`[x0,y0,z0, x1,y1,z1, ...]`).
pub fn encode_points3d(points: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + points.len() * 4);
    out.extend_from_slice(&(points.len() as i32).to_le_bytes());
    for v in points {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────

/// Decode a matrix from its wire form. The buffer must contain exactly one
/// encoded matrix and nothing else.
pub fn decode_matrix(bytes: &[u8]) -> Result<DescriptorMatrix, CodecError> {
    let mut r = Reader::new(bytes);
    let matrix = read_matrix(&mut r)?;
    r.expect_end()?;
    Ok(matrix)
}

/// Decode a keypoint list from its wire form.
pub fn decode_keypoints(bytes: &[u8]) -> Result<Vec<Keypoint>, CodecError> {
    let mut r = Reader::new(bytes);
    let keypoints = read_keypoints(&mut r)?;
    r.expect_end()?;
    Ok(keypoints)
}

/// Decode a flat 3D point array from its wire form.
pub fn decode_points3d(bytes: &[u8]) -> Result<Vec<f32>, CodecError> {
    let mut r = Reader::new(bytes);
    let points = read_points3d(&mut r)?;
    r.expect_end()?;
    Ok(points)
}

/// Sequential little-endian reader over a byte buffer.
///
/// Shared with the persistence layer so composite documents (fingerprints)
/// reuse the same validated segment readers.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.buf.len() - self.pos < n {
            return Err(CodecError::TruncatedData { offset: self.pos });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32, CodecError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_f32(&mut self) -> Result<f32, CodecError> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn expect_end(&self) -> Result<(), CodecError> {
        if self.pos != self.buf.len() {
            return Err(CodecError::SizeMismatch {
                expected: self.pos,
                actual: self.buf.len(),
            });
        }
        Ok(())
    }
}

pub(crate) fn read_matrix(r: &mut Reader<'_>) -> Result<DescriptorMatrix, CodecError> {
    let rows = r.read_i32()?;
    let cols = r.read_i32()?;
    let type_tag = r.read_i32()?;
    let declared_len = r.read_i32()?;

    let elem_type = ElemType::from_tag(type_tag)
        .ok_or_else(|| CodecError::InvalidDimensions(format!("unknown type tag {type_tag}")))?;
    let expected = checked_payload_len(rows, cols, elem_type)?;
    if declared_len < 0 || declared_len as usize != expected {
        return Err(CodecError::SizeMismatch {
            expected,
            actual: declared_len.max(0) as usize,
        });
    }

    // Only now is the length trusted enough to slice and copy.
    let payload = r.take(expected)?.to_vec();
    DescriptorMatrix::new(rows, cols, elem_type, payload)
}

pub(crate) fn read_keypoints(r: &mut Reader<'_>) -> Result<Vec<Keypoint>, CodecError> {
    let count = r.read_i32()?;
    if count < 0 {
        return Err(CodecError::InvalidDimensions(format!(
            "negative keypoint count {count}"
        )));
    }
    let mut keypoints = Vec::with_capacity(count.min(MAX_DIM) as usize);
    for _ in 0..count {
        keypoints.push(Keypoint {
            x: r.read_f32()?,
            y: r.read_f32()?,
            size: r.read_f32()?,
            angle: r.read_f32()?,
            response: r.read_f32()?,
            octave: r.read_i32()?,
            class_id: r.read_i32()?,
        });
    }
    Ok(keypoints)
}

pub(crate) fn read_points3d(r: &mut Reader<'_>) -> Result<Vec<f32>, CodecError> {
    let count = r.read_i32()?;
    if count < 0 {
        return Err(CodecError::InvalidDimensions(format!(
            "negative point count {count}"
        )));
    }
    if count % 3 != 0 {
        return Err(CodecError::InvalidDimensions(format!(
            "3D point scalar count {count} is not a multiple of 3"
        )));
    }
    let mut points = Vec::with_capacity(count.min(3 * MAX_DIM) as usize);
    for _ in 0..count {
        points.push(r.read_f32()?);
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_2x2() -> DescriptorMatrix {
        DescriptorMatrix::new(2, 2, ElemType::U8, vec![1, 2, 3, 4]).unwrap()
    }

    #[test]
    fn test_matrix_wire_layout() {
        // 2x2 U8 [[1,2],[3,4]]: header fields then raw payload.
        let bytes = encode_matrix(&matrix_2x2());
        let mut expected = Vec::new();
        expected.extend_from_slice(&2i32.to_le_bytes());
        expected.extend_from_slice(&2i32.to_le_bytes());
        expected.extend_from_slice(&0i32.to_le_bytes());
        expected.extend_from_slice(&4i32.to_le_bytes());
        expected.extend_from_slice(&[1, 2, 3, 4]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_matrix_round_trip() {
        let m = matrix_2x2();
        let decoded = decode_matrix(&encode_matrix(&m)).unwrap();
        assert_eq!(decoded, m);

        let wide = DescriptorMatrix::new(3, 32, ElemType::F32, vec![7; 384]).unwrap();
        assert_eq!(decode_matrix(&encode_matrix(&wide)).unwrap(), wide);
    }

    #[test]
    fn test_oversized_dimensions_rejected_before_allocation() {
        // rows = 40000 > MAX_DIM. The payload is absent on purpose: the
        // decoder must fail on the header without ever reaching for it.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&40000i32.to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&40000i32.to_le_bytes());
        assert!(matches!(
            decode_matrix(&bytes),
            Err(CodecError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_overflowing_product_rejected() {
        // 32768 x 32768 x 8 bytes = 8 GiB, far over i32::MAX, but each
        // dimension alone passes the per-axis bound.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&32768i32.to_le_bytes());
        bytes.extend_from_slice(&32768i32.to_le_bytes());
        bytes.extend_from_slice(&6i32.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        assert!(matches!(
            decode_matrix(&bytes),
            Err(CodecError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_declared_length_off_by_one_rejected() {
        let mut bytes = encode_matrix(&matrix_2x2());
        // Corrupt the payload_len field (offset 12) from 4 to 5.
        bytes[12..16].copy_from_slice(&5i32.to_le_bytes());
        assert!(matches!(
            decode_matrix(&bytes),
            Err(CodecError::SizeMismatch {
                expected: 4,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_short_payload_is_truncated() {
        let mut bytes = encode_matrix(&matrix_2x2());
        bytes.pop();
        assert!(matches!(
            decode_matrix(&bytes),
            Err(CodecError::TruncatedData { .. })
        ));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let mut bytes = encode_matrix(&matrix_2x2());
        bytes.push(0xAA);
        assert!(matches!(
            decode_matrix(&bytes),
            Err(CodecError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_type_tag_rejected() {
        let mut bytes = encode_matrix(&matrix_2x2());
        bytes[8..12].copy_from_slice(&9i32.to_le_bytes());
        assert!(matches!(
            decode_matrix(&bytes),
            Err(CodecError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_keypoints_round_trip() {
        let kps = vec![
            Keypoint {
                x: 1.5,
                y: -2.0,
                size: 31.0,
                angle: 87.5,
                response: 0.004,
                octave: 2,
                class_id: -1,
            },
            Keypoint::at(640.0, 480.0),
        ];
        let decoded = decode_keypoints(&encode_keypoints(&kps)).unwrap();
        assert_eq!(decoded, kps);
    }

    #[test]
    fn test_keypoints_truncated_stream() {
        let kps = vec![Keypoint::at(1.0, 2.0), Keypoint::at(3.0, 4.0)];
        let bytes = encode_keypoints(&kps);
        // Cut into the middle of the second record.
        assert!(matches!(
            decode_keypoints(&bytes[..bytes.len() - 10]),
            Err(CodecError::TruncatedData { .. })
        ));
    }

    #[test]
    fn test_keypoints_negative_count() {
        let bytes = (-1i32).to_le_bytes().to_vec();
        assert!(matches!(
            decode_keypoints(&bytes),
            Err(CodecError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_points3d_round_trip_and_ragged_count() {
        let pts = vec![0.0f32, 1.0, 2.0, -1.0, -2.0, -3.0];
        assert_eq!(decode_points3d(&encode_points3d(&pts)).unwrap(), pts);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&4i32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]);
        assert!(matches!(
            decode_points3d(&bytes),
            Err(CodecError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_empty_keypoint_list() {
        let decoded = decode_keypoints(&encode_keypoints(&[])).unwrap();
        assert!(decoded.is_empty());
    }
}
