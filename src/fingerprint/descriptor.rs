//! Dense descriptor matrix with validated dimensions.

use std::hash::{Hash, Hasher};

use crate::codec::{checked_payload_len, CodecError};

/// Element type tag for a [`DescriptorMatrix`].
///
/// The numeric tags follow the conventional dense-matrix depth codes so that
/// payloads interchange cleanly with the native engine and with project files
/// written by other frontends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElemType {
    U8 = 0,
    S8 = 1,
    U16 = 2,
    S16 = 3,
    S32 = 4,
    F32 = 5,
    F64 = 6,
}

impl ElemType {
    /// Resolve a wire tag, `None` for unknown tags.
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(Self::U8),
            1 => Some(Self::S8),
            2 => Some(Self::U16),
            3 => Some(Self::S16),
            4 => Some(Self::S32),
            5 => Some(Self::F32),
            6 => Some(Self::F64),
            _ => None,
        }
    }

    /// The wire tag for this element type.
    pub fn tag(self) -> i32 {
        self as i32
    }

    /// Width of one element in bytes.
    pub fn byte_width(self) -> usize {
        match self {
            Self::U8 | Self::S8 => 1,
            Self::U16 | Self::S16 => 2,
            Self::S32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// A dense `rows x cols` matrix of feature descriptors.
///
/// Invariant, enforced at every construction site:
/// `payload.len() == rows * cols * elem_type.byte_width()`, with
/// `0 < rows <= 32768`, `0 < cols <= 32768`, and the full product computed
/// in 64-bit arithmetic staying within `i32::MAX`. There is no way to hold a
/// `DescriptorMatrix` that violates these bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorMatrix {
    rows: i32,
    cols: i32,
    elem_type: ElemType,
    payload: Vec<u8>,
}

impl DescriptorMatrix {
    /// Construct a matrix, validating dimensions against the payload.
    pub fn new(
        rows: i32,
        cols: i32,
        elem_type: ElemType,
        payload: Vec<u8>,
    ) -> Result<Self, CodecError> {
        let expected = checked_payload_len(rows, cols, elem_type)?;
        if payload.len() != expected {
            return Err(CodecError::SizeMismatch {
                expected,
                actual: payload.len(),
            });
        }
        Ok(Self {
            rows,
            cols,
            elem_type,
            payload,
        })
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn elem_type(&self) -> ElemType {
        self.elem_type
    }

    /// Raw payload bytes, row-major.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Byte length of a single row.
    pub fn row_len(&self) -> usize {
        self.cols as usize * self.elem_type.byte_width()
    }

    /// The bytes of one descriptor row, `None` past the end.
    pub fn row(&self, index: usize) -> Option<&[u8]> {
        if index >= self.rows as usize {
            return None;
        }
        let len = self.row_len();
        let start = index * len;
        Some(&self.payload[start..start + len])
    }
}

impl Hash for DescriptorMatrix {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rows.hash(state);
        self.cols.hash(state);
        self.elem_type.hash(state);
        self.payload.hash(state);
    }
}
