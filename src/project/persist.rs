//! Encode/decode between documents and runtime values.
//!
//! The binary fingerprint form concatenates the codec segment layouts:
//!
//! ```text
//! [keypoint list][points3d array][descriptor matrix]
//! ```

use std::path::Path;

use anyhow::Context;
use thiserror::Error;

use crate::codec::{
    self, encode_keypoints, encode_matrix, encode_points3d, CodecError, Reader,
};
use crate::fingerprint::{DescriptorMatrix, ElemType, Fingerprint, FingerprintError};
use crate::geometry::AnchorTransform;

use super::document::{FingerprintDoc, LayerDoc, MatrixDoc, ProjectDoc, PROJECT_SCHEMA_VERSION};

/// Decoding failures for projects and fingerprints.
///
/// Everything here is surfaced to the caller — a target whose fingerprint
/// fails to decode is unusable, and silently dropping it would be worse
/// than failing the load.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("malformed project document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("project schema version {0} is newer than supported {PROJECT_SCHEMA_VERSION}")]
    UnsupportedVersion(u32),

    #[error("embedded matrix rejected: {0}")]
    Matrix(#[from] CodecError),

    #[error("fingerprint rejected: {0}")]
    Fingerprint(#[from] FingerprintError),
}

/// A runtime overlay layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub transform: AnchorTransform,
    /// Overlay opacity in [0, 1].
    pub opacity: f32,
    pub fingerprint: Fingerprint,
}

/// A loaded project: every layer fully validated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Project {
    pub layers: Vec<Layer>,
}

// ─────────────────────────────────────────────────────────────────────────
// Fingerprint, binary form
// ─────────────────────────────────────────────────────────────────────────

/// Encode a fingerprint into its compact binary form.
pub fn encode_fingerprint(fingerprint: &Fingerprint) -> Vec<u8> {
    let mut out = encode_keypoints(fingerprint.keypoints());
    out.extend_from_slice(&encode_points3d(fingerprint.points3d()));
    out.extend_from_slice(&encode_matrix(fingerprint.descriptors()));
    out
}

/// Decode a binary fingerprint, applying the full codec validation chain
/// plus the fingerprint's own cross-field checks.
pub fn decode_fingerprint(bytes: &[u8]) -> Result<Fingerprint, ProjectError> {
    let mut r = Reader::new(bytes);
    let keypoints = codec::read_keypoints(&mut r)?;
    let points3d = codec::read_points3d(&mut r)?;
    let matrix = codec::read_matrix(&mut r)?;
    r.expect_end()?;

    let points3d = (!points3d.is_empty()).then_some(points3d);
    Ok(Fingerprint::new(keypoints, matrix, points3d)?)
}

// ─────────────────────────────────────────────────────────────────────────
// Project, JSON form
// ─────────────────────────────────────────────────────────────────────────

/// Serialize a project to its JSON document form.
pub fn encode_project(project: &Project) -> Result<String, ProjectError> {
    let doc = ProjectDoc {
        version: PROJECT_SCHEMA_VERSION,
        layers: project.layers.iter().map(layer_to_doc).collect(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Parse and validate a project document.
///
/// Unknown keys are ignored and missing optional keys take their defaults;
/// after parsing, a single validation pass rebuilds every embedded
/// fingerprint through the same checks the codec applies, so a hostile
/// document cannot smuggle an inconsistent matrix past the decoder.
pub fn decode_project(json: &str) -> Result<Project, ProjectError> {
    let doc: ProjectDoc = serde_json::from_str(json)?;
    if doc.version > PROJECT_SCHEMA_VERSION {
        return Err(ProjectError::UnsupportedVersion(doc.version));
    }

    let mut layers = Vec::with_capacity(doc.layers.len());
    for layer in &doc.layers {
        layers.push(layer_from_doc(layer)?);
    }
    Ok(Project { layers })
}

/// Read and decode a project file.
pub fn read_project_file(path: &Path) -> anyhow::Result<Project> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading project file {}", path.display()))?;
    let project = decode_project(&json)
        .with_context(|| format!("decoding project file {}", path.display()))?;
    Ok(project)
}

/// Encode and write a project file.
pub fn write_project_file(path: &Path, project: &Project) -> anyhow::Result<()> {
    let json = encode_project(project)?;
    std::fs::write(path, json)
        .with_context(|| format!("writing project file {}", path.display()))?;
    Ok(())
}

fn layer_to_doc(layer: &Layer) -> LayerDoc {
    LayerDoc {
        name: layer.name.clone(),
        transform: *layer.transform.as_row_major(),
        opacity: layer.opacity,
        fingerprint: fingerprint_to_doc(&layer.fingerprint),
    }
}

fn layer_from_doc(doc: &LayerDoc) -> Result<Layer, ProjectError> {
    Ok(Layer {
        name: doc.name.clone(),
        transform: AnchorTransform::from_row_major(doc.transform),
        opacity: doc.opacity.clamp(0.0, 1.0),
        fingerprint: fingerprint_from_doc(&doc.fingerprint)?,
    })
}

fn fingerprint_to_doc(fingerprint: &Fingerprint) -> FingerprintDoc {
    let matrix = fingerprint.descriptors();
    FingerprintDoc {
        keypoints: fingerprint.keypoints().iter().map(Into::into).collect(),
        points3d: fingerprint.points3d().to_vec(),
        descriptors: MatrixDoc {
            rows: matrix.rows(),
            cols: matrix.cols(),
            type_tag: matrix.elem_type().tag(),
            payload: matrix.payload().to_vec(),
        },
    }
}

fn fingerprint_from_doc(doc: &FingerprintDoc) -> Result<Fingerprint, ProjectError> {
    let m = &doc.descriptors;
    let elem_type = ElemType::from_tag(m.type_tag).ok_or_else(|| {
        ProjectError::Matrix(CodecError::InvalidDimensions(format!(
            "unknown type tag {}",
            m.type_tag
        )))
    })?;
    let matrix = DescriptorMatrix::new(m.rows, m.cols, elem_type, m.payload.clone())?;

    let keypoints = doc.keypoints.iter().map(Into::into).collect();
    let points3d = (!doc.points3d.is_empty()).then(|| doc.points3d.clone());
    Ok(Fingerprint::new(keypoints, matrix, points3d)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Keypoint;

    fn sample_fingerprint() -> Fingerprint {
        let keypoints = vec![Keypoint::at(10.0, 20.0), Keypoint::at(30.0, 40.0)];
        let matrix = DescriptorMatrix::new(2, 8, ElemType::U8, (0..16).collect()).unwrap();
        let points3d = vec![0.0, 0.0, 1.0, 0.5, 0.5, 1.5];
        Fingerprint::new(keypoints, matrix, Some(points3d)).unwrap()
    }

    fn sample_project() -> Project {
        Project {
            layers: vec![Layer {
                name: "mural".to_string(),
                transform: AnchorTransform::identity(),
                opacity: 0.8,
                fingerprint: sample_fingerprint(),
            }],
        }
    }

    #[test]
    fn test_binary_fingerprint_round_trip() {
        let fp = sample_fingerprint();
        let decoded = decode_fingerprint(&encode_fingerprint(&fp)).unwrap();
        assert_eq!(decoded, fp);
    }

    #[test]
    fn test_binary_fingerprint_truncation_detected() {
        let bytes = encode_fingerprint(&sample_fingerprint());
        let err = decode_fingerprint(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Matrix(CodecError::TruncatedData { .. })
        ));
    }

    #[test]
    fn test_project_json_round_trip() {
        let project = sample_project();
        let json = encode_project(&project).unwrap();
        let decoded = decode_project(&json).unwrap();
        assert_eq!(decoded, project);
    }

    #[test]
    fn test_unknown_keys_ignored_and_defaults_filled() {
        let json = r#"{
            "version": 1,
            "future_field": {"nested": true},
            "layers": [{
                "fingerprint": {
                    "keypoints": [{"x": 1.0, "y": 2.0, "unknown": 7}],
                    "descriptors": {"rows": 1, "cols": 4, "type_tag": 0,
                                    "payload": [1, 2, 3, 4]}
                }
            }]
        }"#;
        let project = decode_project(json).unwrap();
        let layer = &project.layers[0];

        // Defaults: empty name, identity transform, full opacity, no 3D points.
        assert_eq!(layer.name, "");
        assert_eq!(layer.transform, AnchorTransform::identity());
        assert_eq!(layer.opacity, 1.0);
        assert!(!layer.fingerprint.has_geometry());
        assert_eq!(layer.fingerprint.keypoints()[0].class_id, -1);
    }

    #[test]
    fn test_missing_descriptors_fails_fast() {
        let json = r#"{"layers": [{"fingerprint": {"keypoints": []}}]}"#;
        assert!(matches!(
            decode_project(json),
            Err(ProjectError::Parse(_))
        ));
    }

    #[test]
    fn test_hostile_matrix_dimensions_rejected() {
        let json = r#"{
            "layers": [{
                "fingerprint": {
                    "descriptors": {"rows": 40000, "cols": 40000, "type_tag": 6,
                                    "payload": []}
                }
            }]
        }"#;
        assert!(matches!(
            decode_project(json),
            Err(ProjectError::Matrix(CodecError::InvalidDimensions(_)))
        ));
    }

    #[test]
    fn test_keypoint_row_misalignment_rejected() {
        let json = r#"{
            "layers": [{
                "fingerprint": {
                    "keypoints": [{"x": 1.0, "y": 2.0}],
                    "descriptors": {"rows": 2, "cols": 2, "type_tag": 0,
                                    "payload": [1, 2, 3, 4]}
                }
            }]
        }"#;
        assert!(matches!(
            decode_project(json),
            Err(ProjectError::Fingerprint(
                FingerprintError::KeypointRowMismatch { .. }
            ))
        ));
    }

    #[test]
    fn test_newer_schema_version_rejected() {
        let json = r#"{"version": 99, "layers": []}"#;
        assert!(matches!(
            decode_project(json),
            Err(ProjectError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn test_empty_document_is_an_empty_project() {
        let project = decode_project("{}").unwrap();
        assert!(project.layers.is_empty());
    }

    #[test]
    fn test_project_file_round_trip() {
        let path = std::env::temp_dir().join("overlay_anchor_persist_test.json");
        let project = sample_project();
        write_project_file(&path, &project).unwrap();
        let loaded = read_project_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_missing_project_file_carries_path_context() {
        let err = read_project_file(Path::new("/nonexistent/overlay.json")).unwrap_err();
        assert!(format!("{err:#}").contains("overlay.json"));
    }

    #[test]
    fn test_opacity_clamped_not_rejected() {
        let json = r#"{
            "layers": [{
                "opacity": 3.5,
                "fingerprint": {
                    "descriptors": {"rows": 1, "cols": 1, "type_tag": 0, "payload": [9]},
                    "keypoints": [{"x": 0.0, "y": 0.0}]
                }
            }]
        }"#;
        let project = decode_project(json).unwrap();
        assert_eq!(project.layers[0].opacity, 1.0);
    }
}
