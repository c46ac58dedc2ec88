//! On-disk document schema.
//!
//! Every optional field carries an explicit default so older documents keep
//! decoding as the schema grows; serde ignores unknown keys, so newer
//! documents decode under older readers too. Validation happens in a single
//! pass after decode (see `persist`), not field-by-field during it.

use serde::{Deserialize, Serialize};

use crate::fingerprint::Keypoint;

/// Current schema version written by [`encode_project`](super::encode_project).
pub const PROJECT_SCHEMA_VERSION: u32 = 1;

fn default_version() -> u32 {
    PROJECT_SCHEMA_VERSION
}

fn default_opacity() -> f32 {
    1.0
}

fn identity_transform() -> [f32; 16] {
    [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]
}

fn default_class_id() -> i32 {
    -1
}

/// Serialized descriptor matrix. Dimensions are revalidated against the
/// codec limits when the document is turned into a runtime value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixDoc {
    pub rows: i32,
    pub cols: i32,
    pub type_tag: i32,
    #[serde(default)]
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeypointDoc {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub size: f32,
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub response: f32,
    #[serde(default)]
    pub octave: i32,
    #[serde(default = "default_class_id")]
    pub class_id: i32,
}

impl From<&Keypoint> for KeypointDoc {
    fn from(kp: &Keypoint) -> Self {
        Self {
            x: kp.x,
            y: kp.y,
            size: kp.size,
            angle: kp.angle,
            response: kp.response,
            octave: kp.octave,
            class_id: kp.class_id,
        }
    }
}

impl From<&KeypointDoc> for Keypoint {
    fn from(doc: &KeypointDoc) -> Self {
        Self {
            x: doc.x,
            y: doc.y,
            size: doc.size,
            angle: doc.angle,
            response: doc.response,
            octave: doc.octave,
            class_id: doc.class_id,
        }
    }
}

/// Serialized fingerprint. An absent point list decodes to an empty list;
/// the descriptor matrix is required — a fingerprint without descriptors is
/// structurally invalid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintDoc {
    #[serde(default)]
    pub keypoints: Vec<KeypointDoc>,
    #[serde(default)]
    pub points3d: Vec<f32>,
    pub descriptors: MatrixDoc,
}

/// One overlay layer: an image anchored to a fingerprinted surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDoc {
    #[serde(default)]
    pub name: String,
    #[serde(default = "identity_transform")]
    pub transform: [f32; 16],
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    pub fingerprint: FingerprintDoc,
}

/// Top-level project document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDoc {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub layers: Vec<LayerDoc>,
}
