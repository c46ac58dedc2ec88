//! Secure project persistence.
//!
//! Projects are stored as self-describing JSON documents: tolerant of
//! additive schema evolution (unknown keys ignored, missing optional keys
//! defaulted), but strict about structure — a document that cannot satisfy
//! the cross-field invariants fails with a typed error instead of producing
//! a partially-populated project. Fingerprints additionally have a compact
//! binary form composed from the codec wire layouts, used inside exported
//! archives.

mod document;
mod persist;

pub use document::{FingerprintDoc, LayerDoc, ProjectDoc, PROJECT_SCHEMA_VERSION};
pub use persist::{
    decode_fingerprint, decode_project, encode_fingerprint, encode_project, read_project_file,
    write_project_file, Layer, Project, ProjectError,
};
