//! Native mapping engine bridge.
//!
//! The native engine performs real-time mapping/localization and rendering
//! behind a narrow command surface; everything here treats it as an opaque
//! stateful peer. [`commands::EngineCommands`] is that surface,
//! [`bridge::MappingEngineBridge`] owns the single live handle and enforces
//! the lifecycle contract, and [`simulated::SimulatedEngine`] stands in for
//! the native library in tests and headless composition roots.

pub mod bridge;
pub mod commands;
#[cfg(feature = "native-engine")]
pub mod ffi;
pub mod simulated;

pub use bridge::{ApiContract, MappingEngineBridge, REFERENCE_DENSITY};
pub use commands::{EngineCommands, EngineConfig, RawEngineHandle};
pub use simulated::SimulatedEngine;
