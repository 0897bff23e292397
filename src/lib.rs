//! VLM firmware library.
//!
//! Exposes the motion core, the orchestrator and the command dispatcher
//! for integration testing and host-side simulation. All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod identifier;
pub mod location;
pub mod motion;
pub mod orchestrator;
pub mod pins;

// The peripheral-facing modules compile on the host too; their register
// access is cfg-gated inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;
