//! Application core: domain logic behind port traits.
//!
//! [`service::AppService`] wraps the shelf orchestrator and is the single
//! entry point the control loop calls.  All interaction with hardware
//! happens through the **port traits** in [`ports`], so this layer runs
//! on the host against mock adapters.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
