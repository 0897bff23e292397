//! Inbound commands to the application service.
//!
//! Built by the dispatcher from decoded protocol frames (or by `main` at
//! boot) and handed to [`AppService`](super::service::AppService).

use crate::config::MotionConfig;
use crate::location::BayLocation;
use crate::orchestrator::{CycleRequest, ReorderRequest};

use super::events::OperationKind;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Present a list of floors at the loading bay and scan items off them.
    Cycle(CycleRequest),

    /// Move shelves between bays pairwise.
    Reorder(ReorderRequest),

    /// Fetch one shelf to the loading bay and put it back.
    Restock(BayLocation),

    /// Home the lift onto the reference magnet.
    Calibrate,

    /// Raw lift move (diagnostics).
    ManualVertical { steps: u32, upward: bool },

    /// Raw bay drive (diagnostics).
    ManualHorizontal { duration_ms: u32, left: u16, right: u16 },

    /// Hot-swap tunables between operations.
    UpdateConfig(MotionConfig),
}

impl AppCommand {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Cycle(_) => OperationKind::Cycle,
            Self::Reorder(_) => OperationKind::Reorder,
            Self::Restock(_) => OperationKind::Restock,
            Self::Calibrate => OperationKind::Calibrate,
            Self::ManualVertical { .. } => OperationKind::ManualVertical,
            Self::ManualHorizontal { .. } => OperationKind::ManualHorizontal,
            Self::UpdateConfig(_) => OperationKind::UpdateConfig,
        }
    }
}
