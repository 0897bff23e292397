//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, forward to the
//! command channel, etc.

use crate::error::Error;

/// Which operation an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Cycle,
    Reorder,
    Restock,
    Calibrate,
    ManualVertical,
    ManualHorizontal,
    UpdateConfig,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service is up; carries the assumed power-on floor.
    Started { floor: u8 },

    OperationStarted(OperationKind),

    /// Operation ran to completion; `floor` is where the carrier ended.
    OperationCompleted { kind: OperationKind, floor: u8 },

    /// Operation was refused or aborted.
    OperationFailed { kind: OperationKind, error: Error },

    /// Homing found the reference magnet.
    Homed { travelled: u32 },

    /// Homing ran out of travel; floor 1 was assumed.
    HomingTimedOut { travelled: u32 },
}
