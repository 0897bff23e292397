//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the shelf orchestrator and exposes a
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, so the whole service is testable with mock adapters.
//!
//! ```text
//!  AppCommand ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │       AppService        │ ──▶ StatusSink
//!     Machine ◀──▶│   ShelfOrchestrator     │
//!                 └────────────────────────┘
//! ```
//!
//! Methods take `&mut self`, so one operation always runs to completion
//! before the next can start.

use log::{info, warn};

use crate::config::MotionConfig;
use crate::error::{Error, Result};
use crate::identifier::{CapturedIds, MAX_CAPTURED_IDS};
use crate::motion::lift::HomingOutcome;
use crate::orchestrator::{SequenceStats, ShelfOrchestrator};

use super::commands::AppCommand;
use super::events::{AppEvent, OperationKind};
use super::ports::{EventSink, Machine, StatusSink};

/// Shown whenever the machine is idle and waiting for the operator.
pub const IDLE_BANNER: &str = "Press A to proceed\nor B for auto restock";

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    orchestrator: ShelfOrchestrator,
    operations: u32,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does not move anything; send [`AppCommand::Calibrate`] to home.
    pub fn new(config: MotionConfig) -> Self {
        Self {
            orchestrator: ShelfOrchestrator::new(config),
            operations: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, status: &mut impl StatusSink, sink: &mut impl EventSink) {
        let floor = self.orchestrator.current_floor();
        status.publish(IDLE_BANNER);
        sink.emit(&AppEvent::Started { floor });
        info!("AppService started at floor {}", floor);
    }

    // ── Command handling ──────────────────────────────────────

    /// Run one command to completion.
    ///
    /// Returns the captured identifiers for a capturing cycle, `None`
    /// otherwise.  The idle banner is republished afterwards either way.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl Machine,
        status: &mut impl StatusSink,
        sink: &mut impl EventSink,
    ) -> Result<Option<CapturedIds>> {
        let kind = cmd.kind();
        if let AppCommand::UpdateConfig(config) = cmd {
            return self.update_config(config, sink).map(|()| None);
        }

        info!("AppService: {:?} started", kind);
        sink.emit(&AppEvent::OperationStarted(kind));

        let result = self.run(cmd, hw, status, sink);
        self.operations += 1;

        match &result {
            Ok(_) => {
                let floor = self.orchestrator.current_floor();
                info!("AppService: {:?} complete at floor {}", kind, floor);
                sink.emit(&AppEvent::OperationCompleted { kind, floor });
            }
            Err(e) => {
                warn!("AppService: {:?} failed: {}", kind, e);
                sink.emit(&AppEvent::OperationFailed { kind, error: *e });
            }
        }
        status.publish(IDLE_BANNER);
        result
    }

    fn run(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl Machine,
        status: &mut impl StatusSink,
        sink: &mut impl EventSink,
    ) -> Result<Option<CapturedIds>> {
        match cmd {
            AppCommand::Cycle(req) if req.capture_ids => {
                let mut ids = CapturedIds::new();
                self.orchestrator.cycle(&req, Some(&mut ids), hw, status)?;
                Ok(Some(ids))
            }
            AppCommand::Cycle(req) => {
                self.orchestrator
                    .cycle::<MAX_CAPTURED_IDS>(&req, None, hw, status)?;
                Ok(None)
            }
            AppCommand::Reorder(req) => {
                self.orchestrator.reorder(&req, hw, status)?;
                Ok(None)
            }
            AppCommand::Restock(floor) => {
                self.orchestrator.restock(floor, hw, status)?;
                Ok(None)
            }
            AppCommand::Calibrate => {
                match self.orchestrator.calibrate(hw, status) {
                    HomingOutcome::Found { travelled } => {
                        sink.emit(&AppEvent::Homed { travelled });
                    }
                    HomingOutcome::TimedOut { travelled } => {
                        sink.emit(&AppEvent::HomingTimedOut { travelled });
                    }
                }
                Ok(None)
            }
            AppCommand::ManualVertical { steps, upward } => {
                self.orchestrator.manual_vertical(steps, upward, hw)?;
                Ok(None)
            }
            AppCommand::ManualHorizontal {
                duration_ms,
                left,
                right,
            } => {
                self.orchestrator
                    .manual_horizontal(duration_ms, left, right, hw);
                Ok(None)
            }
            AppCommand::UpdateConfig(config) => self.update_config(config, sink).map(|()| None),
        }
    }

    fn update_config(&mut self, config: MotionConfig, sink: &mut impl EventSink) -> Result<()> {
        if let Err(e) = config.validate() {
            warn!("AppService: config rejected: {}", e);
            let error = Error::from(e);
            sink.emit(&AppEvent::OperationFailed {
                kind: OperationKind::UpdateConfig,
                error,
            });
            return Err(error);
        }
        self.orchestrator.apply_config(config);
        info!("Configuration updated at runtime");
        sink.emit(&AppEvent::OperationCompleted {
            kind: OperationKind::UpdateConfig,
            floor: self.orchestrator.current_floor(),
        });
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn current_floor(&self) -> u8 {
        self.orchestrator.current_floor()
    }

    pub fn stats(&self) -> SequenceStats {
        self.orchestrator.stats()
    }

    /// Live configuration (for read-back or delta updates).
    pub fn config(&self) -> &MotionConfig {
        self.orchestrator.config()
    }

    /// Operations handled since startup, failed ones included.
    pub fn operation_count(&self) -> u32 {
        self.operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Events(Vec<AppEvent>);

    impl EventSink for Events {
        fn emit(&mut self, event: &AppEvent) {
            self.0.push(event.clone());
        }
    }

    #[test]
    fn invalid_config_is_rejected_and_kept_out() {
        let mut app = AppService::new(MotionConfig::default());
        let mut events = Events::default();
        let bad = MotionConfig {
            floor_count: 0,
            ..Default::default()
        };
        assert!(app.update_config(bad, &mut events).is_err());
        assert_eq!(app.config().floor_count, 10);
        assert!(matches!(
            events.0.last(),
            Some(AppEvent::OperationFailed {
                kind: OperationKind::UpdateConfig,
                ..
            })
        ));
    }

    #[test]
    fn valid_config_is_applied() {
        let mut app = AppService::new(MotionConfig::default());
        let mut events = Events::default();
        let cfg = MotionConfig {
            floor_count: 6,
            ..Default::default()
        };
        app.update_config(cfg, &mut events).unwrap();
        assert_eq!(app.config().floor_count, 6);
    }
}
