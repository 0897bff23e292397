//! Horizontal bay actuator.
//!
//! Two continuous-rotation motors on the carrier move a shelf sideways
//! between the carrier and a bay.  There is no end-stop: a push or pull
//! is a fixed-duration run followed by a stop command.
//!
//! Direction depends on which side the bay is on.  Pushing into a bay
//! moves the shelf toward that side; pulling out of it moves the shelf
//! toward the opposite side.
//!
//! | action | side  | direction     |
//! |--------|-------|---------------|
//! | push   | front | toward front  |
//! | pull   | back  | toward front  |
//! | push   | back  | toward back   |
//! | pull   | front | toward back   |

use log::{debug, info};

use crate::app::ports::{BayMotors, Clock, Housekeeping};
use crate::config::{DutyPair, MotionConfig};
use crate::location::Side;

use super::cooperative_delay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BayAction {
    /// Carrier → bay.
    Push,
    /// Bay → carrier.
    Pull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BayDirection {
    TowardFront,
    TowardBack,
}

impl BayDirection {
    pub const fn for_action(action: BayAction, side: Side) -> Self {
        let toward = match action {
            BayAction::Push => side,
            BayAction::Pull => side.opposite(),
        };
        match toward {
            Side::Front => Self::TowardFront,
            Side::Back => Self::TowardBack,
        }
    }

    pub fn duties(self, cfg: &MotionConfig) -> DutyPair {
        match self {
            Self::TowardFront => cfg.bay_toward_front,
            Self::TowardBack => cfg.bay_toward_back,
        }
    }
}

/// Stateless; everything it needs comes from the config per call.
#[derive(Debug, Default)]
pub struct BayActuator;

impl BayActuator {
    pub fn new() -> Self {
        Self
    }

    /// Push or pull one shelf on `side`.
    pub fn transfer(
        &self,
        action: BayAction,
        side: Side,
        cfg: &MotionConfig,
        hw: &mut (impl BayMotors + Clock + Housekeeping),
    ) {
        self.actuate(BayDirection::for_action(action, side), cfg, hw);
    }

    /// Run both motors in `direction` for `bay_run_ms`, then stop them.
    pub fn actuate(
        &self,
        direction: BayDirection,
        cfg: &MotionConfig,
        hw: &mut (impl BayMotors + Clock + Housekeeping),
    ) {
        let duty = direction.duties(cfg);
        debug!(
            "Bay: {:?} L={} R={} for {}ms",
            direction, duty.left, duty.right, cfg.bay_run_ms
        );
        self.run_for(duty, cfg.bay_run_ms, cfg, hw);
    }

    /// Diagnostic override: raw duties for a raw duration, then neutral.
    pub fn manual(
        &self,
        duration_ms: u32,
        left: u16,
        right: u16,
        cfg: &MotionConfig,
        hw: &mut (impl BayMotors + Clock + Housekeeping),
    ) {
        info!("Bay: manual L={} R={} for {}ms", left, right, duration_ms);
        self.run_for(DutyPair { left, right }, duration_ms, cfg, hw);
    }

    fn run_for(
        &self,
        duty: DutyPair,
        duration_ms: u32,
        cfg: &MotionConfig,
        hw: &mut (impl BayMotors + Clock + Housekeeping),
    ) {
        hw.drive(duty.left, duty.right);
        cooperative_delay(hw, duration_ms, cfg.yield_ms);
        hw.drive(cfg.bay_neutral, cfg.bay_neutral);
    }
}
