//! Vertical axis controller.
//!
//! Owns the carrier's floor position and the floor-crossing detector.
//! Moves are open loop: the computed step count is handed to the motor
//! and the position is committed to the target when the loop ends.  The
//! hall sensor is still sampled during travel and the crossing count is
//! reported, but it never corrects the position.
//!
//! ```text
//!  move_to ──▶ profile::compute ──▶ LiftMotor::move_by
//!                                      │
//!              ┌───────────────────────┘
//!              ▼
//!      loop { run(now) · sample hall · service() · stall check }
//!              │
//!              ▼
//!      current_floor = target
//! ```

use log::{debug, info, warn};

use crate::app::ports::{Clock, HallSensor, Housekeeping, LiftMotor, Travel};
use crate::config::MotionConfig;
use crate::error::MotionError;
use crate::sensors::hall::{DetectorMode, DetectorParams, FloorCrossingDetector};

use super::profile::{self, Profile, TaskIntent};

/// Floor the carrier rests on after homing.
pub const HOME_FLOOR: u8 = 1;

/// Result of a completed `move_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub profile: Profile,
    /// Floor crossings the detector saw on the way (diagnostic only).
    pub crossings: u16,
}

/// How homing ended.  Both variants leave the carrier at [`HOME_FLOOR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingOutcome {
    /// The reference magnet was seen after `travelled` steps.
    Found { travelled: u32 },
    /// The travel bound ran out first.
    TimedOut { travelled: u32 },
}

impl HomingOutcome {
    pub fn timed_out(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

struct DriveResult {
    stalled: bool,
    crossings: u16,
}

/// Time budget for a move of `steps` at `speed` before it counts as stalled.
pub fn stall_budget_us(steps: u32, speed: u32, slack_ms: u32) -> u64 {
    let expected_us = u64::from(steps) * 1_000_000 / u64::from(speed.max(1));
    expected_us * 2 + u64::from(slack_ms) * 1000
}

pub struct VerticalAxis {
    current_floor: u8,
    homed: bool,
    detector: FloorCrossingDetector,
}

impl VerticalAxis {
    pub fn new(cfg: &MotionConfig) -> Self {
        Self {
            current_floor: HOME_FLOOR,
            homed: false,
            detector: FloorCrossingDetector::new(DetectorParams::from(cfg)),
        }
    }

    pub fn current_floor(&self) -> u8 {
        self.current_floor
    }

    /// Has a homing run (successful or not) happened since power-on?
    pub fn is_homed(&self) -> bool {
        self.homed
    }

    /// Pick up new detector thresholds.
    pub fn reconfigure(&mut self, cfg: &MotionConfig) {
        self.detector.set_params(DetectorParams::from(cfg));
    }

    // ── Floor moves ───────────────────────────────────────────

    /// Move the carrier to `target`, biased for what happens on arrival.
    ///
    /// No motor command is issued when already at `target`.  On a stall the
    /// motor is stopped and an error returned, but `current_floor` is still
    /// committed to `target`.
    pub fn move_to(
        &mut self,
        target: u8,
        intent: TaskIntent,
        cfg: &MotionConfig,
        hw: &mut (impl LiftMotor + HallSensor + Clock + Housekeeping),
    ) -> Result<MoveOutcome, MotionError> {
        let profile = profile::compute(self.current_floor, target, intent, cfg);
        if profile.is_noop() {
            return Ok(MoveOutcome {
                profile,
                crossings: 0,
            });
        }

        debug!(
            "Lift: {} -> {} ({:?}, {} steps)",
            self.current_floor, target, intent, profile.final_steps
        );
        let run = self.drive(profile.final_steps, profile.speed, cfg, hw);

        let expected = u16::from(self.current_floor.abs_diff(target));
        if run.crossings != expected {
            debug!(
                "Lift: saw {} crossings, expected {} (position not corrected)",
                run.crossings, expected
            );
        }

        self.current_floor = target;

        if run.stalled {
            warn!("Lift: stall watchdog tripped moving to floor {}", target);
            return Err(MotionError::Stall { target });
        }
        Ok(MoveOutcome {
            profile,
            crossings: run.crossings,
        })
    }

    /// Raw step move for diagnostics.  Leaves `current_floor` alone.
    pub fn manual(
        &mut self,
        steps: u32,
        upward: bool,
        cfg: &MotionConfig,
        hw: &mut (impl LiftMotor + HallSensor + Clock + Housekeeping),
    ) -> Result<(), MotionError> {
        if steps == 0 {
            return Ok(());
        }
        let travel = if upward { Travel::Up } else { Travel::Down };
        let signed = steps.min(i32::MAX as u32) as i32 * travel.sign();
        info!("Lift: manual {:?} {} steps", travel, steps);

        if self.drive(signed, cfg.normal_speed, cfg, hw).stalled {
            warn!("Lift: stall watchdog tripped during manual move");
            return Err(MotionError::ManualStall);
        }
        Ok(())
    }

    fn drive(
        &mut self,
        steps: i32,
        speed: u32,
        cfg: &MotionConfig,
        hw: &mut (impl LiftMotor + HallSensor + Clock + Housekeeping),
    ) -> DriveResult {
        let budget_us = stall_budget_us(steps.unsigned_abs(), speed, cfg.stall_slack_ms);
        let poll_us = u64::from(cfg.hall_poll_ms) * 1000;
        let yield_us = u64::from(cfg.yield_ms) * 1000;

        self.detector.reset(DetectorMode::Normal);
        hw.set_speed(speed);
        hw.move_by(steps);

        let start = hw.now_us();
        let mut next_sample = start;
        let mut next_yield = start + yield_us;
        let mut crossings: u16 = 0;

        loop {
            let now = hw.now_us();
            if !hw.run(now) {
                break;
            }
            if now.saturating_sub(start) > budget_us {
                hw.stop();
                return DriveResult {
                    stalled: true,
                    crossings,
                };
            }
            if now >= next_sample {
                next_sample = now + poll_us;
                let raw = hw.read_raw();
                if self.detector.sample(raw, now / 1000) {
                    crossings = crossings.saturating_add(1);
                }
            }
            if now >= next_yield {
                next_yield = now + yield_us;
                hw.service();
            }
        }

        DriveResult {
            stalled: false,
            crossings,
        }
    }

    // ── Homing ────────────────────────────────────────────────

    /// Drive down to the reference magnet and call it floor 1.
    ///
    /// Always terminates: if `homing_max_steps` pass without a crossing the
    /// carrier stops where it is and is declared to be at floor 1 anyway.
    pub fn calibrate(
        &mut self,
        cfg: &MotionConfig,
        hw: &mut (impl LiftMotor + HallSensor + Clock + Housekeeping),
    ) -> HomingOutcome {
        self.detector.set_params(DetectorParams::from(cfg));
        self.detector.reset(DetectorMode::Homing);

        let poll_us = u64::from(cfg.hall_poll_ms) * 1000;
        let yield_us = u64::from(cfg.yield_ms) * 1000;
        let bound = u64::from(cfg.homing_max_steps);

        info!("Lift: homing at {} steps/s", cfg.homing_speed);
        hw.set_speed(cfg.homing_speed);
        hw.jog(Travel::Down);

        let origin = hw.position();
        let start = hw.now_us();
        let mut next_sample = start;
        let mut next_yield = start + yield_us;

        let (found, travelled) = loop {
            let now = hw.now_us();
            hw.run(now);
            let travelled = origin.abs_diff(hw.position());

            if now >= next_sample {
                next_sample = now + poll_us;
                let raw = hw.read_raw();
                if self.detector.sample(raw, now / 1000) {
                    break (true, travelled);
                }
            }
            if travelled >= bound {
                break (false, travelled);
            }
            if now >= next_yield {
                next_yield = now + yield_us;
                hw.service();
            }
        };

        hw.stop();
        hw.set_origin();
        self.current_floor = HOME_FLOOR;
        self.homed = true;

        let travelled = travelled.min(u64::from(u32::MAX)) as u32;
        if found {
            info!("Lift: home magnet found after {} steps", travelled);
            HomingOutcome::Found { travelled }
        } else {
            warn!(
                "Lift: no home magnet within {} steps, assuming floor {}",
                bound, HOME_FLOOR
            );
            HomingOutcome::TimedOut { travelled }
        }
    }
}
