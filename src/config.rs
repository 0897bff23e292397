//! Motion tunables.
//!
//! Every calibrated number the machine depends on lives in
//! [`MotionConfig`].  Values come from NVS through the
//! [`ConfigSource`] port, one key per tunable, with the defaults below as
//! fallback.  Key names stay within the 15-character NVS key limit.

use serde::{Deserialize, Serialize};

use crate::app::ports::{ConfigError, ConfigSource};
use crate::identifier::MAX_CAPTURED_IDS;

/// NVS key names, one per tunable.
pub mod keys {
    pub const STEPS_PER_FLOOR: &str = "steps_floor";
    pub const NORMAL_SPEED: &str = "spd_normal";
    pub const HOMING_SPEED: &str = "spd_homing";
    pub const HOMING_MAX_STEPS: &str = "home_max_steps";
    pub const HALL_POLL_MS: &str = "home_poll_ms";
    pub const HALL_MIN_CHANGE: &str = "hall_min_chg";
    pub const HALL_MIN_AMPLITUDE: &str = "hall_min_amp";
    pub const HALL_SETTLE_SAMPLES: &str = "hall_settle_n";
    pub const REFRACTORY_MS: &str = "hall_refr_ms";
    pub const HOMING_REFRACTORY_MS: &str = "hall_home_refr";
    pub const BAY_RUN_MS: &str = "bay_run_ms";
    pub const BAY_FWD_LEFT: &str = "bay_fwd_left";
    pub const BAY_FWD_RIGHT: &str = "bay_fwd_right";
    pub const BAY_REV_LEFT: &str = "bay_rev_left";
    pub const BAY_REV_RIGHT: &str = "bay_rev_right";
    pub const BAY_NEUTRAL: &str = "bay_neutral";
    pub const SCAN_SETTLE_MS: &str = "scan_settle_ms";
    pub const SCAN_LIMIT_MS: &str = "scan_limit_ms";
    pub const STALL_SLACK_MS: &str = "stall_slack_ms";
    pub const YIELD_MS: &str = "yield_ms";
    pub const FLOOR_COUNT: &str = "floor_count";
    pub const MAX_IDS: &str = "max_ids";

    /// Every key, for provisioning tools and tests.
    pub const ALL: [&str; 22] = [
        STEPS_PER_FLOOR,
        NORMAL_SPEED,
        HOMING_SPEED,
        HOMING_MAX_STEPS,
        HALL_POLL_MS,
        HALL_MIN_CHANGE,
        HALL_MIN_AMPLITUDE,
        HALL_SETTLE_SAMPLES,
        REFRACTORY_MS,
        HOMING_REFRACTORY_MS,
        BAY_RUN_MS,
        BAY_FWD_LEFT,
        BAY_FWD_RIGHT,
        BAY_REV_LEFT,
        BAY_REV_RIGHT,
        BAY_NEUTRAL,
        SCAN_SETTLE_MS,
        SCAN_LIMIT_MS,
        STALL_SLACK_MS,
        YIELD_MS,
        FLOOR_COUNT,
        MAX_IDS,
    ];
}

/// Servo command pair for the two bay drive motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyPair {
    pub left: u16,
    pub right: u16,
}

/// Core motion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    // --- Vertical axis ---
    /// Motor steps between two adjacent floors
    pub steps_per_floor: u32,
    /// Travel speed for floor-to-floor moves (steps/s)
    pub normal_speed: u32,
    /// Approach speed while homing (steps/s)
    pub homing_speed: u32,
    /// Homing gives up after this many steps without a crossing
    pub homing_max_steps: u32,
    /// Hall sensor sampling interval (milliseconds)
    pub hall_poll_ms: u32,
    /// Extra time granted to a move before the stall watchdog trips (ms)
    pub stall_slack_ms: u32,

    // --- Floor-crossing detector ---
    /// Minimum per-sample derivative for a peak flank (ADC counts)
    pub hall_min_change: i32,
    /// Minimum distance from baseline at the peak (ADC counts)
    pub hall_min_amplitude: i32,
    /// Samples averaged into the baseline before detection starts
    pub hall_settle_samples: u16,
    /// Refractory window after a crossing, normal travel (ms)
    pub refractory_ms: u32,
    /// Refractory window after a crossing, homing (ms)
    pub homing_refractory_ms: u32,

    // --- Bay drive ---
    /// How long one push or pull runs (ms)
    pub bay_run_ms: u32,
    /// Duties that move a shelf toward the front side
    pub bay_toward_front: DutyPair,
    /// Duties that move a shelf toward the back side
    pub bay_toward_back: DutyPair,
    /// Stop command for both bay motors
    pub bay_neutral: u16,

    // --- Scanning ---
    /// Delay after every scan poll (ms)
    pub scan_settle_ms: u32,
    /// Per-floor scan window, 0 = wait for the full order count (ms)
    pub scan_limit_ms: u32,
    /// Upper bound on identifiers captured per cycle
    pub max_ids: u8,

    // --- Machine ---
    /// Highest valid floor level
    pub floor_count: u8,
    /// Housekeeping (watchdog / network) interval inside motion loops (ms)
    pub yield_ms: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            // Vertical axis
            steps_per_floor: 3200, // 16 µstep × 200 steps, one lead-screw turn per floor
            normal_speed: 1600,
            homing_speed: 400,
            homing_max_steps: 40_000, // a little over the full shaft
            hall_poll_ms: 10,
            stall_slack_ms: 2000,

            // Detector
            hall_min_change: 8,
            hall_min_amplitude: 25,
            hall_settle_samples: 20,
            refractory_ms: 400,
            homing_refractory_ms: 150,

            // Bay drive (continuous-rotation servos, 90 = stop)
            bay_run_ms: 9500,
            bay_toward_front: DutyPair { left: 180, right: 0 },
            bay_toward_back: DutyPair { left: 0, right: 180 },
            bay_neutral: 90,

            // Scanning
            scan_settle_ms: 100,
            scan_limit_ms: 0,
            max_ids: MAX_CAPTURED_IDS as u8,

            // Machine
            floor_count: 10,
            yield_ms: 20,
        }
    }
}

fn read_u32(src: &impl ConfigSource, key: &str, default: u32) -> u32 {
    src.get_int(key, default as i32).max(0) as u32
}

fn read_u16(src: &impl ConfigSource, key: &str, default: u16) -> u16 {
    src.get_int(key, default as i32).clamp(0, i32::from(u16::MAX)) as u16
}

fn read_u8(src: &impl ConfigSource, key: &str, default: u8) -> u8 {
    src.get_int(key, default as i32).clamp(0, i32::from(u8::MAX)) as u8
}

impl MotionConfig {
    /// Read every tunable from `src`, falling back to the default per key.
    pub fn from_source(src: &impl ConfigSource) -> Self {
        let d = Self::default();
        Self {
            steps_per_floor: read_u32(src, keys::STEPS_PER_FLOOR, d.steps_per_floor),
            normal_speed: read_u32(src, keys::NORMAL_SPEED, d.normal_speed),
            homing_speed: read_u32(src, keys::HOMING_SPEED, d.homing_speed),
            homing_max_steps: read_u32(src, keys::HOMING_MAX_STEPS, d.homing_max_steps),
            hall_poll_ms: read_u32(src, keys::HALL_POLL_MS, d.hall_poll_ms),
            stall_slack_ms: read_u32(src, keys::STALL_SLACK_MS, d.stall_slack_ms),
            hall_min_change: src.get_int(keys::HALL_MIN_CHANGE, d.hall_min_change),
            hall_min_amplitude: src.get_int(keys::HALL_MIN_AMPLITUDE, d.hall_min_amplitude),
            hall_settle_samples: read_u16(src, keys::HALL_SETTLE_SAMPLES, d.hall_settle_samples),
            refractory_ms: read_u32(src, keys::REFRACTORY_MS, d.refractory_ms),
            homing_refractory_ms: read_u32(
                src,
                keys::HOMING_REFRACTORY_MS,
                d.homing_refractory_ms,
            ),
            bay_run_ms: read_u32(src, keys::BAY_RUN_MS, d.bay_run_ms),
            bay_toward_front: DutyPair {
                left: read_u16(src, keys::BAY_FWD_LEFT, d.bay_toward_front.left),
                right: read_u16(src, keys::BAY_FWD_RIGHT, d.bay_toward_front.right),
            },
            bay_toward_back: DutyPair {
                left: read_u16(src, keys::BAY_REV_LEFT, d.bay_toward_back.left),
                right: read_u16(src, keys::BAY_REV_RIGHT, d.bay_toward_back.right),
            },
            bay_neutral: read_u16(src, keys::BAY_NEUTRAL, d.bay_neutral),
            scan_settle_ms: read_u32(src, keys::SCAN_SETTLE_MS, d.scan_settle_ms),
            scan_limit_ms: read_u32(src, keys::SCAN_LIMIT_MS, d.scan_limit_ms),
            max_ids: read_u8(src, keys::MAX_IDS, d.max_ids),
            floor_count: read_u8(src, keys::FLOOR_COUNT, d.floor_count),
            yield_ms: read_u32(src, keys::YIELD_MS, d.yield_ms),
        }
    }

    /// Range-check every field.  Out-of-range values are rejected, not
    /// clamped, so a bad provisioning write cannot drive the lift into
    /// the shaft ends.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100_000).contains(&self.steps_per_floor) {
            return Err(ConfigError::ValidationFailed(
                "steps_per_floor must be 1–100000",
            ));
        }
        if !(1..=20_000).contains(&self.normal_speed) || !(1..=20_000).contains(&self.homing_speed)
        {
            return Err(ConfigError::ValidationFailed("speeds must be 1–20000 steps/s"));
        }
        if self.homing_max_steps == 0 {
            return Err(ConfigError::ValidationFailed("homing_max_steps must be > 0"));
        }
        if !(1..=100).contains(&self.hall_poll_ms) {
            return Err(ConfigError::ValidationFailed("hall_poll_ms must be 1–100"));
        }
        if self.hall_min_change < 0 || self.hall_min_amplitude <= 0 {
            return Err(ConfigError::ValidationFailed(
                "hall thresholds must be positive",
            ));
        }
        if !(1..=500).contains(&self.hall_settle_samples) {
            return Err(ConfigError::ValidationFailed(
                "hall_settle_samples must be 1–500",
            ));
        }
        if self.refractory_ms == 0 || self.homing_refractory_ms > self.refractory_ms {
            return Err(ConfigError::ValidationFailed(
                "homing_refractory_ms must be <= refractory_ms (and refractory_ms > 0)",
            ));
        }
        if !(100..=60_000).contains(&self.bay_run_ms) {
            return Err(ConfigError::ValidationFailed("bay_run_ms must be 100–60000"));
        }
        let duties = [
            self.bay_toward_front.left,
            self.bay_toward_front.right,
            self.bay_toward_back.left,
            self.bay_toward_back.right,
            self.bay_neutral,
        ];
        if duties.iter().any(|&d| d > 180) {
            return Err(ConfigError::ValidationFailed("bay duties must be 0–180"));
        }
        if !(1..=1000).contains(&self.yield_ms) {
            return Err(ConfigError::ValidationFailed("yield_ms must be 1–1000"));
        }
        if !(1..=99).contains(&self.floor_count) {
            return Err(ConfigError::ValidationFailed("floor_count must be 1–99"));
        }
        if self.max_ids == 0 || usize::from(self.max_ids) > MAX_CAPTURED_IDS {
            return Err(ConfigError::ValidationFailed("max_ids must be 1–10"));
        }
        Ok(())
    }
}
