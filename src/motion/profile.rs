//! Motion profile calculation for floor-to-floor moves.
//!
//! Pushing a shelf into a bay and pulling one out load the carrier
//! differently, so the lift deliberately lands a little high or low:
//!
//! | travel | intent | adjustment |
//! |--------|--------|------------|
//! | up     | push   | overshoot  |
//! | up     | pull   | undershoot |
//! | down   | push   | undershoot |
//! | down   | pull   | overshoot  |
//!
//! The adjustment is 5 % of the nominal distance, rounded half-up.

use crate::app::ports::Travel;
use crate::config::MotionConfig;

/// Adjustment as a percentage of the nominal step count.
const ADJUSTMENT_PERCENT: u64 = 5;

/// What the carrier does once it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskIntent {
    /// Shelf goes from the carrier into a bay.
    Push,
    /// Shelf comes from a bay onto the carrier.
    Pull,
    /// Repositioning only; no bias.
    Neutral,
}

/// One computed move.  Built per request and consumed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    /// `None` when the carrier is already at the target.
    pub direction: Option<Travel>,
    pub base_steps: u32,
    pub adjustment: u32,
    /// Signed step count handed to the motor (up = positive).
    pub final_steps: i32,
    pub speed: u32,
}

impl Profile {
    pub const NOOP: Self = Self {
        direction: None,
        base_steps: 0,
        adjustment: 0,
        final_steps: 0,
        speed: 0,
    };

    pub fn is_noop(&self) -> bool {
        self.direction.is_none()
    }
}

/// Build the profile for moving from `current` to `target`.
pub fn compute(current: u8, target: u8, intent: TaskIntent, cfg: &MotionConfig) -> Profile {
    if current == target {
        return Profile::NOOP;
    }

    let travel = if target > current { Travel::Up } else { Travel::Down };
    let floors = u32::from(current.abs_diff(target));
    let base_steps = floors * cfg.steps_per_floor;
    let adjustment =
        ((u64::from(base_steps) * ADJUSTMENT_PERCENT + 50) / 100) as u32;

    let magnitude = match (travel, intent) {
        (Travel::Up, TaskIntent::Push) | (Travel::Down, TaskIntent::Pull) => {
            base_steps + adjustment
        }
        (Travel::Up, TaskIntent::Pull) | (Travel::Down, TaskIntent::Push) => {
            base_steps - adjustment
        }
        (_, TaskIntent::Neutral) => base_steps,
    };
    let adjustment = if intent == TaskIntent::Neutral { 0 } else { adjustment };

    Profile {
        direction: Some(travel),
        base_steps,
        adjustment,
        final_steps: magnitude as i32 * travel.sign(),
        speed: cfg.normal_speed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(steps_per_floor: u32) -> MotionConfig {
        MotionConfig {
            steps_per_floor,
            ..Default::default()
        }
    }

    #[test]
    fn same_floor_is_noop() {
        let p = compute(4, 4, TaskIntent::Push, &cfg(3200));
        assert!(p.is_noop());
        assert_eq!(p.direction, None);
        assert_eq!(p.final_steps, 0);
    }

    #[test]
    fn upward_push_overshoots() {
        let p = compute(1, 3, TaskIntent::Push, &cfg(1000));
        assert_eq!(p.direction, Some(Travel::Up));
        assert_eq!(p.base_steps, 2000);
        assert_eq!(p.adjustment, 100);
        assert_eq!(p.final_steps, 2100);
    }

    #[test]
    fn upward_pull_undershoots() {
        let p = compute(1, 3, TaskIntent::Pull, &cfg(1000));
        assert_eq!(p.final_steps, 1900);
    }

    #[test]
    fn downward_push_undershoots() {
        let p = compute(5, 2, TaskIntent::Push, &cfg(1000));
        assert_eq!(p.direction, Some(Travel::Down));
        assert_eq!(p.base_steps, 3000);
        assert_eq!(p.final_steps, -2850);
    }

    #[test]
    fn downward_pull_overshoots() {
        let p = compute(5, 2, TaskIntent::Pull, &cfg(1000));
        assert_eq!(p.final_steps, -3150);
    }

    #[test]
    fn neutral_has_no_bias() {
        let p = compute(2, 6, TaskIntent::Neutral, &cfg(1000));
        assert_eq!(p.adjustment, 0);
        assert_eq!(p.final_steps, 4000);
    }

    #[test]
    fn adjustment_rounds_half_up() {
        // 5 % of 30 = 1.5 → 2; 5 % of 29 = 1.45 → 1
        assert_eq!(compute(1, 2, TaskIntent::Push, &cfg(30)).adjustment, 2);
        assert_eq!(compute(1, 2, TaskIntent::Push, &cfg(29)).adjustment, 1);
    }

    #[test]
    fn speed_comes_from_config() {
        let c = MotionConfig::default();
        assert_eq!(compute(1, 2, TaskIntent::Pull, &c).speed, c.normal_speed);
    }
}
