//! Bay drive: two continuous-rotation servos on LEDC channels.
//!
//! Commands arrive in servo units (0–180, 90 = stop) and are converted to
//! a pulse width between [`pins::SERVO_MIN_PULSE_US`] and
//! [`pins::SERVO_MAX_PULSE_US`], then to a duty count for the 50 Hz timer.

use log::debug;

use crate::app::ports::BayMotors;
use crate::drivers::hw_init;
use crate::pins;

/// Highest servo command accepted; larger values are clamped.
pub const SERVO_FULL_SCALE: u16 = 180;

/// Duty count for a servo command at the configured frame rate and
/// resolution.
pub const fn servo_duty(value: u16) -> u32 {
    let clamped = if value > SERVO_FULL_SCALE { SERVO_FULL_SCALE } else { value };
    let value = clamped as u32;
    let span = pins::SERVO_MAX_PULSE_US - pins::SERVO_MIN_PULSE_US;
    let pulse_us = pins::SERVO_MIN_PULSE_US + span * value / SERVO_FULL_SCALE as u32;
    let period_us = 1_000_000 / pins::SERVO_PWM_FREQ_HZ;
    pulse_us * (1 << pins::SERVO_PWM_RESOLUTION_BITS) / period_us
}

pub struct BayServoDriver {
    left_channel: u32,
    right_channel: u32,
    last: Option<(u16, u16)>,
}

impl BayServoDriver {
    pub fn new(left_channel: u32, right_channel: u32) -> Self {
        Self {
            left_channel,
            right_channel,
            last: None,
        }
    }

    /// Last command written, if any.
    pub fn last_command(&self) -> Option<(u16, u16)> {
        self.last
    }
}

impl Default for BayServoDriver {
    fn default() -> Self {
        Self::new(hw_init::LEDC_CH_BAY_LEFT, hw_init::LEDC_CH_BAY_RIGHT)
    }
}

impl BayMotors for BayServoDriver {
    fn drive(&mut self, left: u16, right: u16) {
        debug!("Bay: drive left={} right={}", left, right);
        hw_init::ledc_set(self.left_channel, servo_duty(left));
        hw_init::ledc_set(self.right_channel, servo_duty(right));
        self.last = Some((left, right));
    }
}
