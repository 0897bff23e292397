//! GPIO / peripheral pin assignments for the lift controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Lift stepper (A4988 / DRV8825 step-dir driver)
// ---------------------------------------------------------------------------

/// Rising edge = one (micro)step.
pub const LIFT_STEP_GPIO: i32 = 5;
/// HIGH = up, LOW = down.
pub const LIFT_DIR_GPIO: i32 = 6;
/// Driver enable, active LOW.
pub const LIFT_EN_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// Floor sensor (analog hall, ADC1)
// ---------------------------------------------------------------------------

/// Linear hall sensor facing the floor magnets.
/// ADC1 channel 3 (GPIO 4 on ESP32-S3).
pub const HALL_ADC_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Bay drive (two continuous-rotation servos)
// ---------------------------------------------------------------------------

pub const BAY_LEFT_SERVO_GPIO: i32 = 15;
pub const BAY_RIGHT_SERVO_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC resolution for the servo timer.  14 bits gives ~1.2 µs steps.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
/// Pulse width at 0°.
pub const SERVO_MIN_PULSE_US: u32 = 500;
/// Pulse width at 180°.
pub const SERVO_MAX_PULSE_US: u32 = 2500;
