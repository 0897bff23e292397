//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod bay_servo;
pub mod hw_init;
pub mod stepper;
pub mod watchdog;
