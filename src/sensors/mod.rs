//! Sensor subsystem.
//!
//! Only one sensor matters to motion: the analog hall sensor that sees a
//! magnet at every floor.  [`hall`] holds both the ADC reader and the
//! peak detector that turns its samples into floor-crossing events.

pub mod hall;
