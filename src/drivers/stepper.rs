//! Step/direction stepper driver for the lift.
//!
//! Constant-speed, polled stepping: [`run`](LiftMotor::run) emits at most
//! one step per call, once the step interval (`1e6 / speed` µs) has
//! elapsed since the previous step.  The vertical axis calls it in a tight
//! loop, so the achievable rate is bounded by loop latency, not by this
//! driver.
//!
//! Generic over `embedded-hal` [`OutputPin`]s.  On the board the pins are
//! [`GpioOut`](super::hw_init::GpioOut); tests use recording mocks.
//!
//! Pin errors never panic.  The first one is logged, latched in
//! [`pin_fault`](StepperDriver::pin_fault), and the driver carries on; a
//! dead STEP line shows up upstream as a stall.

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::app::ports::{LiftMotor, Travel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    /// Stepping toward an absolute target.
    Move { target: i64 },
    /// Stepping until `stop()`.
    Jog(Travel),
}

pub struct StepperDriver<STEP, DIR, EN> {
    step: STEP,
    dir: DIR,
    enable: EN,
    interval_us: u64,
    position: i64,
    mode: Mode,
    last_step_us: Option<u64>,
    direction: Option<Travel>,
    enabled: bool,
    pin_fault: bool,
}

impl<STEP, DIR, EN> StepperDriver<STEP, DIR, EN>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
{
    pub fn new(step: STEP, dir: DIR, enable: EN) -> Self {
        let mut driver = Self {
            step,
            dir,
            enable,
            interval_us: 1_000,
            position: 0,
            mode: Mode::Idle,
            last_step_us: None,
            direction: None,
            enabled: true,
            pin_fault: false,
        };
        driver.set_enabled(false);
        driver
    }

    /// `true` once any pin write has failed.
    pub fn pin_fault(&self) -> bool {
        self.pin_fault
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn note<E: core::fmt::Debug>(&mut self, pin: &str, result: Result<(), E>) {
        if let Err(e) = result {
            if !self.pin_fault {
                warn!("Stepper: {} pin write failed: {:?}", pin, e);
            }
            self.pin_fault = true;
        }
    }

    fn set_enabled(&mut self, on: bool) {
        if self.enabled == on {
            return;
        }
        // Active low.
        let r = if on { self.enable.set_low() } else { self.enable.set_high() };
        self.note("EN", r);
        self.enabled = on;
    }

    fn set_direction(&mut self, travel: Travel) {
        if self.direction == Some(travel) {
            return;
        }
        let r = match travel {
            Travel::Up => self.dir.set_high(),
            Travel::Down => self.dir.set_low(),
        };
        self.note("DIR", r);
        self.direction = Some(travel);
    }

    fn pulse(&mut self, travel: Travel) {
        let r = self.step.set_high();
        self.note("STEP", r);
        // The call overhead between edges exceeds the 1–2 µs minimum pulse
        // width of A4988/DRV8825 class drivers.
        let r = self.step.set_low();
        self.note("STEP", r);
        self.position += i64::from(travel.sign());
    }

    fn start(&mut self, mode: Mode, travel: Travel) {
        self.set_direction(travel);
        self.set_enabled(true);
        self.mode = mode;
        self.last_step_us = None;
    }
}

impl<STEP, DIR, EN> LiftMotor for StepperDriver<STEP, DIR, EN>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
{
    fn set_speed(&mut self, steps_per_sec: u32) {
        self.interval_us = 1_000_000 / u64::from(steps_per_sec.max(1));
    }

    fn move_by(&mut self, steps: i32) {
        if steps == 0 {
            self.mode = Mode::Idle;
            return;
        }
        let travel = if steps > 0 { Travel::Up } else { Travel::Down };
        let target = self.position + i64::from(steps);
        self.start(Mode::Move { target }, travel);
    }

    fn jog(&mut self, travel: Travel) {
        self.start(Mode::Jog(travel), travel);
    }

    fn run(&mut self, now_us: u64) -> bool {
        let travel = match self.mode {
            Mode::Idle => return false,
            Mode::Move { target } if target == self.position => {
                self.mode = Mode::Idle;
                return false;
            }
            Mode::Move { target } => {
                if target > self.position { Travel::Up } else { Travel::Down }
            }
            Mode::Jog(travel) => travel,
        };

        let due = match self.last_step_us {
            None => true,
            Some(last) => now_us.saturating_sub(last) >= self.interval_us,
        };
        if due {
            self.pulse(travel);
            self.last_step_us = Some(now_us);
        }

        match self.mode {
            Mode::Move { target } if target == self.position => {
                self.mode = Mode::Idle;
                false
            }
            _ => true,
        }
    }

    fn stop(&mut self) {
        self.mode = Mode::Idle;
        self.last_step_us = None;
    }

    fn set_origin(&mut self) {
        info!("Stepper: origin set (was {})", self.position);
        self.position = 0;
    }

    fn position(&self) -> i64 {
        self.position
    }
}
