//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the lift stepper, the hall ADC, the bay servos, the scanner, the
//! clock and the watchdog, and exposes them as one [`Machine`].  This is
//! the only module in the system that touches actual hardware.  On
//! non-espidf targets the underlying drivers use cfg-gated simulation
//! stubs.
//!
//! [`Machine`]: crate::app::ports::Machine

use crate::adapters::rfid::RfidScanner;
use crate::adapters::time::Esp32TimeAdapter;
use crate::app::ports::{
    BayMotors, Clock, HallSensor, Housekeeping, LiftMotor, ScanPort, Travel,
};
use crate::drivers::bay_servo::BayServoDriver;
use crate::drivers::hw_init::GpioOut;
use crate::drivers::stepper::StepperDriver;
use crate::drivers::watchdog::Watchdog;
use crate::identifier::Identifier;
use crate::pins;
use crate::sensors::hall::HallAdc;

/// The lift stepper as wired on the board.
pub type BoardStepper = StepperDriver<GpioOut, GpioOut, GpioOut>;

impl BoardStepper {
    pub fn board() -> Self {
        StepperDriver::new(
            GpioOut::new(pins::LIFT_STEP_GPIO),
            GpioOut::new(pins::LIFT_DIR_GPIO),
            GpioOut::new(pins::LIFT_EN_GPIO),
        )
    }
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    lift: BoardStepper,
    hall: HallAdc,
    bay: BayServoDriver,
    scanner: RfidScanner,
    clock: Esp32TimeAdapter,
    watchdog: Watchdog,
}

impl HardwareAdapter {
    pub fn new(
        lift: BoardStepper,
        hall: HallAdc,
        bay: BayServoDriver,
        scanner: RfidScanner,
        clock: Esp32TimeAdapter,
        watchdog: Watchdog,
    ) -> Self {
        Self {
            lift,
            hall,
            bay,
            scanner,
            clock,
            watchdog,
        }
    }

    /// Work done between commands: feed the watchdog and drop scans that
    /// arrived while no scan window was open.
    pub fn idle(&mut self) -> usize {
        self.watchdog.feed();
        self.scanner.discard_stale()
    }

    pub fn lift_fault(&self) -> bool {
        self.lift.pin_fault()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.clock.uptime_secs()
    }
}

// ── LiftMotor implementation ──────────────────────────────────

impl LiftMotor for HardwareAdapter {
    fn set_speed(&mut self, steps_per_sec: u32) {
        self.lift.set_speed(steps_per_sec);
    }

    fn move_by(&mut self, steps: i32) {
        self.lift.move_by(steps);
    }

    fn jog(&mut self, travel: Travel) {
        self.lift.jog(travel);
    }

    fn run(&mut self, now_us: u64) -> bool {
        self.lift.run(now_us)
    }

    fn stop(&mut self) {
        self.lift.stop();
    }

    fn set_origin(&mut self) {
        self.lift.set_origin();
    }

    fn position(&self) -> i64 {
        self.lift.position()
    }
}

// ── Sensor / scanner implementations ──────────────────────────

impl HallSensor for HardwareAdapter {
    fn read_raw(&mut self) -> i32 {
        self.hall.read_raw()
    }
}

impl ScanPort for HardwareAdapter {
    fn scan_once(&mut self) -> Option<Identifier> {
        self.scanner.scan_once()
    }
}

// ── BayMotors implementation ──────────────────────────────────

impl BayMotors for HardwareAdapter {
    fn drive(&mut self, left: u16, right: u16) {
        self.bay.drive(left, right);
    }
}

// ── Time and housekeeping ─────────────────────────────────────

impl Clock for HardwareAdapter {
    fn now_us(&self) -> u64 {
        self.clock.now_us()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }
}

impl Housekeeping for HardwareAdapter {
    fn service(&mut self) {
        self.watchdog.feed();
    }
}
