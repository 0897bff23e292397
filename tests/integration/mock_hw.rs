//! Mock machine for integration tests.
//!
//! Implements every hardware port on one struct with a virtual clock, so
//! a full shelf cycle runs in milliseconds of wall time.  Records every
//! actuator call so tests can assert on the full command history without
//! touching real GPIO/PWM registers.

use std::cell::Cell;
use std::collections::VecDeque;

use vlm::app::events::AppEvent;
use vlm::app::ports::{
    BayMotors, Clock, EventSink, HallSensor, Housekeeping, LiftMotor, ScanPort, StatusSink,
    Travel,
};
use vlm::config::MotionConfig;
use vlm::identifier::Identifier;

/// Virtual time that passes on every clock read.
const TICK_US: u64 = 50;

/// Hall reading with no magnet in view.
pub const HALL_IDLE: i32 = 2048;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetSpeed(u32),
    MoveBy(i32),
    Jog(Travel),
    Stop,
    SetOrigin,
    Drive { left: u16, right: u16 },
}

// ── MockMachine ───────────────────────────────────────────────

pub struct MockMachine {
    pub calls: Vec<Call>,
    now_us: Cell<u64>,
    position: i64,
    pending: i32,
    jog: Option<Travel>,
    /// Relative moves never complete.  Jogging still counts steps, as an
    /// open-loop driver would.
    pub jammed: bool,
    pub hall: VecDeque<i32>,
    pub scans: VecDeque<Identifier>,
    pub scan_polls: u32,
    pub services: u32,
}

#[allow(dead_code)]
impl MockMachine {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            now_us: Cell::new(0),
            position: 0,
            pending: 0,
            jog: None,
            jammed: false,
            hall: VecDeque::new(),
            scans: VecDeque::new(),
            scan_polls: 0,
            services: 0,
        }
    }

    pub fn jammed() -> Self {
        Self {
            jammed: true,
            ..Self::new()
        }
    }

    /// Queue tag reads in hex form.
    pub fn queue_scans(&mut self, hex: &[&str]) {
        for h in hex {
            self.scans
                .push_back(Identifier::from_hex(h).expect("valid test uid"));
        }
    }

    /// Queue a clean magnet pass after the detector has settled.
    pub fn queue_magnet_after_settle(&mut self, settle_samples: u16) {
        for _ in 0..=settle_samples {
            self.hall.push_back(HALL_IDLE);
        }
        self.hall.extend([HALL_IDLE + 60, HALL_IDLE + 160, HALL_IDLE + 60]);
    }

    pub fn moves(&self) -> Vec<i32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::MoveBy(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn drives(&self) -> Vec<(u16, u16)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Drive { left, right } => Some((*left, *right)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.now_us.get() / 1000
    }
}

impl Default for MockMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl LiftMotor for MockMachine {
    fn set_speed(&mut self, steps_per_sec: u32) {
        self.calls.push(Call::SetSpeed(steps_per_sec));
    }

    fn move_by(&mut self, steps: i32) {
        self.calls.push(Call::MoveBy(steps));
        self.jog = None;
        self.pending = steps;
    }

    fn jog(&mut self, travel: Travel) {
        self.calls.push(Call::Jog(travel));
        self.pending = 0;
        self.jog = Some(travel);
    }

    fn run(&mut self, _now_us: u64) -> bool {
        if let Some(travel) = self.jog {
            self.position += i64::from(travel.sign());
            return true;
        }
        if self.pending == 0 {
            return false;
        }
        if self.jammed {
            return true;
        }
        let step = self.pending.signum();
        self.position += i64::from(step);
        self.pending -= step;
        self.pending != 0
    }

    fn stop(&mut self) {
        self.calls.push(Call::Stop);
        self.pending = 0;
        self.jog = None;
    }

    fn set_origin(&mut self) {
        self.calls.push(Call::SetOrigin);
        self.position = 0;
    }

    fn position(&self) -> i64 {
        self.position
    }
}

impl HallSensor for MockMachine {
    fn read_raw(&mut self) -> i32 {
        self.hall.pop_front().unwrap_or(HALL_IDLE)
    }
}

impl BayMotors for MockMachine {
    fn drive(&mut self, left: u16, right: u16) {
        self.calls.push(Call::Drive { left, right });
    }
}

impl ScanPort for MockMachine {
    fn scan_once(&mut self) -> Option<Identifier> {
        self.scan_polls += 1;
        self.scans.pop_front()
    }
}

impl Clock for MockMachine {
    fn now_us(&self) -> u64 {
        let t = self.now_us.get() + TICK_US;
        self.now_us.set(t);
        t
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now_us.set(self.now_us.get() + u64::from(ms) * 1000);
    }
}

impl Housekeeping for MockMachine {
    fn service(&mut self) {
        self.services += 1;
    }
}

// ── Sinks ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct StatusLog {
    pub lines: Vec<String>,
}

#[allow(dead_code)]
impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.lines.iter().any(|l| l == text)
    }
}

impl StatusSink for StatusLog {
    fn publish(&mut self, message: &str) {
        self.lines.push(message.to_string());
    }
}

#[derive(Default)]
pub struct EventLog {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Config ────────────────────────────────────────────────────

/// Short floors and short bay runs so sequences finish quickly.
pub fn test_config() -> MotionConfig {
    MotionConfig {
        steps_per_floor: 100,
        bay_run_ms: 100,
        scan_settle_ms: 10,
        ..MotionConfig::default()
    }
}
