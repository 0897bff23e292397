//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ VerticalAxis / BayActuator / ShelfOrchestrator
//! ```
//!
//! Hardware adapters (stepper, hall ADC, bay servos, RFID reader, clock,
//! watchdog) implement these traits.  The motion core consumes them via
//! generics, so nothing under `motion/` or `orchestrator` touches a
//! register directly and every sequence runs on the host against mocks.
//!
//! Callers pass one `hw` value that implements several ports at once
//! (see [`Machine`]).  That keeps the borrow simple: a move loop can step
//! the motor, sample the sensor and feed the watchdog through the same
//! `&mut`.

use crate::identifier::Identifier;

// ───────────────────────────────────────────────────────────────
// Vertical drive (domain → stepper)
// ───────────────────────────────────────────────────────────────

/// Direction of travel along the shaft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Travel {
    Up,
    Down,
}

impl Travel {
    /// Motor sign convention: upward is positive everywhere.
    pub const fn sign(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// Step/direction lift motor.
///
/// The motor is polled: the caller invokes [`run`](Self::run) in a tight
/// loop and the implementation emits a step whenever one is due.
pub trait LiftMotor {
    /// Step rate used by subsequent moves (steps/s).
    fn set_speed(&mut self, steps_per_sec: u32);

    /// Queue a relative move; sign selects the direction.
    fn move_by(&mut self, steps: i32);

    /// Run continuously in `travel` until [`stop`](Self::stop).
    fn jog(&mut self, travel: Travel);

    /// Emit a step if one is due at `now_us`.  Returns `true` while motion
    /// is still pending (always `true` while jogging).
    fn run(&mut self, now_us: u64) -> bool;

    /// Abort any queued or continuous motion.
    fn stop(&mut self);

    /// Declare the current physical position to be step zero.
    fn set_origin(&mut self);

    /// Absolute position in steps relative to the origin.
    fn position(&self) -> i64;
}

// ───────────────────────────────────────────────────────────────
// Floor sensor (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Analog hall-effect sensor facing the floor magnets.
pub trait HallSensor {
    /// One raw ADC sample.
    fn read_raw(&mut self) -> i32;
}

// ───────────────────────────────────────────────────────────────
// Bay drive (domain → servos)
// ───────────────────────────────────────────────────────────────

/// The two continuous-rotation motors that move a shelf sideways.
pub trait BayMotors {
    /// Command both motors (servo units, 0–180, 90 = stop).
    fn drive(&mut self, left: u16, right: u16);
}

// ───────────────────────────────────────────────────────────────
// Scanner (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Item-identifier reader.
pub trait ScanPort {
    /// Single non-blocking poll.
    fn scan_once(&mut self) -> Option<Identifier>;
}

// ───────────────────────────────────────────────────────────────
// Time and cooperative housekeeping
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus a blocking delay.
pub trait Clock {
    /// Microseconds since boot.
    fn now_us(&self) -> u64;

    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }
}

/// Lightweight background work that must keep running while a motion
/// loop holds the control thread (watchdog feed, network servicing).
pub trait Housekeeping {
    fn service(&mut self);
}

/// Everything a shelf operation needs from the hardware side.
pub trait Machine: LiftMotor + HallSensor + BayMotors + ScanPort + Clock + Housekeeping {}

impl<T> Machine for T where T: LiftMotor + HallSensor + BayMotors + ScanPort + Clock + Housekeeping {}

// ───────────────────────────────────────────────────────────────
// Status display (domain → operator)
// ───────────────────────────────────────────────────────────────

/// Short operator-facing text.  Fire-and-forget; failures are the
/// adapter's problem.
pub trait StatusSink {
    fn publish(&mut self, message: &str);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The service emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// websocket, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration source (persistent config → domain)
// ───────────────────────────────────────────────────────────────

/// Key/value source for numeric tunables.
pub trait ConfigSource {
    /// Stored value for `name`, or `default` if absent or unreadable.
    fn get_int(&self, name: &str, default: i32) -> i32;
}

// ───────────────────────────────────────────────────────────────
// Storage port (domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic; no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from configuration loading and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored value failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
