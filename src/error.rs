//! Unified error types for the VLM firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! dispatcher can map any failure onto a response code in one place.
//! All variants are `Copy` so they pass through the orchestrator and the
//! command channel without allocation.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bay location string could not be parsed.
    Location(LocationError),
    /// An operation request was structurally invalid.
    Request(RequestError),
    /// The vertical axis gave up on a move.
    Motion(MotionError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Location(e) => write!(f, "location: {e}"),
            Self::Request(e) => write!(f, "request: {e}"),
            Self::Motion(e) => write!(f, "motion: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Location parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    /// Input was empty.
    Empty,
    /// First character is not a recognised side (`F` / `B`).
    UnknownSide(char),
    /// The level part is not exactly two ASCII digits.
    MalformedLevel,
    /// Level `00` does not exist; floors are 1-based.
    LevelZero,
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty location"),
            Self::UnknownSide(c) => write!(f, "unknown side '{c}'"),
            Self::MalformedLevel => write!(f, "level must be two digits"),
            Self::LevelZero => write!(f, "level must be at least 1"),
        }
    }
}

impl From<LocationError> for Error {
    fn from(e: LocationError) -> Self {
        Self::Location(e)
    }
}

// ---------------------------------------------------------------------------
// Request validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// No floors / pairs were supplied.
    Empty,
    /// Parallel lists have different lengths.
    LengthMismatch { expected: usize, actual: usize },
    /// More entries than the fixed-capacity request can hold.
    TooLong,
    /// Level exceeds the configured number of floors.
    FloorOutOfRange(u8),
    /// A storage location collides with a reserved staging bay.
    ReservedBay,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no floors given"),
            Self::LengthMismatch { expected, actual } => {
                write!(f, "expected {expected} entries, got {actual}")
            }
            Self::TooLong => write!(f, "too many entries"),
            Self::FloorOutOfRange(level) => write!(f, "floor {level} out of range"),
            Self::ReservedBay => write!(f, "staging bay used as storage location"),
        }
    }
}

impl From<RequestError> for Error {
    fn from(e: RequestError) -> Self {
        Self::Request(e)
    }
}

// ---------------------------------------------------------------------------
// Motion errors
// ---------------------------------------------------------------------------

/// Conditions where the vertical axis gives up and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionError {
    /// The move did not finish inside its time budget.  The motor has
    /// been stopped; `current_floor` was still committed to `target`.
    Stall { target: u8 },
    /// A manual move did not finish inside its time budget.
    ManualStall,
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stall { target } => write!(f, "stall while moving to floor {target}"),
            Self::ManualStall => write!(f, "stall during manual move"),
        }
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Self::Motion(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Error::Config(msg),
            ConfigError::Corrupted => Error::Config("stored config corrupted"),
            ConfigError::IoError => Error::Config("config storage I/O error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
