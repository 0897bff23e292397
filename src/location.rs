//! Bay locations: which side of the shaft and which floor.
//!
//! Text form is one side character followed by a two-digit level:
//!
//! ```text
//!   F01  B07  F10
//!   │└┴── level, zero-padded below 10
//!   └──── side: F = front, B = back
//! ```
//!
//! [`BayLocation::from_str`] is the only way to build a location from
//! untrusted input; every malformed string is rejected with a
//! [`LocationError`] instead of being truncated or defaulted.

use core::fmt;
use core::str::FromStr;

use crate::error::LocationError;

/// Which side of the carrier a bay is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Front,
    Back,
}

impl Side {
    pub const fn as_char(self) -> char {
        match self {
            Self::Front => 'F',
            Self::Back => 'B',
        }
    }

    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'F' => Some(Self::Front),
            'B' => Some(Self::Back),
            _ => None,
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }
}

/// A shelf slot: side plus 1-based floor level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BayLocation {
    pub side: Side,
    pub level: u8,
}

/// Staging slot where shelves are presented to the operator.
pub const LOADING_BAY: BayLocation = BayLocation::new(Side::Front, 1);

/// Staging slot holding the next shelf during a pipelined cycle.
pub const BUFFER_BAY: BayLocation = BayLocation::new(Side::Back, 1);

impl BayLocation {
    pub const fn new(side: Side, level: u8) -> Self {
        Self { side, level }
    }

    /// True for the two reserved staging bays.
    pub fn is_staging(&self) -> bool {
        *self == LOADING_BAY || *self == BUFFER_BAY
    }
}

impl FromStr for BayLocation {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let first = chars.next().ok_or(LocationError::Empty)?;
        let side = Side::from_char(first).ok_or(LocationError::UnknownSide(first))?;

        let digits = chars.as_str().as_bytes();
        if digits.len() != 2 || !digits.iter().all(u8::is_ascii_digit) {
            return Err(LocationError::MalformedLevel);
        }
        let level = (digits[0] - b'0') * 10 + (digits[1] - b'0');
        if level == 0 {
            return Err(LocationError::LevelZero);
        }

        Ok(Self { side, level })
    }
}

impl fmt::Display for BayLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.side.as_char(), self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<BayLocation, LocationError> {
        s.parse()
    }

    #[test]
    fn parses_front_and_back() {
        assert_eq!(parse("F01"), Ok(BayLocation::new(Side::Front, 1)));
        assert_eq!(parse("B10"), Ok(BayLocation::new(Side::Back, 10)));
        assert_eq!(parse("B07"), Ok(BayLocation::new(Side::Back, 7)));
    }

    #[test]
    fn rejects_missing_side() {
        assert_eq!(parse("01"), Err(LocationError::UnknownSide('0')));
        assert_eq!(parse("X05"), Err(LocationError::UnknownSide('X')));
        assert_eq!(parse("f05"), Err(LocationError::UnknownSide('f')));
    }

    #[test]
    fn rejects_malformed_level() {
        assert_eq!(parse(""), Err(LocationError::Empty));
        assert_eq!(parse("F"), Err(LocationError::MalformedLevel));
        assert_eq!(parse("F1"), Err(LocationError::MalformedLevel));
        assert_eq!(parse("F010"), Err(LocationError::MalformedLevel));
        assert_eq!(parse("F0a"), Err(LocationError::MalformedLevel));
        assert_eq!(parse("F-1"), Err(LocationError::MalformedLevel));
        assert_eq!(parse("F00"), Err(LocationError::LevelZero));
    }

    #[test]
    fn display_pads_single_digit_levels_only() {
        assert_eq!(BayLocation::new(Side::Front, 3).to_string(), "F03");
        assert_eq!(BayLocation::new(Side::Back, 10).to_string(), "B10");
    }

    #[test]
    fn staging_bays_are_reserved() {
        assert!(LOADING_BAY.is_staging());
        assert!(BUFFER_BAY.is_staging());
        assert!(!BayLocation::new(Side::Front, 2).is_staging());
        assert_ne!(LOADING_BAY, BUFFER_BAY);
    }
}
