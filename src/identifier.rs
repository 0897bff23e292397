//! Scanned item identifiers.
//!
//! RFID UIDs are carried as lowercase hex text, two digits per byte, so
//! `[0x04, 0xA1, 0x0F]` becomes `"04a10f"`.  That is the form the
//! warehouse backend stores and the form echoed in cycle responses.

use core::fmt::{self, Write};

use serde::Serialize;

/// Longest UID an ISO 14443 tag reports (triple-size UID).
pub const MAX_UID_BYTES: usize = 10;

/// Default capacity of a cycle's capture buffer.
pub const MAX_CAPTURED_IDS: usize = 10;

/// One scanned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(heapless::String<{ MAX_UID_BYTES * 2 }>);

/// Bounded buffer a cycle writes identifiers into.
pub type CapturedIds = heapless::Vec<Identifier, MAX_CAPTURED_IDS>;

impl Identifier {
    /// Render raw UID bytes.  `None` for an empty or oversized UID.
    pub fn from_uid(uid: &[u8]) -> Option<Self> {
        if uid.is_empty() || uid.len() > MAX_UID_BYTES {
            return None;
        }
        let mut text = heapless::String::new();
        for byte in uid {
            write!(text, "{byte:02x}").ok()?;
        }
        Some(Self(text))
    }

    /// Accept an already-rendered identifier (lowercase hex, even length).
    pub fn from_hex(text: &str) -> Option<Self> {
        let valid = !text.is_empty()
            && text.len() % 2 == 0
            && text
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !valid {
            return None;
        }
        heapless::String::try_from(text).ok().map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
