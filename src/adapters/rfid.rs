//! Card reader adapter.
//!
//! Tags arrive from the console thread (a keyboard-wedge reader types the
//! UID as hex) and are queued on
//! [`SCAN_CHANNEL`](crate::dispatch::channels::SCAN_CHANNEL).
//! [`RfidScanner`] is the control-loop side: a non-blocking
//! [`ScanPort`] over that channel.

use log::debug;

use crate::app::ports::ScanPort;
use crate::dispatch::channels;
use crate::identifier::Identifier;

#[derive(Debug, Default)]
pub struct RfidScanner {
    scans: u32,
}

impl RfidScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop scans that arrived while nobody was polling.
    pub fn discard_stale(&mut self) -> usize {
        let mut dropped = 0;
        while channels::try_recv_scan().is_some() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!("RFID: discarded {} stale scan(s)", dropped);
        }
        dropped
    }

    pub fn scans(&self) -> u32 {
        self.scans
    }
}

impl ScanPort for RfidScanner {
    fn scan_once(&mut self) -> Option<Identifier> {
        let id = channels::try_recv_scan()?;
        self.scans += 1;
        debug!("RFID: tag {}", id);
        Some(id)
    }
}
