//! Inter-task channels.
//!
//! Bounded `embassy-sync` channels bridge the I/O threads (serial
//! console, network client, card reader) with the synchronous control
//! loop.  Everything is static; nothing here allocates.
//!
//! ```text
//! ┌──────────────┐  CommandMsg   ┌──────────────┐
//! │  I/O thread  │─────────────▶│ Control loop │
//! │              │◀─────────────│              │
//! └──────────────┘  ResponseMsg  └──────────────┘
//! ┌──────────────┐  Identifier          ▲
//! │ Card reader  │──────────────────────┘  (RfidScanner)
//! └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;
use log::warn;

use crate::identifier::Identifier;

use super::message::{RESPONSE_CAP, ResponseBytes};

/// Longest inbound frame accepted.
pub const FRAME_CAP: usize = 512;

/// Inbound command frame, delivered to the control loop.
pub struct CommandMsg {
    pub frame: Vec<u8, FRAME_CAP>,
}

/// Outbound response, delivered to the I/O side.
pub struct ResponseMsg {
    pub data: Vec<u8, RESPONSE_CAP>,
}

/// Channel depth for command (inbound) messages.
const CMD_DEPTH: usize = 4;

/// Channel depth for response (outbound) messages.
const RESP_DEPTH: usize = 8;

/// Scans buffered between the reader and the control loop.
const SCAN_DEPTH: usize = 4;

/// Inbound command channel: I/O thread → control loop.
pub static CMD_CHANNEL: Channel<CriticalSectionRawMutex, CommandMsg, CMD_DEPTH> = Channel::new();

/// Outbound response channel: control loop → I/O thread.
pub static RESP_CHANNEL: Channel<CriticalSectionRawMutex, ResponseMsg, RESP_DEPTH> =
    Channel::new();

/// Scanned identifiers: card reader → `RfidScanner`.
pub static SCAN_CHANNEL: Channel<CriticalSectionRawMutex, Identifier, SCAN_DEPTH> = Channel::new();

/// Queue one raw frame for the control loop.  Returns `false` if it is
/// too long or the queue is full.
pub fn submit_frame(bytes: &[u8]) -> bool {
    let Ok(frame) = Vec::from_slice(bytes) else {
        warn!("Dispatch: frame of {} bytes dropped (max {})", bytes.len(), FRAME_CAP);
        return false;
    };
    if CMD_CHANNEL.try_send(CommandMsg { frame }).is_err() {
        warn!("Dispatch: command channel full, frame dropped");
        return false;
    }
    true
}

/// Non-blocking receive for the control loop.
pub fn try_recv_command() -> Option<CommandMsg> {
    CMD_CHANNEL.try_receive().ok()
}

/// Queue a response for the I/O side.
pub fn send_response(data: ResponseBytes) {
    if RESP_CHANNEL.try_send(ResponseMsg { data }).is_err() {
        warn!("Dispatch: response channel full, response dropped");
    }
}

pub fn try_recv_response() -> Option<ResponseMsg> {
    RESP_CHANNEL.try_receive().ok()
}

/// Hand a scanned identifier to the control loop.  Drops it when the
/// loop is not consuming (no scan phase running).
pub fn publish_scan(id: Identifier) -> bool {
    SCAN_CHANNEL.try_send(id).is_ok()
}

pub fn try_recv_scan() -> Option<Identifier> {
    SCAN_CHANNEL.try_receive().ok()
}
