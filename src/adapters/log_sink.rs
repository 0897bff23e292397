//! Log-based sinks.
//!
//! [`LogEventSink`] writes structured application events and
//! [`LogStatusSink`] writes operator display text, both to the ESP-IDF
//! logger (UART / USB-CDC in production).  A display driver or a network
//! forwarder would implement the same traits.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, StatusSink};

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { floor } => {
                info!("START | floor={}", floor);
            }
            AppEvent::OperationStarted(kind) => {
                info!("OP    | {:?} started", kind);
            }
            AppEvent::OperationCompleted { kind, floor } => {
                info!("OP    | {:?} done | floor={}", kind, floor);
            }
            AppEvent::OperationFailed { kind, error } => {
                warn!("OP    | {:?} failed | {}", kind, error);
            }
            AppEvent::Homed { travelled } => {
                info!("HOME  | found | steps={}", travelled);
            }
            AppEvent::HomingTimedOut { travelled } => {
                warn!("HOME  | timed out | steps={}", travelled);
            }
        }
    }
}

/// Status text sink.  Remembers the last message so the banner can be
/// re-read after a reconnect.
#[derive(Debug, Default)]
pub struct LogStatusSink {
    last: heapless::String<64>,
}

impl LogStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> &str {
        &self.last
    }
}

impl StatusSink for LogStatusSink {
    fn publish(&mut self, message: &str) {
        for line in message.lines() {
            info!("DISPLAY | {}", line);
        }
        self.last.clear();
        // Longer text is only logged, not retained.
        let _ = self.last.push_str(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_sink_keeps_last_message() {
        let mut sink = LogStatusSink::new();
        sink.publish("Retrieving F03");
        sink.publish("Scan items: 2");
        assert_eq!(sink.last(), "Scan items: 2");
    }
}
