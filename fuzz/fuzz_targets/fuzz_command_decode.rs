//! Fuzz target: command frame decode + interpretation
//!
//! Drives arbitrary bytes through `message::decode` and, when they form a
//! frame, through `message::interpret`.  Neither may panic, and every
//! cycle request that comes out must respect its fixed capacities.
//!
//! cargo fuzz run fuzz_command_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use vlm::app::commands::AppCommand;
use vlm::config::MotionConfig;
use vlm::dispatch::message::{self, Request};
use vlm::orchestrator::MAX_REQUEST_FLOORS;

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = message::decode(data) else {
        return;
    };
    let cfg = MotionConfig::default();
    if let Ok(Request::Command(AppCommand::Cycle(req))) = message::interpret(&frame, &cfg) {
        assert!(req.floors.len() <= MAX_REQUEST_FLOORS);
        let _ = req.validate(&cfg);
    }
});
