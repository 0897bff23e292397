//! VLM firmware entry point.
//!
//! Hexagonal architecture with a single cooperative control thread.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink   NvsAdapter              │
//! │  (Lift+Hall+Bay+Scan    (EventSink)    (ConfigSource+NVS)      │
//! │   +Clock+Watchdog)      LogStatusSink                          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  ShelfOrchestrator · VerticalAxis · BayActuator        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Console thread ──▶ CMD_CHANNEL ──▶ Dispatcher ──▶ RESP_CHANNEL│
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

#[cfg(target_os = "espidf")]
mod esp_link_shims;

use std::io::BufRead;

use anyhow::Result;
use log::{error, info, warn};

use vlm::adapters::hardware::{BoardStepper, HardwareAdapter};
use vlm::adapters::log_sink::{LogEventSink, LogStatusSink};
use vlm::adapters::nvs::NvsAdapter;
use vlm::adapters::rfid::RfidScanner;
use vlm::adapters::time::Esp32TimeAdapter;
use vlm::app::commands::AppCommand;
use vlm::app::service::AppService;
use vlm::config::MotionConfig;
use vlm::dispatch::{Dispatcher, channels};
use vlm::drivers::bay_servo::BayServoDriver;
use vlm::drivers::hw_init;
use vlm::drivers::watchdog::Watchdog;
use vlm::identifier::Identifier;
use vlm::pins;
use vlm::sensors::hall::HallAdc;

/// Idle-loop period when no frame is pending.
const IDLE_POLL_MS: u64 = 10;

const CONSOLE_STACK_SIZE: usize = 8 * 1024;

// ── Serial console ────────────────────────────────────────────
//
// One line per message.  JSON objects are command frames; a bare hex
// string is a tag UID from a keyboard-wedge reader on the same port.

fn console_reader() {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("Console: read failed: {}", e);
                continue;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('{') {
            if !channels::submit_frame(line.as_bytes()) {
                warn!("Console: command queue full or frame too large, dropped");
            }
        } else if let Some(id) = Identifier::from_hex(&line.to_ascii_lowercase()) {
            if !channels::publish_scan(id) {
                warn!("Console: scan queue full, tag dropped");
            }
        } else {
            warn!("Console: ignoring unrecognised line");
        }
    }
}

fn load_config(nvs: Option<&mut NvsAdapter>) -> MotionConfig {
    let Some(nvs) = nvs else {
        return MotionConfig::default();
    };

    if !nvs.has_config() {
        info!("Config: no stored tunables, seeding NVS with defaults");
        let defaults = MotionConfig::default();
        if let Err(e) = nvs.save_config(&defaults) {
            warn!("Config: seeding NVS failed ({})", e);
        }
        return defaults;
    }

    let config = MotionConfig::from_source(&*nvs);
    match config.validate() {
        Ok(()) => {
            info!("Config loaded from NVS");
            config
        }
        Err(e) => {
            warn!("NVS config invalid ({}), using defaults", e);
            MotionConfig::default()
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  VLM v{}                          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Without the lift outputs nothing can run safely.  The watchdog
        // is not yet subscribed, so halt here and wait for a power cycle.
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            None
        }
    };
    let config = load_config(nvs.as_mut());
    info!(
        "Config: {} floors, {} steps/floor, {} steps/s",
        config.floor_count, config.steps_per_floor, config.normal_speed
    );

    // ── 4. Construct adapters ─────────────────────────────────
    let mut hw = HardwareAdapter::new(
        BoardStepper::board(),
        HallAdc::new(pins::HALL_ADC_GPIO),
        BayServoDriver::default(),
        RfidScanner::new(),
        Esp32TimeAdapter::new(),
        Watchdog::new(),
    );
    let mut status = LogStatusSink::new();
    let mut events = LogEventSink::new();

    std::thread::Builder::new()
        .name("console".into())
        .stack_size(CONSOLE_STACK_SIZE)
        .spawn(console_reader)?;

    // ── 5. Construct app service and home the lift ────────────
    let mut app = AppService::new(config);
    app.start(&mut status, &mut events);

    if let Err(e) = app.handle_command(AppCommand::Calibrate, &mut hw, &mut status, &mut events) {
        warn!("Boot calibration failed: {}", e);
    }

    let mut dispatcher = Dispatcher::new();
    let mut fault_reported = false;
    info!("System ready. Waiting for commands.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        let handled = dispatcher.poll(&mut app, &mut hw, &mut status, &mut events);

        while let Some(reply) = channels::try_recv_response() {
            match core::str::from_utf8(&reply.data) {
                Ok(text) => println!("{}", text),
                Err(_) => warn!("Console: non-UTF-8 response dropped"),
            }
        }

        if hw.lift_fault() && !fault_reported {
            error!("Lift: step driver pin fault latched at {} s uptime", hw.uptime_secs());
            fault_reported = true;
        }

        if !handled {
            hw.idle();
            std::thread::sleep(std::time::Duration::from_millis(IDLE_POLL_MS));
        }
    }
}
