//! Floor-crossing detection from the analog hall sensor.
//!
//! Every floor carries a magnet.  As the carrier passes, the sensor output
//! rises to a peak and falls back.  [`FloorCrossingDetector`] turns the raw
//! sample stream into one event per passage:
//!
//! ```text
//!   raw ─┐     ╭─╮
//!        │    ╱   ╲        change_prev > +min_change   (rising into prev)
//!        │   ╱     ╲       change_now  < −min_change   (falling after prev)
//!   base ┴──╯       ╰───   |reading − baseline| > min_amplitude
//!                ▲
//!                event, then refractory window
//! ```
//!
//! ## Dual-target design
//!
//! [`HallAdc`] reads ADC1 through hw_init on ESP-IDF.
//! On host/test: reads from a static `AtomicU16` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use crate::app::ports::HallSensor;
use crate::config::MotionConfig;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_HALL_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_hall_adc(raw: u16) {
    SIM_HALL_ADC.store(raw, Ordering::Relaxed);
}

/// Weight of one quiet sample in the rolling baseline, as a shift (1/16).
const BASELINE_SHIFT: u32 = 4;

// ── Detector ──────────────────────────────────────────────────

/// Which refractory window applies after a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorMode {
    /// Floor-to-floor travel at normal speed.
    Normal,
    /// Slow approach to the reference magnet.
    Homing,
}

/// Thresholds copied out of [`MotionConfig`] at reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorParams {
    pub min_change: i32,
    pub min_amplitude: i32,
    pub settle_samples: u16,
    pub refractory_ms: u32,
    pub homing_refractory_ms: u32,
}

impl From<&MotionConfig> for DetectorParams {
    fn from(cfg: &MotionConfig) -> Self {
        Self {
            min_change: cfg.hall_min_change,
            min_amplitude: cfg.hall_min_amplitude,
            settle_samples: cfg.hall_settle_samples,
            refractory_ms: cfg.refractory_ms,
            homing_refractory_ms: cfg.homing_refractory_ms,
        }
    }
}

/// Peak detector state.  Owned by the vertical axis; never shared.
#[derive(Debug, Clone)]
pub struct FloorCrossingDetector {
    params: DetectorParams,
    mode: DetectorMode,
    seeded: bool,
    /// Baseline scaled by 2^BASELINE_SHIFT to keep fractional bits.
    baseline_acc: i64,
    settle_sum: i64,
    settled: u16,
    prev: i32,
    prev_prev: i32,
    refractory_since_ms: Option<u64>,
}

impl FloorCrossingDetector {
    pub fn new(params: DetectorParams) -> Self {
        Self {
            params,
            mode: DetectorMode::Normal,
            seeded: false,
            baseline_acc: 0,
            settle_sum: 0,
            settled: 0,
            prev: 0,
            prev_prev: 0,
            refractory_since_ms: None,
        }
    }

    /// Forget all history and start a new stabilisation phase.
    pub fn reset(&mut self, mode: DetectorMode) {
        *self = Self {
            mode,
            ..Self::new(self.params)
        };
    }

    /// Replace thresholds (takes effect at the next [`reset`](Self::reset)).
    pub fn set_params(&mut self, params: DetectorParams) {
        self.params = params;
    }

    pub fn mode(&self) -> DetectorMode {
        self.mode
    }

    /// Still establishing the baseline?
    pub fn is_settling(&self) -> bool {
        !self.seeded || self.settled < self.params.settle_samples
    }

    pub fn in_refractory(&self) -> bool {
        self.refractory_since_ms.is_some()
    }

    pub fn baseline(&self) -> i32 {
        (self.baseline_acc >> BASELINE_SHIFT) as i32
    }

    /// Feed one sample taken at `now_ms`.  Returns `true` exactly once per
    /// magnet passage.
    pub fn sample(&mut self, reading: i32, now_ms: u64) -> bool {
        if !self.seeded {
            self.seeded = true;
            self.prev = reading;
            self.prev_prev = reading;
            self.settle_sum = i64::from(reading);
            self.baseline_acc = i64::from(reading) << BASELINE_SHIFT;
            return false;
        }

        if self.settled < self.params.settle_samples {
            self.settled += 1;
            self.settle_sum += i64::from(reading);
            let mean = self.settle_sum / (i64::from(self.settled) + 1);
            self.baseline_acc = mean << BASELINE_SHIFT;
            self.push_history(reading);
            return false;
        }

        if let Some(since) = self.refractory_since_ms {
            if now_ms.saturating_sub(since) >= u64::from(self.refractory_window_ms()) {
                self.refractory_since_ms = None;
            }
        }

        let change_now = reading - self.prev;
        let change_prev = self.prev - self.prev_prev;
        let amplitude = (reading - self.baseline()).abs();

        let detected = self.refractory_since_ms.is_none()
            && change_prev > self.params.min_change
            && change_now < -self.params.min_change
            && amplitude > self.params.min_amplitude;

        if detected {
            self.refractory_since_ms = Some(now_ms);
        } else if self.refractory_since_ms.is_none() && amplitude <= self.params.min_amplitude {
            // Quiet sample: let the baseline follow slow drift.
            let scaled = i64::from(reading) << BASELINE_SHIFT;
            self.baseline_acc += (scaled - self.baseline_acc) >> BASELINE_SHIFT;
        }

        self.push_history(reading);
        detected
    }

    fn refractory_window_ms(&self) -> u32 {
        match self.mode {
            DetectorMode::Normal => self.params.refractory_ms,
            DetectorMode::Homing => self.params.homing_refractory_ms,
        }
    }

    fn push_history(&mut self, reading: i32) {
        self.prev_prev = self.prev;
        self.prev = reading;
    }
}

// ── ADC reader ────────────────────────────────────────────────

/// Hall sensor on an ADC1 channel.
pub struct HallAdc {
    _adc_gpio: i32,
}

impl HallAdc {
    pub fn new(adc_gpio: i32) -> Self {
        Self {
            _adc_gpio: adc_gpio,
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(hw_init::ADC1_CH_HALL)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_HALL_ADC.load(Ordering::Relaxed)
    }
}

impl HallSensor for HallAdc {
    fn read_raw(&mut self) -> i32 {
        i32::from(self.read_adc())
    }
}
