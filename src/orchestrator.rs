//! Shelf operation orchestrator.
//!
//! Composes vertical moves and bay transfers into the operations an
//! operator asks for.  Every operation is a strictly sequential chain of
//! two primitives:
//!
//! - **retrieve(source → dest)**: pull the shelf out of `source`, carry it
//!   to `dest` and push it in.
//! - **return(target)**: pull the shelf out of the bay the carrier is
//!   parked at, carry it to `target` and push it in.
//!
//! A multi-floor cycle keeps two shelves staged so the operator never
//! waits for a full round trip:
//!
//! ```text
//!   preload  floors[0] → LOADING      preload floors[1] → BUFFER
//!   ┌──────────────────────────────────────────────────────────┐
//!   │ i: scan at LOADING · return floors[i]                    │
//!   │    swap BUFFER → LOADING            (if i + 1 < n)       │
//!   │    prefetch floors[i + 2] → BUFFER  (if i + 2 < n)       │
//!   └──────────────────────────────────────────────────────────┘
//! ```

use core::fmt::{self, Write as _};

use heapless::Vec;
use log::{info, warn};

use crate::app::ports::{Clock, Machine, ScanPort, StatusSink};
use crate::config::MotionConfig;
use crate::error::{RequestError, Result};
use crate::identifier::{Identifier, MAX_CAPTURED_IDS};
use crate::location::{BayLocation, BUFFER_BAY, LOADING_BAY};
use crate::motion::bay::{BayAction, BayActuator};
use crate::motion::cooperative_delay;
use crate::motion::lift::{HomingOutcome, VerticalAxis};
use crate::motion::profile::TaskIntent;

/// Most floors (or reorder pairs) one request may name.
pub const MAX_REQUEST_FLOORS: usize = 10;

pub type FloorList = Vec<BayLocation, MAX_REQUEST_FLOORS>;

// ── Requests ──────────────────────────────────────────────────

/// Reject levels above `floor_count` and the two staging bays.
fn check_storage(loc: BayLocation, cfg: &MotionConfig) -> core::result::Result<(), RequestError> {
    if loc.level == 0 || loc.level > cfg.floor_count {
        return Err(RequestError::FloorOutOfRange(loc.level));
    }
    if loc.is_staging() {
        return Err(RequestError::ReservedBay);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleRequest {
    pub floors: FloorList,
    pub orders_per_floor: Vec<u8, MAX_REQUEST_FLOORS>,
    /// Keep scanned identifiers for the caller.
    pub capture_ids: bool,
    /// Upper bound on scans over the whole cycle.
    pub max_ids: u8,
}

impl CycleRequest {
    pub fn new(
        floors: &[BayLocation],
        orders_per_floor: &[u8],
    ) -> core::result::Result<Self, RequestError> {
        Ok(Self {
            floors: Vec::from_slice(floors).map_err(|_| RequestError::TooLong)?,
            orders_per_floor: Vec::from_slice(orders_per_floor)
                .map_err(|_| RequestError::TooLong)?,
            capture_ids: false,
            max_ids: MAX_CAPTURED_IDS as u8,
        })
    }

    pub fn capturing(mut self, max_ids: u8) -> Self {
        self.capture_ids = true;
        self.max_ids = max_ids;
        self
    }

    pub fn iterations(&self) -> usize {
        self.floors.len()
    }

    pub fn validate(&self, cfg: &MotionConfig) -> core::result::Result<(), RequestError> {
        if self.floors.is_empty() {
            return Err(RequestError::Empty);
        }
        if self.orders_per_floor.len() != self.floors.len() {
            return Err(RequestError::LengthMismatch {
                expected: self.floors.len(),
                actual: self.orders_per_floor.len(),
            });
        }
        self.floors.iter().try_for_each(|&f| check_storage(f, cfg))
    }
}

/// Pairwise shelf moves with no staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderRequest {
    pub moves: Vec<(BayLocation, BayLocation), MAX_REQUEST_FLOORS>,
}

impl ReorderRequest {
    pub fn new(
        from: &[BayLocation],
        to: &[BayLocation],
    ) -> core::result::Result<Self, RequestError> {
        if from.len() != to.len() {
            return Err(RequestError::LengthMismatch {
                expected: from.len(),
                actual: to.len(),
            });
        }
        let mut moves = Vec::new();
        for pair in from.iter().copied().zip(to.iter().copied()) {
            moves.push(pair).map_err(|_| RequestError::TooLong)?;
        }
        Ok(Self { moves })
    }

    pub fn validate(&self, cfg: &MotionConfig) -> core::result::Result<(), RequestError> {
        if self.moves.is_empty() {
            return Err(RequestError::Empty);
        }
        self.moves.iter().try_for_each(|&(from, to)| {
            check_storage(from, cfg)?;
            check_storage(to, cfg)
        })
    }
}

// ── Statistics ────────────────────────────────────────────────

/// Running counters since power-on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceStats {
    /// Every retrieve primitive, staging moves included.
    pub retrieves: u32,
    pub returns: u32,
    pub preloads: u32,
    pub buffer_swaps: u32,
    pub prefetches: u32,
    pub relocations: u32,
    pub scan_polls: u32,
    pub ids_captured: u32,
}

// ── Orchestrator ──────────────────────────────────────────────

/// Publish a short formatted status line.
fn announce(status: &mut impl StatusSink, args: fmt::Arguments<'_>) {
    let mut text: heapless::String<48> = heapless::String::new();
    // Overlong text is cut rather than dropped.
    let _ = text.write_fmt(args);
    status.publish(&text);
}

pub struct ShelfOrchestrator {
    config: MotionConfig,
    axis: VerticalAxis,
    bay: BayActuator,
    /// Bay the carrier was last positioned at.
    at_bay: BayLocation,
    stats: SequenceStats,
}

impl ShelfOrchestrator {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            axis: VerticalAxis::new(&config),
            bay: BayActuator::new(),
            at_bay: LOADING_BAY,
            stats: SequenceStats::default(),
            config,
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Swap tunables.  Only called between operations.
    pub fn apply_config(&mut self, config: MotionConfig) {
        self.axis.reconfigure(&config);
        self.config = config;
    }

    pub fn current_floor(&self) -> u8 {
        self.axis.current_floor()
    }

    pub fn at_bay(&self) -> BayLocation {
        self.at_bay
    }

    pub fn stats(&self) -> SequenceStats {
        self.stats
    }

    // ── Primitives ────────────────────────────────────────────

    fn retrieve(
        &mut self,
        source: BayLocation,
        dest: BayLocation,
        hw: &mut impl Machine,
        status: &mut impl StatusSink,
    ) -> Result<()> {
        announce(status, format_args!("Retrieving {}", source));
        let cfg = &self.config;
        self.axis.move_to(source.level, TaskIntent::Pull, cfg, hw)?;
        self.bay.transfer(BayAction::Pull, source.side, cfg, hw);
        self.axis.move_to(dest.level, TaskIntent::Push, cfg, hw)?;
        self.bay.transfer(BayAction::Push, dest.side, cfg, hw);
        self.at_bay = dest;
        self.stats.retrieves += 1;
        Ok(())
    }

    fn return_shelf(
        &mut self,
        target: BayLocation,
        hw: &mut impl Machine,
        status: &mut impl StatusSink,
    ) -> Result<()> {
        announce(status, format_args!("Returning {}", target));
        let cfg = &self.config;
        self.bay.transfer(BayAction::Pull, self.at_bay.side, cfg, hw);
        self.axis.move_to(target.level, TaskIntent::Push, cfg, hw)?;
        self.bay.transfer(BayAction::Push, target.side, cfg, hw);
        self.at_bay = target;
        self.stats.returns += 1;
        Ok(())
    }

    /// Poll the scanner until `orders` items arrived, the capture budget
    /// is spent, or the scan window closes.
    fn scan_floor<const N: usize>(
        &mut self,
        orders: u8,
        remaining: &mut usize,
        captured: &mut Option<&mut Vec<Identifier, N>>,
        hw: &mut impl Machine,
        status: &mut impl StatusSink,
    ) {
        announce(status, format_args!("Scan items: {}", orders));
        let started_ms = hw.now_ms();
        let mut seen: u8 = 0;

        while seen < orders && *remaining > 0 {
            let window = self.config.scan_limit_ms;
            if window > 0 && hw.now_ms().saturating_sub(started_ms) >= u64::from(window) {
                warn!(
                    "Orchestrator: scan window closed with {}/{} items",
                    seen, orders
                );
                break;
            }

            self.stats.scan_polls += 1;
            if let Some(id) = hw.scan_once() {
                seen += 1;
                *remaining -= 1;
                self.stats.ids_captured += 1;
                info!("Orchestrator: scanned {}", id);
                if let Some(list) = captured.as_deref_mut() {
                    // `remaining` never exceeds the free capacity.
                    let _ = list.push(id);
                }
            }
            cooperative_delay(hw, self.config.scan_settle_ms, self.config.yield_ms);
        }
    }

    // ── Operations ────────────────────────────────────────────

    /// Present every floor in `req` at the loading bay in turn, scanning
    /// items off each shelf before it goes back.
    pub fn cycle<const N: usize>(
        &mut self,
        req: &CycleRequest,
        mut captured: Option<&mut Vec<Identifier, N>>,
        hw: &mut impl Machine,
        status: &mut impl StatusSink,
    ) -> Result<()> {
        req.validate(&self.config)?;

        let limit = usize::from(req.max_ids);
        let mut remaining = match captured.as_deref() {
            Some(list) => limit.min(N.saturating_sub(list.len())),
            None => limit,
        };
        let floors = &req.floors;
        let orders = &req.orders_per_floor;
        let n = floors.len();
        info!("Orchestrator: cycle over {} floor(s)", n);

        if n == 1 {
            self.retrieve(floors[0], LOADING_BAY, hw, status)?;
            self.scan_floor(orders[0], &mut remaining, &mut captured, hw, status);
            self.return_shelf(floors[0], hw, status)?;
            info!("Orchestrator: cycle complete");
            return Ok(());
        }

        self.retrieve(floors[0], LOADING_BAY, hw, status)?;
        self.retrieve(floors[1], BUFFER_BAY, hw, status)?;
        self.stats.preloads += 2;

        for i in 0..n {
            self.axis
                .move_to(LOADING_BAY.level, TaskIntent::Neutral, &self.config, hw)?;
            self.at_bay = LOADING_BAY;
            self.scan_floor(orders[i], &mut remaining, &mut captured, hw, status);
            self.return_shelf(floors[i], hw, status)?;

            if i + 1 < n {
                self.retrieve(BUFFER_BAY, LOADING_BAY, hw, status)?;
                self.stats.buffer_swaps += 1;
            }
            if i + 2 < n {
                self.retrieve(floors[i + 2], BUFFER_BAY, hw, status)?;
                self.stats.prefetches += 1;
            }
        }

        info!("Orchestrator: cycle complete");
        Ok(())
    }

    /// Move shelves pairwise, parking at the loading level after each pair.
    pub fn reorder(
        &mut self,
        req: &ReorderRequest,
        hw: &mut impl Machine,
        status: &mut impl StatusSink,
    ) -> Result<()> {
        req.validate(&self.config)?;
        info!("Orchestrator: reorder of {} shelf(s)", req.moves.len());

        for &(from, to) in &req.moves {
            announce(status, format_args!("Moving {} to {}", from, to));
            let cfg = &self.config;
            self.axis.move_to(from.level, TaskIntent::Pull, cfg, hw)?;
            self.bay.transfer(BayAction::Pull, from.side, cfg, hw);
            self.axis.move_to(to.level, TaskIntent::Push, cfg, hw)?;
            self.bay.transfer(BayAction::Push, to.side, cfg, hw);
            self.at_bay = to;
            self.stats.relocations += 1;
            // Park empty at the loading level before the next pull.
            self.axis
                .move_to(LOADING_BAY.level, TaskIntent::Neutral, &self.config, hw)?;
        }

        info!("Orchestrator: reorder complete");
        Ok(())
    }

    /// Bring one shelf to the loading bay and put it back.
    pub fn restock(
        &mut self,
        floor: BayLocation,
        hw: &mut impl Machine,
        status: &mut impl StatusSink,
    ) -> Result<()> {
        check_storage(floor, &self.config)?;
        info!("Orchestrator: restock {}", floor);
        self.retrieve(floor, LOADING_BAY, hw, status)?;
        self.return_shelf(floor, hw, status)?;
        Ok(())
    }

    pub fn calibrate(
        &mut self,
        hw: &mut impl Machine,
        status: &mut impl StatusSink,
    ) -> HomingOutcome {
        status.publish("Homing");
        let outcome = self.axis.calibrate(&self.config, hw);
        self.at_bay = LOADING_BAY;
        if outcome.timed_out() {
            status.publish("Homing timed out");
        }
        outcome
    }

    pub fn manual_vertical(
        &mut self,
        steps: u32,
        upward: bool,
        hw: &mut impl Machine,
    ) -> Result<()> {
        self.axis.manual(steps, upward, &self.config, hw)?;
        Ok(())
    }

    pub fn manual_horizontal(
        &mut self,
        duration_ms: u32,
        left: u16,
        right: u16,
        hw: &mut impl Machine,
    ) {
        self.bay.manual(duration_ms, left, right, &self.config, hw);
    }
}
