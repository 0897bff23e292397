//! Motion core: profile maths, the vertical axis and the bay drive.
//!
//! Nothing in here owns hardware.  Every function takes the ports it needs
//! as `impl Trait` arguments, so the same code drives the stepper on the
//! board and the mock machine in tests.

pub mod bay;
pub mod lift;
pub mod profile;

use crate::app::ports::{Clock, Housekeeping};

/// Block for `total_ms`, servicing housekeeping at least every `slice_ms`.
pub(crate) fn cooperative_delay(
    hw: &mut (impl Clock + Housekeeping),
    total_ms: u32,
    slice_ms: u32,
) {
    let slice = slice_ms.max(1);
    let mut remaining = total_ms;
    while remaining > 0 {
        let step = remaining.min(slice);
        hw.delay_ms(step);
        hw.service();
        remaining -= step;
    }
}
