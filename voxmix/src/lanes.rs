//! Transfer between caller sample buffers and lane blocks.
//!
//! A lane block is the in-memory image of one vector register worth of samples. Blocks are
//! aligned to 64 bytes so every backend can use aligned loads and stores, regardless of whether
//! it consumes the block as one 512 bit register or as several narrower ones.

use crate::LANE_COUNT;
use crate::sample::Sample;

/// One block of `f32` lanes, lane `i` corresponding to buffer index `i`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C, align(64))]
pub struct F32Lanes(pub [f32; LANE_COUNT]);

/// One block of `i32` lanes, lane `i` corresponding to buffer index `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C, align(64))]
pub struct I32Lanes(pub [i32; LANE_COUNT]);

impl Default for F32Lanes {
    fn default() -> Self {
        Self([0.0; LANE_COUNT])
    }
}

impl I32Lanes {
    /// Returns the value held by lane `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= LANE_COUNT`.
    #[inline]
    pub fn extract(&self, index: usize) -> i32 {
        self.0[index]
    }
}

/// Per-lane ramp multipliers: lane 0 carries the largest step, the last lane carries zero.
pub(crate) static RAMP_STEPS: F32Lanes = ramp_steps();

const fn ramp_steps() -> F32Lanes {
    let mut steps = [0.0f32; LANE_COUNT];
    let mut i = 0;
    while i < LANE_COUNT {
        steps[i] = (LANE_COUNT - 1 - i) as f32;
        i += 1;
    }
    F32Lanes(steps)
}

/// Widens one block of samples into `f32` lanes.
#[inline]
pub fn gather<S: Sample>(values: &[S; LANE_COUNT]) -> F32Lanes {
    F32Lanes(values.map(Sample::to_f32))
}

/// Narrows one block of `i32` lanes into the destination storage type.
#[inline]
pub fn store<S: Sample>(lanes: &I32Lanes, out: &mut [S; LANE_COUNT]) {
    for (index, slot) in out.iter_mut().enumerate() {
        *slot = S::from_lane(lanes.extract(index));
    }
}
