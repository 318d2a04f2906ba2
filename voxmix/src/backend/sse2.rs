use crate::LANE_COUNT;
use crate::backend::{I32_OVERFLOW, Kernel, OUTPUT_MAX, OUTPUT_MIN};
use crate::lanes::{F32Lanes, I32Lanes, RAMP_STEPS};
use std::arch::x86_64::*;

const WIDTH: usize = 4;

#[derive(Debug)]
pub(crate) struct Sse2Kernel;

impl Kernel for Sse2Kernel {
    fn ramp_gain(&self, samples: &F32Lanes, current_gain: f32, increment: f32) -> I32Lanes {
        // SAFETY: SSE2 is part of the x86_64 baseline.
        unsafe { ramp_gain(samples, current_gain, increment) }
    }

    fn add(&self, a: &F32Lanes, b: &F32Lanes) -> I32Lanes {
        // SAFETY: SSE2 is part of the x86_64 baseline.
        unsafe { add(a, b) }
    }
}

/// # Safety
///
/// The CPU must support SSE2.
#[target_feature(enable = "sse2")]
unsafe fn ramp_gain(samples: &F32Lanes, current_gain: f32, increment: f32) -> I32Lanes {
    let mut out = I32Lanes::default();

    // SAFETY: all blocks are 64 byte aligned and every access stays within `LANE_COUNT` lanes.
    unsafe {
        let base_gain = _mm_set1_ps(current_gain);
        let step_gain = _mm_set1_ps(increment);
        let lower = _mm_set1_ps(OUTPUT_MIN);
        let upper = _mm_set1_ps(OUTPUT_MAX);

        for offset in (0..LANE_COUNT).step_by(WIDTH) {
            let steps = _mm_load_ps(RAMP_STEPS.0.as_ptr().add(offset));
            let gain = _mm_add_ps(base_gain, _mm_mul_ps(step_gain, steps));
            let value = _mm_mul_ps(_mm_load_ps(samples.0.as_ptr().add(offset)), gain);

            // NaN lanes fail the ordered compare and are masked to zero
            let value = _mm_and_ps(value, _mm_cmpord_ps(value, value));
            let value = _mm_min_ps(_mm_max_ps(value, lower), upper);

            _mm_store_si128(
                out.0.as_mut_ptr().add(offset).cast(),
                _mm_cvtps_epi32(value),
            );
        }
    }

    out
}

/// # Safety
///
/// The CPU must support SSE2.
#[target_feature(enable = "sse2")]
unsafe fn add(a: &F32Lanes, b: &F32Lanes) -> I32Lanes {
    let mut out = I32Lanes::default();

    // SAFETY: all blocks are 64 byte aligned and every access stays within `LANE_COUNT` lanes.
    unsafe {
        let overflow = _mm_set1_ps(I32_OVERFLOW);

        for offset in (0..LANE_COUNT).step_by(WIDTH) {
            let sum = _mm_add_ps(
                _mm_load_ps(a.0.as_ptr().add(offset)),
                _mm_load_ps(b.0.as_ptr().add(offset)),
            );

            // the conversion yields i32::MIN for lanes >= 2^31, flipping all bits gives i32::MAX
            let overflowed = _mm_castps_si128(_mm_cmpge_ps(sum, overflow));
            let rounded = _mm_xor_si128(_mm_cvtps_epi32(sum), overflowed);

            _mm_store_si128(out.0.as_mut_ptr().add(offset).cast(), rounded);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scalar::ScalarKernel;
    use pretty_assertions::assert_eq;
    use test_log::test;

    #[test]
    fn ramp_gain_matches_scalar() {
        let samples = F32Lanes(std::array::from_fn(|i| (i as f32 - 7.5) * 3001.0));
        for (gain, increment) in [(0.0, 0.0), (1.0, 0.0), (0.25, 0.125), (4.0, -0.3), (-1.5, 0.01)] {
            assert_eq!(
                Sse2Kernel.ramp_gain(&samples, gain, increment),
                ScalarKernel.ramp_gain(&samples, gain, increment),
                "gain={gain} increment={increment}"
            );
        }
    }

    #[test]
    fn ramp_gain_special_values_match_scalar() {
        let samples = F32Lanes([1.0; LANE_COUNT]);
        for (gain, increment) in [
            (0.0, f32::INFINITY),
            (f32::NAN, 0.0),
            (f32::NEG_INFINITY, 1.0),
        ] {
            assert_eq!(
                Sse2Kernel.ramp_gain(&samples, gain, increment),
                ScalarKernel.ramp_gain(&samples, gain, increment),
                "gain={gain} increment={increment}"
            );
        }
    }

    #[test]
    fn add_saturates_like_scalar() {
        let a = F32Lanes(std::array::from_fn(|i| {
            if i % 2 == 0 { i32::MAX as f32 } else { i32::MIN as f32 }
        }));
        let b = F32Lanes(std::array::from_fn(|i| {
            if i % 2 == 0 { 32767.0 } else { -32768.0 }
        }));
        assert_eq!(Sse2Kernel.add(&a, &b), ScalarKernel.add(&a, &b));
    }
}
