use crate::LANE_COUNT;
use crate::backend::{I32_OVERFLOW, Kernel, OUTPUT_MAX, OUTPUT_MIN};
use crate::lanes::{F32Lanes, I32Lanes, RAMP_STEPS};
use std::arch::x86_64::*;

const WIDTH: usize = 8;

/// Only constructed by [`Backend::kernel`](crate::backend::Backend::kernel) after AVX2 was detected.
#[derive(Debug)]
pub(crate) struct Avx2Kernel;

impl Kernel for Avx2Kernel {
    fn ramp_gain(&self, samples: &F32Lanes, current_gain: f32, increment: f32) -> I32Lanes {
        // SAFETY: the kernel token is only handed out if AVX2 is available.
        unsafe { ramp_gain(samples, current_gain, increment) }
    }

    fn add(&self, a: &F32Lanes, b: &F32Lanes) -> I32Lanes {
        // SAFETY: the kernel token is only handed out if AVX2 is available.
        unsafe { add(a, b) }
    }
}

/// # Safety
///
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
unsafe fn ramp_gain(samples: &F32Lanes, current_gain: f32, increment: f32) -> I32Lanes {
    let mut out = I32Lanes::default();

    // SAFETY: all blocks are 64 byte aligned and every access stays within `LANE_COUNT` lanes.
    unsafe {
        let base_gain = _mm256_set1_ps(current_gain);
        let step_gain = _mm256_set1_ps(increment);
        let lower = _mm256_set1_ps(OUTPUT_MIN);
        let upper = _mm256_set1_ps(OUTPUT_MAX);

        for offset in (0..LANE_COUNT).step_by(WIDTH) {
            let steps = _mm256_load_ps(RAMP_STEPS.0.as_ptr().add(offset));
            let gain = _mm256_add_ps(base_gain, _mm256_mul_ps(step_gain, steps));
            let value = _mm256_mul_ps(_mm256_load_ps(samples.0.as_ptr().add(offset)), gain);

            let value = _mm256_and_ps(value, _mm256_cmp_ps::<_CMP_ORD_Q>(value, value));
            let value = _mm256_min_ps(_mm256_max_ps(value, lower), upper);

            _mm256_store_si256(
                out.0.as_mut_ptr().add(offset).cast(),
                _mm256_cvtps_epi32(value),
            );
        }
    }

    out
}

/// # Safety
///
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
unsafe fn add(a: &F32Lanes, b: &F32Lanes) -> I32Lanes {
    let mut out = I32Lanes::default();

    // SAFETY: all blocks are 64 byte aligned and every access stays within `LANE_COUNT` lanes.
    unsafe {
        let overflow = _mm256_set1_ps(I32_OVERFLOW);

        for offset in (0..LANE_COUNT).step_by(WIDTH) {
            let sum = _mm256_add_ps(
                _mm256_load_ps(a.0.as_ptr().add(offset)),
                _mm256_load_ps(b.0.as_ptr().add(offset)),
            );

            let overflowed = _mm256_castps_si256(_mm256_cmp_ps::<_CMP_GE_OQ>(sum, overflow));
            let rounded = _mm256_xor_si256(_mm256_cvtps_epi32(sum), overflowed);

            _mm256_store_si256(out.0.as_mut_ptr().add(offset).cast(), rounded);
        }
    }

    out
}
