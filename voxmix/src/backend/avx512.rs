use crate::backend::{I32_OVERFLOW, Kernel, OUTPUT_MAX, OUTPUT_MIN};
use crate::lanes::{F32Lanes, I32Lanes, RAMP_STEPS};
use std::arch::x86_64::*;

/// One 512 bit register holds an entire block.
///
/// Only constructed by [`Backend::kernel`](crate::backend::Backend::kernel) after AVX-512F was
/// detected.
#[derive(Debug)]
pub(crate) struct Avx512Kernel;

impl Kernel for Avx512Kernel {
    fn ramp_gain(&self, samples: &F32Lanes, current_gain: f32, increment: f32) -> I32Lanes {
        // SAFETY: the kernel token is only handed out if AVX-512F is available.
        unsafe { ramp_gain(samples, current_gain, increment) }
    }

    fn add(&self, a: &F32Lanes, b: &F32Lanes) -> I32Lanes {
        // SAFETY: the kernel token is only handed out if AVX-512F is available.
        unsafe { add(a, b) }
    }
}

/// # Safety
///
/// The CPU must support AVX-512F.
#[target_feature(enable = "avx512f")]
unsafe fn ramp_gain(samples: &F32Lanes, current_gain: f32, increment: f32) -> I32Lanes {
    let mut out = I32Lanes::default();

    // SAFETY: all blocks are 64 byte aligned and exactly one register wide.
    unsafe {
        let steps = _mm512_load_ps(RAMP_STEPS.0.as_ptr());
        let gain = _mm512_add_ps(
            _mm512_set1_ps(current_gain),
            _mm512_mul_ps(_mm512_set1_ps(increment), steps),
        );
        let value = _mm512_mul_ps(_mm512_load_ps(samples.0.as_ptr()), gain);

        let ordered = _mm512_cmp_ps_mask::<_CMP_ORD_Q>(value, value);
        let value = _mm512_maskz_mov_ps(ordered, value);
        let value = _mm512_min_ps(
            _mm512_max_ps(value, _mm512_set1_ps(OUTPUT_MIN)),
            _mm512_set1_ps(OUTPUT_MAX),
        );

        _mm512_store_epi32(out.0.as_mut_ptr(), _mm512_cvtps_epi32(value));
    }

    out
}

/// # Safety
///
/// The CPU must support AVX-512F.
#[target_feature(enable = "avx512f")]
unsafe fn add(a: &F32Lanes, b: &F32Lanes) -> I32Lanes {
    let mut out = I32Lanes::default();

    // SAFETY: all blocks are 64 byte aligned and exactly one register wide.
    unsafe {
        let sum = _mm512_add_ps(_mm512_load_ps(a.0.as_ptr()), _mm512_load_ps(b.0.as_ptr()));

        let overflowed = _mm512_cmp_ps_mask::<_CMP_GE_OQ>(sum, _mm512_set1_ps(I32_OVERFLOW));
        let rounded = _mm512_mask_mov_epi32(
            _mm512_cvtps_epi32(sum),
            overflowed,
            _mm512_set1_epi32(i32::MAX),
        );

        _mm512_store_epi32(out.0.as_mut_ptr(), rounded);
    }

    out
}
