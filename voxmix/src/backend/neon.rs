use crate::LANE_COUNT;
use crate::backend::{Kernel, OUTPUT_MAX, OUTPUT_MIN};
use crate::lanes::{F32Lanes, I32Lanes, RAMP_STEPS};
use std::arch::aarch64::*;

const WIDTH: usize = 4;

#[derive(Debug)]
pub(crate) struct NeonKernel;

impl Kernel for NeonKernel {
    fn ramp_gain(&self, samples: &F32Lanes, current_gain: f32, increment: f32) -> I32Lanes {
        let mut out = I32Lanes::default();

        // SAFETY: NEON is part of the aarch64 baseline and every access stays within
        // `LANE_COUNT` lanes.
        unsafe {
            let base_gain = vdupq_n_f32(current_gain);
            let step_gain = vdupq_n_f32(increment);
            let lower = vdupq_n_f32(OUTPUT_MIN);
            let upper = vdupq_n_f32(OUTPUT_MAX);

            for offset in (0..LANE_COUNT).step_by(WIDTH) {
                let steps = vld1q_f32(RAMP_STEPS.0.as_ptr().add(offset));
                let gain = vaddq_f32(base_gain, vmulq_f32(step_gain, steps));
                let value = vmulq_f32(vld1q_f32(samples.0.as_ptr().add(offset)), gain);

                // NaN never compares equal to itself, its lanes are masked to zero
                let ordered = vceqq_f32(value, value);
                let value =
                    vreinterpretq_f32_u32(vandq_u32(vreinterpretq_u32_f32(value), ordered));
                let value = vminq_f32(vmaxq_f32(value, lower), upper);

                vst1q_s32(out.0.as_mut_ptr().add(offset), vcvtnq_s32_f32(value));
            }
        }

        out
    }

    fn add(&self, a: &F32Lanes, b: &F32Lanes) -> I32Lanes {
        let mut out = I32Lanes::default();

        // SAFETY: NEON is part of the aarch64 baseline and every access stays within
        // `LANE_COUNT` lanes.
        unsafe {
            for offset in (0..LANE_COUNT).step_by(WIDTH) {
                let sum = vaddq_f32(
                    vld1q_f32(a.0.as_ptr().add(offset)),
                    vld1q_f32(b.0.as_ptr().add(offset)),
                );
                // the NEON conversion already saturates at the i32 bounds
                vst1q_s32(out.0.as_mut_ptr().add(offset), vcvtnq_s32_f32(sum));
            }
        }

        out
    }
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
                NeonKernel.ramp_gain(&samples, gain, increment),
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
                NeonKernel.ramp_gain(&samples, gain, increment),
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
        assert_eq!(NeonKernel.add(&a, &b), ScalarKernel.add(&a, &b));
    }
}
