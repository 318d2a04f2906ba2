use crate::backend::{Kernel, OUTPUT_MAX, OUTPUT_MIN};
use crate::lanes::{F32Lanes, I32Lanes, RAMP_STEPS};

/// Reference backend, one lane at a time. Every vector backend must match it bit for bit.
#[derive(Debug)]
pub(crate) struct ScalarKernel;

impl Kernel for ScalarKernel {
    fn ramp_gain(&self, samples: &F32Lanes, current_gain: f32, increment: f32) -> I32Lanes {
        let mut out = I32Lanes::default();
        for ((lane, &sample), &step) in out.0.iter_mut().zip(&samples.0).zip(&RAMP_STEPS.0) {
            let gain = current_gain + increment * step;
            *lane = round_to_i32(clamp_to_output(sample * gain));
        }
        out
    }

    fn add(&self, a: &F32Lanes, b: &F32Lanes) -> I32Lanes {
        let mut out = I32Lanes::default();
        for ((lane, &a), &b) in out.0.iter_mut().zip(&a.0).zip(&b.0) {
            *lane = round_to_i32(a + b);
        }
        out
    }
}

#[inline]
fn clamp_to_output(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(OUTPUT_MIN, OUTPUT_MAX)
    }
}

/// Rounds to nearest (ties to even) and saturates at the `i32` bounds.
#[inline]
fn round_to_i32(value: f32) -> i32 {
    value.round_ties_even() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LANE_COUNT;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn splat(value: f32) -> F32Lanes {
        F32Lanes([value; LANE_COUNT])
    }

    #[test]
    fn ramp_gain_constant() {
        let out = ScalarKernel.ramp_gain(&splat(1000.0), 2.0, 0.0);
        assert_eq!(out.0, [2000; LANE_COUNT]);
    }

    #[test]
    fn ramp_gain_reversed_lane_order() {
        let out = ScalarKernel.ramp_gain(&splat(1.0), 0.0, 1.0);
        let expected: [i32; LANE_COUNT] = std::array::from_fn(|i| (LANE_COUNT - 1 - i) as i32);
        assert_eq!(out.0, expected);
    }

    #[test]
    fn ramp_gain_saturates() {
        assert_eq!(
            ScalarKernel.ramp_gain(&splat(20_000.0), 2.0, 0.0).0,
            [32767; LANE_COUNT]
        );
        assert_eq!(
            ScalarKernel.ramp_gain(&splat(-20_000.0), 2.0, 0.0).0,
            [-32768; LANE_COUNT]
        );
    }

    #[test]
    fn ramp_gain_rounds_ties_to_even() {
        let mut samples = splat(0.0);
        samples.0[0] = 0.5;
        samples.0[1] = 1.5;
        samples.0[2] = 2.5;
        samples.0[3] = -2.5;
        samples.0[4] = 2.6;

        let out = ScalarKernel.ramp_gain(&samples, 1.0, 0.0);
        assert_eq!(&out.0[..5], &[0, 2, 2, -2, 3]);
    }

    #[test]
    fn ramp_gain_silences_nan() {
        // inf * 0 on the last lane step yields NaN gains
        let out = ScalarKernel.ramp_gain(&splat(1.0), 0.0, f32::INFINITY);
        assert_eq!(out.extract(LANE_COUNT - 1), 0);
        assert_eq!(out.extract(0), 32767);
    }

    #[test]
    fn ramp_gain_clamps_infinity() {
        let out = ScalarKernel.ramp_gain(&splat(-3.0), f32::INFINITY, 0.0);
        assert_eq!(out.0, [-32768; LANE_COUNT]);
    }

    #[test]
    fn add_sums_lanes() {
        let a = F32Lanes(std::array::from_fn(|i| i as f32));
        let out = ScalarKernel.add(&a, &splat(-3.0));
        let expected: [i32; LANE_COUNT] = std::array::from_fn(|i| i as i32 - 3);
        assert_eq!(out.0, expected);
    }

    #[test]
    fn add_saturates_at_i32_bounds() {
        let out = ScalarKernel.add(&splat(i32::MAX as f32), &splat(32767.0));
        assert_eq!(out.0, [i32::MAX; LANE_COUNT]);

        let out = ScalarKernel.add(&splat(i32::MIN as f32), &splat(-32768.0));
        assert_eq!(out.0, [i32::MIN; LANE_COUNT]);
    }
}
