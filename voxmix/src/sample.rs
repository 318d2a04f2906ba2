/// Storage type of a single audio sample as it lives in a caller's buffer.
pub trait Sample: Copy + Default + Send + Sync + 'static {
    /// Widens the sample into an `f32` lane. `i32` magnitudes above 2^24 lose precision.
    fn to_f32(self) -> f32;

    /// Narrows an `i32` lane back into the storage type with a truncating cast.
    fn from_lane(lane: i32) -> Self;
}

impl Sample for i16 {
    #[inline]
    fn to_f32(self) -> f32 {
        f32::from(self)
    }

    #[inline]
    fn from_lane(lane: i32) -> Self {
        lane as i16
    }
}

impl Sample for i32 {
    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn from_lane(lane: i32) -> Self {
        lane
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    #[test]
    fn i16_widens_exactly() {
        assert_eq!(i16::MIN.to_f32(), -32768.0);
        assert_eq!(i16::MAX.to_f32(), 32767.0);
    }

    #[test]
    fn i16_from_lane_truncates() {
        assert_eq!(i16::from_lane(1234), 1234);
        assert_eq!(i16::from_lane(-32768), i16::MIN);
        // upper bits are dropped, just like a plain `as` cast
        assert_eq!(i16::from_lane(0x0001_0005), 5);
    }

    #[test]
    fn i32_from_lane_is_identity() {
        assert_eq!(i32::from_lane(i32::MIN), i32::MIN);
        assert_eq!(i32::from_lane(-7), -7);
    }

    #[test]
    fn i32_to_f32_rounds_large_values() {
        // f32 has a 24 bit mantissa, larger magnitudes round to the nearest representable value
        assert_eq!(16_777_217i32.to_f32(), 16_777_216.0);
        assert_eq!(i32::MAX.to_f32(), 2_147_483_648.0);
    }
}
