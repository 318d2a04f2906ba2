//! Vectorised sample kernels for mixing voice audio.
//!
//! Two kernels operate on fixed blocks of [`LANE_COUNT`] samples:
//!
//! - [`collect_single_register`] applies a linear gain ramp to 32 bit samples and narrows the
//!   clamped result into 16 bit output samples.
//! - [`combine_samples`] adds 16 bit samples onto a 32 bit accumulator in place.
//!
//! Both run on the widest vector [`Backend`] available at runtime and produce bit-identical
//! results on every backend. Use a [`Mixer`] to pick a backend explicitly or to process whole
//! frames.

pub mod backend;
pub mod config;
pub mod error;
pub mod lanes;
mod mixer;
pub mod sample;

pub use backend::Backend;
pub use config::MixerConfig;
pub use error::MixError;
pub use mixer::Mixer;
pub use sample::Sample;

use std::sync::OnceLock;

/// Number of samples processed per kernel call, the `f32` lane count of a 512 bit register.
pub const LANE_COUNT: usize = 16;

static DEFAULT_MIXER: OnceLock<Mixer> = OnceLock::new();

fn default_mixer() -> &'static Mixer {
    DEFAULT_MIXER.get_or_init(Mixer::new)
}

/// Applies a gain ramp to one block of samples using the detected backend.
///
/// See [`Mixer::collect_single_register`].
pub fn collect_single_register(
    data_in: &[i32],
    data_out: &mut [i16],
    current_gain: f32,
    increment: f32,
) -> Result<(), MixError> {
    default_mixer().collect_single_register(data_in, data_out, current_gain, increment)
}

/// Adds one block of decoded samples onto an accumulator using the detected backend.
///
/// See [`Mixer::combine_samples`].
pub fn combine_samples(
    up_sampled_vector: &mut [i32],
    decoded_data: &[i16],
) -> Result<(), MixError> {
    default_mixer().combine_samples(up_sampled_vector, decoded_data)
}
