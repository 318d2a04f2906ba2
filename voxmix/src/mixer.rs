use crate::LANE_COUNT;
use crate::backend::{Backend, Kernel};
use crate::config::MixerConfig;
use crate::error::MixError;
use crate::lanes::{gather, store};
use tracing::instrument;

/// Handle to the sample kernels of one backend.
///
/// A `Mixer` holds no ramp or buffer state, every call is a pure transform of its arguments.
/// It is `Copy` and can be shared freely between audio threads.
#[derive(Debug, Clone, Copy)]
pub struct Mixer {
    backend: Backend,
    kernel: &'static dyn Kernel,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    /// Creates a mixer using the widest backend available on this machine.
    #[instrument(level = "debug")]
    pub fn new() -> Self {
        let (backend, kernel) = Backend::detected_kernel();
        Self { backend, kernel }
    }

    /// Creates a mixer using the given backend.
    ///
    /// # Returns
    ///
    /// - `Ok(Mixer)` if the backend was compiled in and is supported by this CPU.
    /// - `Err(MixError::UnsupportedBackend)` otherwise.
    #[instrument(level = "debug", err)]
    pub fn with_backend(backend: Backend) -> Result<Self, MixError> {
        let kernel = backend
            .kernel()
            .ok_or(MixError::UnsupportedBackend(backend))?;
        tracing::debug!(%backend, "Created mixer");
        Ok(Self { backend, kernel })
    }

    /// Creates a mixer for the backend selected in `config`, detecting one if none was set.
    pub fn from_config(config: &MixerConfig) -> Result<Self, MixError> {
        match config.backend {
            Some(backend) => Self::with_backend(backend),
            None => Ok(Self::new()),
        }
    }

    /// Creates a mixer using the scalar backend, which is available everywhere.
    pub fn scalar() -> Self {
        Self {
            backend: Backend::Scalar,
            kernel: &crate::backend::scalar::ScalarKernel,
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Applies a gain ramp to one block of `data_in` and writes the clamped result to `data_out`.
    ///
    /// Lane `i` is multiplied by `current_gain + increment * (LANE_COUNT - 1 - i)`, so the first
    /// sample of the block receives the largest step of the ramp. Results are clamped to the `i16`
    /// range and rounded to nearest. Only the first [`LANE_COUNT`] elements of either buffer are
    /// accessed.
    pub fn collect_single_register(
        &self,
        data_in: &[i32],
        data_out: &mut [i16],
        current_gain: f32,
        increment: f32,
    ) -> Result<(), MixError> {
        let data_in = block(data_in, "data_in")?;
        let data_out = block_mut(data_out, "data_out")?;
        self.ramp_block(data_in, data_out, current_gain, increment);
        Ok(())
    }

    /// Adds one block of `decoded_data` onto `up_sampled_vector` in place.
    ///
    /// No clamping to the `i16` range is applied, sums beyond the `i32` range saturate.
    /// Only the first [`LANE_COUNT`] elements of either buffer are accessed.
    pub fn combine_samples(
        &self,
        up_sampled_vector: &mut [i32],
        decoded_data: &[i16],
    ) -> Result<(), MixError> {
        let up_sampled_vector = block_mut(up_sampled_vector, "up_sampled_vector")?;
        let decoded_data = block(decoded_data, "decoded_data")?;
        self.combine_block(up_sampled_vector, decoded_data);
        Ok(())
    }

    /// Applies a gain ramp to a whole frame, block by block.
    ///
    /// Every block starts `increment * LANE_COUNT` above the previous one. A trailing partial block
    /// is processed zero-padded, its padding is discarded. The returned gain is where the next
    /// frame continues the ramp; tracking it across frames is up to the caller.
    pub fn apply_gain_ramp(
        &self,
        data_in: &[i32],
        data_out: &mut [i16],
        current_gain: f32,
        increment: f32,
    ) -> Result<f32, MixError> {
        if data_in.len() != data_out.len() {
            return Err(MixError::LengthMismatch {
                expected: data_in.len(),
                actual: data_out.len(),
            });
        }

        let block_increment = increment * LANE_COUNT as f32;
        let mut gain = current_gain;

        let (in_blocks, in_tail) = data_in.as_chunks::<LANE_COUNT>();
        let (out_blocks, out_tail) = data_out.as_chunks_mut::<LANE_COUNT>();
        for (input, output) in in_blocks.iter().zip(out_blocks) {
            self.ramp_block(input, output, gain, increment);
            gain += block_increment;
        }

        if !in_tail.is_empty() {
            tracing::trace!(tail = in_tail.len(), "Padding partial gain ramp block");
            let mut input = [0i32; LANE_COUNT];
            input[..in_tail.len()].copy_from_slice(in_tail);
            let mut output = [0i16; LANE_COUNT];
            self.ramp_block(&input, &mut output, gain, increment);
            out_tail.copy_from_slice(&output[..out_tail.len()]);
            gain += block_increment;
        }

        Ok(gain)
    }

    /// Adds a whole frame of `decoded` onto `up_sampled`, block by block.
    pub fn combine_frames(&self, up_sampled: &mut [i32], decoded: &[i16]) -> Result<(), MixError> {
        if up_sampled.len() != decoded.len() {
            return Err(MixError::LengthMismatch {
                expected: up_sampled.len(),
                actual: decoded.len(),
            });
        }

        let (up_blocks, up_tail) = up_sampled.as_chunks_mut::<LANE_COUNT>();
        let (decoded_blocks, decoded_tail) = decoded.as_chunks::<LANE_COUNT>();
        for (up, decoded) in up_blocks.iter_mut().zip(decoded_blocks) {
            self.combine_block(up, decoded);
        }

        if !up_tail.is_empty() {
            tracing::trace!(tail = up_tail.len(), "Padding partial combine block");
            let mut up = [0i32; LANE_COUNT];
            up[..up_tail.len()].copy_from_slice(up_tail);
            let mut decoded = [0i16; LANE_COUNT];
            decoded[..decoded_tail.len()].copy_from_slice(decoded_tail);
            self.combine_block(&mut up, &decoded);
            up_tail.copy_from_slice(&up[..up_tail.len()]);
        }

        Ok(())
    }

    #[inline]
    fn ramp_block(
        &self,
        data_in: &[i32; LANE_COUNT],
        data_out: &mut [i16; LANE_COUNT],
        current_gain: f32,
        increment: f32,
    ) {
        let samples = gather(data_in);
        let ramped = self.kernel.ramp_gain(&samples, current_gain, increment);
        store(&ramped, data_out);
    }

    #[inline]
    fn combine_block(&self, up_sampled: &mut [i32; LANE_COUNT], decoded: &[i16; LANE_COUNT]) {
        let sum = self.kernel.add(&gather(up_sampled), &gather(decoded));
        store(&sum, up_sampled);
    }
}

fn block<'a, T>(buffer: &'a [T], name: &'static str) -> Result<&'a [T; LANE_COUNT], MixError> {
    let actual = buffer.len();
    buffer
        .first_chunk::<LANE_COUNT>()
        .ok_or(MixError::BufferTooShort {
            buffer: name,
            required: LANE_COUNT,
            actual,
        })
}

fn block_mut<'a, T>(
    buffer: &'a mut [T],
    name: &'static str,
) -> Result<&'a mut [T; LANE_COUNT], MixError> {
    let actual = buffer.len();
    buffer
        .first_chunk_mut::<LANE_COUNT>()
        .ok_or(MixError::BufferTooShort {
            buffer: name,
            required: LANE_COUNT,
            actual,
        })
}
