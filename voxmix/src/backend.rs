//! Vector backends executing the per-block sample kernels.
//!
//! # Architecture
//!
//! Every backend implements the crate-internal [`Kernel`] trait over one block of
//! [`LANE_COUNT`](crate::LANE_COUNT) lanes. Backends differ only in how many lanes a single
//! hardware register holds, never in their results: each one multiplies, clamps and rounds in the
//! same order as the scalar backend, so output is bit-identical on every machine.
//!
//! | Backend  | Architecture | Lanes per register | Registers per block |
//! |----------|--------------|--------------------|---------------------|
//! | `avx512` | x86_64       | 16                 | 1                   |
//! | `avx2`   | x86_64       | 8                  | 2                   |
//! | `sse2`   | x86_64       | 4                  | 4                   |
//! | `neon`   | aarch64      | 4                  | 4                   |
//! | `scalar` | any          | 1                  | 16                  |
//!
//! ## Backend Selection
//!
//! Backend modules are compiled in at build time using `cfg_if!` based on the target
//! architecture. Among the compiled-in backends, the widest one supported by the running CPU is
//! detected once per process (see [`Backend::detect`]). The scalar backend is always available.
//!
//! ## Numeric Rules
//!
//! - Ramp gains are `current_gain + increment * step`, computed as a separate multiply and add.
//! - NaN lanes of the ramp kernel are silenced (`0`), infinities clamp to the `i16` bounds.
//! - Float to integer conversion rounds to nearest, ties to even.
//! - Sums of the combine kernel saturate at the `i32` bounds.

use crate::lanes::{F32Lanes, I32Lanes};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::OnceLock;

pub(crate) mod scalar;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        mod avx2;
        mod avx512;
        mod sse2;
    } else if #[cfg(target_arch = "aarch64")] {
        mod neon;
    }
}

/// Lower bound of the ramp kernel output range.
pub(crate) const OUTPUT_MIN: f32 = i16::MIN as f32;
/// Upper bound of the ramp kernel output range.
pub(crate) const OUTPUT_MAX: f32 = i16::MAX as f32;
/// Smallest `f32` that no longer fits into an `i32`.
#[cfg(target_arch = "x86_64")]
pub(crate) const I32_OVERFLOW: f32 = 2_147_483_648.0;

/// Per-block sample kernels of one backend.
///
/// Implementations are zero-sized tokens which are only handed out by [`Backend::kernel`] after
/// the required CPU features have been verified.
pub(crate) trait Kernel: Send + Sync + Debug + 'static {
    /// Multiplies every lane by its ramp gain, clamps to the `i16` range and rounds to integers.
    fn ramp_gain(&self, samples: &F32Lanes, current_gain: f32, increment: f32) -> I32Lanes;

    /// Adds both blocks lane by lane and rounds the sums to integers.
    fn add(&self, a: &F32Lanes, b: &F32Lanes) -> I32Lanes;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Scalar,
    Sse2,
    Avx2,
    Avx512,
    Neon,
}

static DETECTED: OnceLock<(Backend, &'static dyn Kernel)> = OnceLock::new();

impl Backend {
    /// All backends, widest first.
    pub const PRIORITY: [Backend; 5] = [
        Backend::Avx512,
        Backend::Avx2,
        Backend::Sse2,
        Backend::Neon,
        Backend::Scalar,
    ];

    /// Returns the widest backend available on this machine.
    ///
    /// Detection runs once, subsequent calls return the cached result.
    pub fn detect() -> Backend {
        Backend::detected_kernel().0
    }

    /// Returns the detected backend together with its kernel.
    pub(crate) fn detected_kernel() -> (Backend, &'static dyn Kernel) {
        *DETECTED.get_or_init(|| {
            tracing::debug!(available = ?Backend::available(), "Detected sample kernel backends");
            let (backend, kernel) = Backend::PRIORITY
                .into_iter()
                .find_map(|backend| backend.kernel().map(|kernel| (backend, kernel)))
                .unwrap_or((Backend::Scalar, &scalar::ScalarKernel));
            tracing::info!(
                %backend,
                native_width = backend.native_width(),
                "Selected sample kernel backend"
            );
            (backend, kernel)
        })
    }

    /// Returns all backends usable on this machine, widest first.
    pub fn available() -> Vec<Backend> {
        Backend::PRIORITY
            .into_iter()
            .filter(|backend| backend.is_available())
            .collect()
    }

    pub fn is_available(self) -> bool {
        self.kernel().is_some()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Sse2 => "sse2",
            Backend::Avx2 => "avx2",
            Backend::Avx512 => "avx512",
            Backend::Neon => "neon",
        }
    }

    /// Number of 32 bit lanes a single hardware register of this backend holds.
    pub const fn native_width(self) -> usize {
        match self {
            Backend::Scalar => 1,
            Backend::Sse2 | Backend::Neon => 4,
            Backend::Avx2 => 8,
            Backend::Avx512 => 16,
        }
    }

    /// Returns the kernel of this backend if it was compiled in and the CPU supports it.
    pub(crate) fn kernel(self) -> Option<&'static dyn Kernel> {
        match self {
            Backend::Scalar => Some(&scalar::ScalarKernel),
            #[cfg(target_arch = "x86_64")]
            Backend::Sse2 => Some(&sse2::Sse2Kernel),
            #[cfg(target_arch = "x86_64")]
            Backend::Avx2 => std::arch::is_x86_feature_detected!("avx2")
                .then_some(&avx2::Avx2Kernel as &dyn Kernel),
            #[cfg(target_arch = "x86_64")]
            Backend::Avx512 => std::arch::is_x86_feature_detected!("avx512f")
                .then_some(&avx512::Avx512Kernel as &dyn Kernel),
            #[cfg(target_arch = "aarch64")]
            Backend::Neon => Some(&neon::NeonKernel),
            _ => None,
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown backend: {0}")]
pub struct ParseBackendError(String);

impl FromStr for Backend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::PRIORITY
            .into_iter()
            .find(|backend| backend.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseBackendError(s.to_string()))
    }
}
