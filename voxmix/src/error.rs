use crate::backend::Backend;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MixError {
    #[error("Buffer `{buffer}` holds {actual} samples, but at least {required} are required")]
    BufferTooShort {
        buffer: &'static str,
        required: usize,
        actual: usize,
    },
    #[error("Frame length mismatch: expected {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Backend {0} is not available on this machine")]
    UnsupportedBackend(Backend),
}
