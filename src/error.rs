use thiserror::Error;

/// Construction-time configuration errors. The per-sample path has no error cases.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("frame size {0} is not a positive power of two")]
    FrameSizeNotPowerOfTwo(usize),

    #[error("frame size {frame_size} is too small (minimum {min})")]
    FrameSizeTooSmall { frame_size: usize, min: usize },

    #[error("overlap factor {0} is invalid (must be a power of two >= 4)")]
    InvalidOverlap(usize),

    #[error("window overlap-add sum is not constant (ripple {ripple:.2e})")]
    OverlapNotConstant { ripple: f32 },

    #[error("overlap-add gain {configured} does not match the window (expected {expected})")]
    GainMismatch { configured: f32, expected: f32 },

    #[error("sample rate {0} must be finite and positive")]
    InvalidSampleRate(f32),

    #[error("spectral edit expects {expected} bins but the engine produces {actual}")]
    HookSizeMismatch { expected: usize, actual: usize },

    #[error("invalid engine config JSON: {0}")]
    Json(#[from] serde_json::Error),
}
