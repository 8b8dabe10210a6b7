//! Real-time STFT analysis / resynthesis engine.
//!
//! Each channel runs a closed pipeline: input ring → frame extraction → Hann
//! window → forward FFT → spectral edit hook → inverse FFT → Hann window →
//! overlap-add → output ring. A frame fires every N/4 samples (75% overlap by
//! default) and the reconstruction has unity gain with an identity edit, at a
//! fixed latency of N samples.
//!
//! ```
//! use stft_engine::{EngineConfig, StereoProcessor};
//!
//! let mut stereo = StereoProcessor::new(&EngineConfig::default()).unwrap();
//! let mut left = vec![0.0f32; 512];
//! let mut right = vec![0.0f32; 512];
//! left[0] = 1.0;
//! stereo.process_block(&mut left, &mut right);
//! assert!((left[stereo.latency_samples()] - 1.0).abs() < 1e-4);
//! ```

pub mod config;
pub mod debug;
pub mod dsp;
pub mod error;
pub mod presets;

pub use config::{EngineConfig, ResolvedConfig};
pub use dsp::{
    Channel, Passthrough, ReverseBins, SpectralDomain, SpectralEdit, Spectrum, StereoProcessor,
    StftEngine,
};
pub use error::ConfigError;
pub use presets::EnginePreset;

// assert_no_alloc compiles the disabler out of release builds.
#[cfg(all(test, debug_assertions))]
#[global_allocator]
static TEST_ALLOCATOR: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;
