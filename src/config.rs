//! Engine configuration and construction-time validation.
//!
//! The overlap-add gain is tied to the window and hop: with analysis and
//! synthesis windows both Hann, output sample `j` collects `Σ_k w[j + k·hop]²`
//! from the overlapping frames, and the gain is the reciprocal of that sum.
//! Validation measures the sum for the configured frame size and overlap,
//! rejects layouts where it is not constant, and derives (or checks) the gain.

use crate::dsp::transform::MIN_FRAME_SIZE;
use crate::dsp::window::{overlap_energy, Windower};
use crate::error::ConfigError;
use log::warn;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FRAME_SIZE: usize = 256;
pub const DEFAULT_OVERLAP: usize = 4;
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;
// Smallest overlap for which Hann² sums to a constant.
pub const MIN_OVERLAP: usize = 4;
// Max relative ripple of the squared-window overlap sum.
const COLA_TOLERANCE: f32 = 1e-3;
// Max relative deviation of a configured gain from the derived one.
const GAIN_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frame (transform) size N.
    pub frame_size: usize,
    /// Frames covering each output sample; hop = N / overlap.
    pub overlap: usize,
    /// Informational, only used to report latency in seconds.
    pub sample_rate: f32,
    /// Overlap-add compensation. Derived from the window when absent.
    pub gain: Option<f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_size: DEFAULT_FRAME_SIZE,
            overlap: DEFAULT_OVERLAP,
            sample_rate: DEFAULT_SAMPLE_RATE,
            gain: None,
        }
    }
}

/// A validated configuration together with the window table it was checked against.
#[derive(Clone)]
pub struct ResolvedConfig {
    pub frame_size: usize,
    pub hop_size: usize,
    pub sample_rate: f32,
    pub gain: f32,
    pub window: Windower,
}

impl ResolvedConfig {
    /// An input sample reappears exactly one frame later.
    pub fn latency_samples(&self) -> usize {
        self.frame_size
    }
}

impl EngineConfig {
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame_size,
            ..Self::default()
        }
    }

    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = Some(gain);
        self
    }

    pub fn hop_size(&self) -> usize {
        self.frame_size / self.overlap.max(1)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<ResolvedConfig, ConfigError> {
        self.resolve().map_err(|e| {
            warn!("rejected engine config {:?}: {}", self, e);
            e
        })
    }

    fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let n = self.frame_size;
        if n == 0 || !n.is_power_of_two() {
            return Err(ConfigError::FrameSizeNotPowerOfTwo(n));
        }
        if self.overlap < MIN_OVERLAP || !self.overlap.is_power_of_two() {
            return Err(ConfigError::InvalidOverlap(self.overlap));
        }
        let min = MIN_FRAME_SIZE.max(self.overlap);
        if n < min {
            return Err(ConfigError::FrameSizeTooSmall { frame_size: n, min });
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }

        let hop_size = n / self.overlap;
        let window = Windower::hann(n);
        let energy = overlap_energy(window.coefficients(), hop_size);
        if energy.ripple > COLA_TOLERANCE {
            return Err(ConfigError::OverlapNotConstant {
                ripple: energy.ripple,
            });
        }

        let expected = 1.0 / energy.mean;
        let gain = match self.gain {
            Some(g) if (g - expected).abs() > GAIN_TOLERANCE * expected || !g.is_finite() => {
                return Err(ConfigError::GainMismatch {
                    configured: g,
                    expected,
                });
            }
            Some(g) => g,
            None => expected,
        };

        Ok(ResolvedConfig {
            frame_size: n,
            hop_size,
            sample_rate: self.sample_rate,
            gain,
            window,
        })
    }
}
