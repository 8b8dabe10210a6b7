pub mod engine;
pub mod frame_extractor;
pub mod overlap_add;
pub mod ring_buffer;
pub mod spectral_edit;
pub mod transform;
pub mod utils;
pub mod window;

pub use engine::StftEngine;
pub use frame_extractor::FrameExtractor;
pub use overlap_add::OverlapAdder;
pub use ring_buffer::RingBuffer;
pub use spectral_edit::{Passthrough, ReverseBins, SpectralDomain, SpectralEdit};
pub use transform::{SpectralTransform, Spectrum};
pub use window::{make_hann_window, Windower};

use crate::config::EngineConfig;
use crate::error::ConfigError;
use log::info;
use rustfft::FftPlanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Left,
    Right,
}

impl TryFrom<usize> for Channel {
    type Error = usize;

    /// Maps a host channel index; anything past the stereo pair is returned as the error.
    fn try_from(index: usize) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Channel::Left),
            1 => Ok(Channel::Right),
            other => Err(other),
        }
    }
}

/// Two independent channel engines sharing one window table and one set of FFT plans.
///
/// The channels share no mutable state; [`StereoProcessor::split_mut`] hands
/// them out separately so they can run on different threads.
pub struct StereoProcessor {
    left: StftEngine,
    right: StftEngine,
}

impl StereoProcessor {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::with_hooks(config, |_| Box::new(Passthrough) as Box<dyn SpectralEdit>)
    }

    /// Builds both channels, asking `make_hook` for one hook per channel.
    pub fn with_hooks<F>(config: &EngineConfig, mut make_hook: F) -> Result<Self, ConfigError>
    where
        F: FnMut(Channel) -> Box<dyn SpectralEdit>,
    {
        let resolved = config.validate()?;
        let mut planner = FftPlanner::<f32>::new();
        let left = StftEngine::from_resolved(&resolved, &mut planner, make_hook(Channel::Left))?;
        let right =
            StftEngine::from_resolved(&resolved, &mut planner, make_hook(Channel::Right))?;

        info!(
            "stereo STFT processor: frame={} hop={} latency={} samples ({:.2} ms at {} Hz)",
            resolved.frame_size,
            resolved.hop_size,
            left.latency_samples(),
            left.latency_seconds() * 1000.0,
            resolved.sample_rate
        );

        Ok(Self { left, right })
    }

    pub fn latency_samples(&self) -> usize {
        self.left.latency_samples()
    }

    pub fn channel(&self, channel: Channel) -> &StftEngine {
        match channel {
            Channel::Left => &self.left,
            Channel::Right => &self.right,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut StftEngine {
        match channel {
            Channel::Left => &mut self.left,
            Channel::Right => &mut self.right,
        }
    }

    pub fn split_mut(&mut self) -> (&mut StftEngine, &mut StftEngine) {
        (&mut self.left, &mut self.right)
    }

    #[inline]
    pub fn process_sample(&mut self, channel: Channel, input: f32) -> f32 {
        self.channel_mut(channel).process_sample(input)
    }

    #[inline]
    pub fn process_frame(&mut self, input_l: f32, input_r: f32) -> (f32, f32) {
        (
            self.left.process_sample(input_l),
            self.right.process_sample(input_r),
        )
    }

    /// Processes one host block per channel in place.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        #[cfg(feature = "assert_process_allocs")]
        {
            assert_no_alloc::assert_no_alloc(|| self.process_block_inner(left, right));
        }
        #[cfg(not(feature = "assert_process_allocs"))]
        {
            self.process_block_inner(left, right);
        }
    }

    fn process_block_inner(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.left.process_block(left);
        self.right.process_block(right);
    }

    /// Mono bus layout: only the left engine runs.
    pub fn process_block_mono(&mut self, mono: &mut [f32]) {
        #[cfg(feature = "assert_process_allocs")]
        {
            assert_no_alloc::assert_no_alloc(|| self.left.process_block(mono));
        }
        #[cfg(not(feature = "assert_process_allocs"))]
        {
            self.left.process_block(mono);
        }
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_from_index() {
        assert_eq!(Channel::try_from(0), Ok(Channel::Left));
        assert_eq!(Channel::try_from(1), Ok(Channel::Right));
        assert_eq!(Channel::try_from(2), Err(2));
    }

    #[test]
    fn test_channels_share_window_table() {
        let stereo = StereoProcessor::new(&EngineConfig::default()).unwrap();
        assert!(stereo
            .channel(Channel::Left)
            .window()
            .shares_table_with(stereo.channel(Channel::Right).window()));
    }

    #[test]
    fn test_channels_are_independent() {
        let mut stereo = StereoProcessor::new(&EngineConfig::default()).unwrap();
        let n = stereo.latency_samples();
        let len = 4 * n;
        let mut left = vec![0.0f32; len];
        let mut right = vec![0.0f32; len];
        left[3] = 1.0;
        right[40] = -0.5;
        stereo.process_block(&mut left, &mut right);

        for t in 0..len {
            let exp_l = if t == n + 3 { 1.0 } else { 0.0 };
            let exp_r = if t == n + 40 { -0.5 } else { 0.0 };
            assert!((left[t] - exp_l).abs() < 1e-4, "left t={t}");
            assert!((right[t] - exp_r).abs() < 1e-4, "right t={t}");
        }
    }

    #[test]
    fn test_per_sample_entry_point_matches_block() {
        let mut a = StereoProcessor::new(&EngineConfig::default()).unwrap();
        let mut b = StereoProcessor::new(&EngineConfig::default()).unwrap();
        let input: Vec<f32> = (0..900).map(|i| (i as f32 * 0.03).sin()).collect();

        let mut expected_l = Vec::new();
        let mut expected_r = Vec::new();
        for &x in &input {
            expected_l.push(a.process_sample(Channel::Left, x));
            expected_r.push(a.process_sample(Channel::Right, -x));
        }

        let mut got = Vec::new();
        for &x in &input {
            got.push(b.process_frame(x, -x));
        }
        for (i, (l, r)) in got.into_iter().enumerate() {
            assert_eq!(l, expected_l[i]);
            assert_eq!(r, expected_r[i]);
        }
    }

    #[test]
    fn test_hooks_are_per_channel() {
        let mut stereo = StereoProcessor::with_hooks(&EngineConfig::default(), |ch| match ch {
            Channel::Left => Box::new(Passthrough) as Box<dyn SpectralEdit>,
            Channel::Right => Box::new(|s: &mut Spectrum| s.magnitude_mut().fill(0.0)),
        })
        .unwrap();
        let n = stereo.latency_samples();
        let input: Vec<f32> = (0..4 * n).map(|i| (i as f32 * 0.2).sin()).collect();
        let mut left = input.clone();
        let mut right = input.clone();
        stereo.process_block(&mut left, &mut right);
        assert!(right.iter().all(|&y| y == 0.0));
        assert!(left[2 * n..].iter().any(|&y| y.abs() > 0.1));
    }

    #[test]
    fn test_split_mut_threads() {
        let mut stereo = StereoProcessor::new(&EngineConfig::default()).unwrap();
        let (left, right) = stereo.split_mut();
        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..1000 {
                    left.process_sample(0.25);
                }
            });
            s.spawn(|| {
                for _ in 0..500 {
                    right.process_sample(-0.25);
                }
            });
        });
        assert_eq!(stereo.channel(Channel::Left).frames_fired(), 1000 / 64);
        assert_eq!(stereo.channel(Channel::Right).frames_fired(), 500 / 64);
    }

    #[test]
    fn test_mono_block_leaves_right_idle() {
        let mut stereo = StereoProcessor::new(&EngineConfig::default()).unwrap();
        let mut mono = vec![0.5f32; 640];
        stereo.process_block_mono(&mut mono);
        assert_eq!(stereo.channel(Channel::Left).frames_fired(), 10);
        assert_eq!(stereo.channel(Channel::Right).frames_fired(), 0);
        stereo.reset();
        assert_eq!(stereo.channel(Channel::Left).frames_fired(), 0);
    }
}
