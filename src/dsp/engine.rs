//! Per-channel STFT analysis / edit / resynthesis engine.
//!
//! # Signal path
//! Every incoming sample is written to the input ring. Every `hop` samples a
//! frame fires: the last N input samples are windowed, transformed, passed to
//! the spectral edit hook, transformed back, windowed again and overlap-added
//! into the output ring. The output ring is read one sample per input sample.
//!
//! # Latency
//! A frame fired after input sample `t` deposits its sample `i` (input sample
//! `t + 1 - N + i`) into the output slot read at time `t + 1 + i`. Every input
//! sample therefore reappears exactly N samples later, independent of the hop.
//!
//! # Real-time contract
//! `process_sample` does no allocation, locking, or I/O, and its cost does not
//! depend on the signal: O(1) per sample plus one O(N log N) frame every `hop`
//! samples. All buffers are sized at construction.

use crate::config::{EngineConfig, ResolvedConfig};
use crate::dsp::frame_extractor::FrameExtractor;
use crate::dsp::overlap_add::OverlapAdder;
use crate::dsp::ring_buffer::RingBuffer;
use crate::dsp::spectral_edit::{Passthrough, SpectralDomain, SpectralEdit};
use crate::dsp::transform::{SpectralTransform, Spectrum};
use crate::dsp::utils::{flush_denormal, sanitize_sample};
use crate::dsp::window::Windower;
use crate::error::ConfigError;
use crate::stft_log;
use log::debug;
use rustfft::FftPlanner;

pub struct StftEngine {
    frame_size: usize,
    hop_size: usize,
    sample_rate: f32,

    input: RingBuffer,
    output: RingBuffer,
    hop_counter: usize,
    frames_fired: u64,

    extractor: FrameExtractor,
    window: Windower,
    transform: SpectralTransform,
    overlap_adder: OverlapAdder,
    hook: Box<dyn SpectralEdit>,

    // Scratch reused by every frame
    frame: Vec<f32>,
    spectrum: Spectrum,
    // Magnitude/phase still hold the last polar-domain frame
    polar_stale: bool,
}

impl StftEngine {
    /// Builds an engine with the identity edit.
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::with_hook(config, Box::new(Passthrough))
    }

    pub fn with_hook(
        config: &EngineConfig,
        hook: Box<dyn SpectralEdit>,
    ) -> Result<Self, ConfigError> {
        let resolved = config.validate()?;
        let mut planner = FftPlanner::<f32>::new();
        Self::from_resolved(&resolved, &mut planner, hook)
    }

    /// Builds from an already validated config, sharing its window table and the planner's plans.
    pub(crate) fn from_resolved(
        resolved: &ResolvedConfig,
        planner: &mut FftPlanner<f32>,
        hook: Box<dyn SpectralEdit>,
    ) -> Result<Self, ConfigError> {
        let n = resolved.frame_size;
        check_hook(hook.as_ref(), n)?;
        let transform = SpectralTransform::with_planner(planner, n)?;

        debug!(
            "STFT engine ready: frame={} hop={} gain={:.6} latency={} samples",
            n, resolved.hop_size, resolved.gain, n
        );

        Ok(Self {
            frame_size: n,
            hop_size: resolved.hop_size,
            sample_rate: resolved.sample_rate,
            input: RingBuffer::new(n),
            output: RingBuffer::new(n),
            hop_counter: 0,
            frames_fired: 0,
            extractor: FrameExtractor::new(n),
            window: resolved.window.clone(),
            transform,
            overlap_adder: OverlapAdder::new(n, resolved.hop_size, resolved.gain),
            hook,
            frame: vec![0.0; n],
            spectrum: Spectrum::new(n),
            polar_stale: false,
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn gain(&self) -> f32 {
        self.overlap_adder.gain()
    }

    /// End-to-end delay in samples between an input sample and its reconstruction.
    pub fn latency_samples(&self) -> usize {
        self.frame_size
    }

    pub fn latency_seconds(&self) -> f32 {
        self.frame_size as f32 / self.sample_rate
    }

    /// Number of frame-fire events since construction or the last reset.
    pub fn frames_fired(&self) -> u64 {
        self.frames_fired
    }

    pub fn window(&self) -> &Windower {
        &self.window
    }

    /// Replaces the spectral edit. Not real-time safe: the old hook is dropped here.
    pub fn set_hook(&mut self, hook: Box<dyn SpectralEdit>) -> Result<(), ConfigError> {
        check_hook(hook.as_ref(), self.frame_size)?;
        debug!("spectral edit replaced (domain {:?})", hook.domain());
        self.hook = hook;
        Ok(())
    }

    /// Returns to the initial state: silent rings, cursors and hop counter at 0.
    pub fn reset(&mut self) {
        self.input.clear();
        self.output.clear();
        self.hop_counter = 0;
        self.frames_fired = 0;
        self.frame.fill(0.0);
        self.spectrum.clear();
        self.polar_stale = false;
    }

    /// Consumes one input sample and returns one output sample.
    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        let out = flush_denormal(self.output.read());
        self.input.write(sanitize_sample(input));

        self.hop_counter += 1;
        if self.hop_counter == self.hop_size {
            self.hop_counter = 0;
            self.fire_frame();
        }
        out
    }

    /// Processes a host block in place.
    pub fn process_block(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    fn fire_frame(&mut self) {
        // Analysis
        let playhead = self.input.write_cursor();
        self.extractor.extract(&self.input, playhead, &mut self.frame);
        self.window.apply(&mut self.frame);
        self.transform.forward(&self.frame, &mut self.spectrum);

        // Edit
        match self.hook.domain() {
            SpectralDomain::Polar => {
                self.spectrum.to_polar();
                self.hook.edit(&mut self.spectrum);
                self.spectrum.from_polar();
                self.polar_stale = true;
            }
            SpectralDomain::Complex => {
                if self.polar_stale {
                    self.spectrum.clear_polar();
                    self.polar_stale = false;
                }
                self.hook.edit(&mut self.spectrum);
            }
        }
        // Spectra are only constructed inside the crate, so hooks cannot resize them.
        debug_assert_eq!(self.spectrum.len(), self.frame_size);
        let replaced = self.spectrum.sanitize();
        if replaced > 0 {
            stft_log!(
                "frame {}: zeroed {} non-finite bins",
                self.frames_fired,
                replaced
            );
        }

        // Synthesis
        self.transform.inverse(&self.spectrum, &mut self.frame);
        self.window.apply(&mut self.frame);
        self.output.advance_write(self.hop_size);
        debug_assert_eq!(self.output.write_cursor(), self.output.read_cursor());
        self.overlap_adder.deposit(&mut self.output, &self.frame);

        self.frames_fired += 1;
    }
}

fn check_hook(hook: &dyn SpectralEdit, frame_size: usize) -> Result<(), ConfigError> {
    match hook.expected_bins() {
        Some(expected) if expected != frame_size => Err(ConfigError::HookSizeMismatch {
            expected,
            actual: frame_size,
        }),
        _ => Ok(()),
    }
}
