//! Forward/inverse transform pair around `rustfft`.
//!
//! Scaling convention: the forward transform is unnormalized and the inverse
//! divides by N, so `inverse(forward(x)) == x`. Gain compensation for the
//! window overlap lives entirely in the overlap-add stage.
//!
//! The inverse is real-only: it rebuilds the upper half of the spectrum as the
//! conjugate mirror of bins `0..=N/2` before transforming, so edits that break
//! Hermitian symmetry (such as reversing the lower half) still produce a real
//! frame.

use crate::dsp::utils::MAG_FLOOR;
use crate::error::ConfigError;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

// Smallest supported transform.
pub const MIN_FRAME_SIZE: usize = 4;

/// N complex bins plus a magnitude/phase view of the same data.
///
/// The two views are synchronized explicitly with [`Spectrum::to_polar`] and
/// [`Spectrum::from_polar`]; the engine does this around polar-domain edits.
///
/// Only the engine creates spectra, so an edit hook can change bin values but
/// never the bin count:
///
/// ```compile_fail
/// use stft_engine::{EngineConfig, Spectrum, StftEngine};
///
/// let resize = |s: &mut Spectrum| *s = Spectrum::new(512);
/// let _ = StftEngine::with_hook(&EngineConfig::default(), Box::new(resize));
/// ```
pub struct Spectrum {
    bins: Vec<Complex<f32>>,
    magnitude: Vec<f32>,
    phase: Vec<f32>,
}

impl Spectrum {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            bins: vec![Complex::new(0.0, 0.0); size],
            magnitude: vec![0.0; size],
            phase: vec![0.0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bins(&self) -> &[Complex<f32>] {
        &self.bins
    }

    pub fn bins_mut(&mut self) -> &mut [Complex<f32>] {
        &mut self.bins
    }

    pub fn magnitude(&self) -> &[f32] {
        &self.magnitude
    }

    pub fn magnitude_mut(&mut self) -> &mut [f32] {
        &mut self.magnitude
    }

    pub fn phase(&self) -> &[f32] {
        &self.phase
    }

    pub fn phase_mut(&mut self) -> &mut [f32] {
        &mut self.phase
    }

    /// Both polar arrays at once, for edits that move magnitude and phase together.
    pub fn polar_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.magnitude, &mut self.phase)
    }

    /// Decomposes every bin into modulus and argument. Zero bins get phase 0.
    pub fn to_polar(&mut self) {
        for ((bin, mag), phase) in self
            .bins
            .iter()
            .zip(self.magnitude.iter_mut())
            .zip(self.phase.iter_mut())
        {
            let m = bin.norm();
            *mag = m;
            *phase = if m > MAG_FLOOR { bin.arg() } else { 0.0 };
        }
    }

    /// Rebuilds the complex bins from magnitude and phase.
    pub fn from_polar(&mut self) {
        for ((bin, &mag), &phase) in self
            .bins
            .iter_mut()
            .zip(self.magnitude.iter())
            .zip(self.phase.iter())
        {
            let (sin, cos) = phase.sin_cos();
            *bin = Complex::new(mag * cos, mag * sin);
        }
    }

    /// Zeroes every bin that is not finite. Returns how many were replaced.
    pub fn sanitize(&mut self) -> usize {
        let mut replaced = 0;
        for bin in self.bins.iter_mut() {
            if !(bin.re.is_finite() && bin.im.is_finite()) {
                *bin = Complex::new(0.0, 0.0);
                replaced += 1;
            }
        }
        replaced
    }

    pub fn clear(&mut self) {
        self.bins.fill(Complex::new(0.0, 0.0));
        self.clear_polar();
    }

    /// Zeroes the magnitude/phase view, leaving the complex bins alone.
    pub(crate) fn clear_polar(&mut self) {
        self.magnitude.fill(0.0);
        self.phase.fill(0.0);
    }
}

pub struct SpectralTransform {
    size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl SpectralTransform {
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        let mut planner = FftPlanner::<f32>::new();
        Self::with_planner(&mut planner, size)
    }

    /// Plans through a shared planner so channels of the same size reuse one plan.
    pub fn with_planner(planner: &mut FftPlanner<f32>, size: usize) -> Result<Self, ConfigError> {
        if size == 0 || !size.is_power_of_two() {
            return Err(ConfigError::FrameSizeNotPowerOfTwo(size));
        }
        if size < MIN_FRAME_SIZE {
            return Err(ConfigError::FrameSizeTooSmall {
                frame_size: size,
                min: MIN_FRAME_SIZE,
            });
        }

        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Ok(Self {
            size,
            forward,
            inverse,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Real-input forward transform of `frame` into all N bins of `spectrum`.
    pub fn forward(&mut self, frame: &[f32], spectrum: &mut Spectrum) {
        debug_assert_eq!(frame.len(), self.size);
        debug_assert_eq!(spectrum.len(), self.size);
        for (bin, &x) in spectrum.bins.iter_mut().zip(frame.iter()) {
            *bin = Complex::new(x, 0.0);
        }
        self.forward
            .process_with_scratch(&mut spectrum.bins, &mut self.scratch);
    }

    /// Real-only inverse transform of `spectrum` into `frame`, scaled by 1/N.
    pub fn inverse(&mut self, spectrum: &Spectrum, frame: &mut [f32]) {
        let n = self.size;
        let nyq = n / 2;
        debug_assert_eq!(frame.len(), n);
        debug_assert_eq!(spectrum.len(), n);

        self.buffer[..=nyq].copy_from_slice(&spectrum.bins[..=nyq]);
        self.buffer[0].im = 0.0;
        self.buffer[nyq].im = 0.0;
        for k in 1..nyq {
            self.buffer[n - k] = self.buffer[k].conj();
        }

        self.inverse
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let norm = 1.0 / n as f32;
        for (out, bin) in frame.iter_mut().zip(self.buffer.iter()) {
            *out = bin.re * norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(matches!(
            SpectralTransform::new(100),
            Err(ConfigError::FrameSizeNotPowerOfTwo(100))
        ));
        assert!(matches!(
            SpectralTransform::new(0),
            Err(ConfigError::FrameSizeNotPowerOfTwo(0))
        ));
        assert!(matches!(
            SpectralTransform::new(2),
            Err(ConfigError::FrameSizeTooSmall { .. })
        ));
    }

    #[test]
    fn test_roundtrip_unity() {
        let n = 256;
        let mut t = SpectralTransform::new(n).unwrap();
        let mut spec = Spectrum::new(n);
        let input: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * 5.0 * i as f32 / n as f32).sin() + 0.25 * ((i % 7) as f32 - 3.0))
            .collect();
        let mut out = vec![0.0; n];
        t.forward(&input, &mut spec);
        t.inverse(&spec, &mut out);
        for (a, b) in input.iter().zip(out.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_polar_roundtrip_unity() {
        let n = 64;
        let mut t = SpectralTransform::new(n).unwrap();
        let mut spec = Spectrum::new(n);
        let input: Vec<f32> = (0..n).map(|i| ((i * 13 % 11) as f32 - 5.0) * 0.1).collect();
        let mut out = vec![0.0; n];
        t.forward(&input, &mut spec);
        spec.to_polar();
        spec.from_polar();
        t.inverse(&spec, &mut out);
        for (a, b) in input.iter().zip(out.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_bin_centered_sine_magnitude() {
        let n = 128;
        let mut t = SpectralTransform::new(n).unwrap();
        let mut spec = Spectrum::new(n);
        let input: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * 8.0 * i as f32 / n as f32).cos())
            .collect();
        t.forward(&input, &mut spec);
        spec.to_polar();
        // Unnormalized forward: a unit cosine puts N/2 in bin k and its mirror.
        assert!((spec.magnitude()[8] - n as f32 / 2.0).abs() < 1e-2);
        assert!((spec.magnitude()[n - 8] - n as f32 / 2.0).abs() < 1e-2);
        assert!(spec.magnitude()[3] < 1e-3);
    }

    #[test]
    fn test_zero_frame_has_finite_polar_form() {
        let n = 32;
        let mut t = SpectralTransform::new(n).unwrap();
        let mut spec = Spectrum::new(n);
        t.forward(&vec![0.0; n], &mut spec);
        spec.to_polar();
        assert!(spec.magnitude().iter().all(|&m| m == 0.0));
        assert!(spec.phase().iter().all(|&p| p == 0.0));
        spec.from_polar();
        assert_eq!(spec.sanitize(), 0);
    }

    #[test]
    fn test_sanitize_contains_nan_to_its_bin() {
        let n = 16;
        let mut t = SpectralTransform::new(n).unwrap();
        let mut spec = Spectrum::new(n);
        let mut input = vec![0.0; n];
        input[0] = 1.0;
        t.forward(&input, &mut spec);
        spec.bins_mut()[3] = Complex::new(f32::NAN, 0.0);
        assert_eq!(spec.sanitize(), 1);
        assert_eq!(spec.bins()[3], Complex::new(0.0, 0.0));
        assert!((spec.bins()[2].re - 1.0).abs() < 1e-6);

        let mut out = vec![0.0; n];
        t.inverse(&spec, &mut out);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_inverse_is_real_for_asymmetric_edit() {
        let n = 32;
        let mut t = SpectralTransform::new(n).unwrap();
        let mut spec = Spectrum::new(n);
        // Energy only in the upper half is ignored; lower half defines the frame.
        spec.bins_mut()[n - 2] = Complex::new(5.0, 5.0);
        spec.bins_mut()[2] = Complex::new(1.0, 0.0);
        let mut out = vec![0.0; n];
        t.inverse(&spec, &mut out);
        for (i, &v) in out.iter().enumerate() {
            let expected = 2.0 * (2.0 * PI * 2.0 * i as f32 / n as f32).cos() / n as f32;
            assert!((v - expected).abs() < 1e-5);
        }
    }
}
