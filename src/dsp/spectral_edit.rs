//! Spectral edit hooks.
//!
//! A hook runs once per frame-fire event, between the forward and inverse
//! transforms, on the channel's audio thread. It must not allocate, lock, or
//! block. The spectrum it receives always holds exactly N bins; hooks built for
//! a specific frame size declare it through [`SpectralEdit::expected_bins`] so a
//! mismatch is rejected when the engine is built instead of at run time.

use crate::dsp::transform::Spectrum;

/// Which view of the spectrum a hook edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralDomain {
    /// Magnitude/phase arrays. The engine decomposes before and recomposes after the edit.
    Polar,
    /// Complex bins, edited directly with no polar conversion. The magnitude/phase
    /// arrays are not computed for these hooks: they read as zeros unless the hook
    /// writes them itself.
    Complex,
}

pub trait SpectralEdit: Send {
    fn domain(&self) -> SpectralDomain {
        SpectralDomain::Polar
    }

    /// Bin count this hook was built for, if it depends on one.
    fn expected_bins(&self) -> Option<usize> {
        None
    }

    fn edit(&mut self, spectrum: &mut Spectrum);
}

/// Identity edit. Works on complex bins so no trig is spent on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl SpectralEdit for Passthrough {
    fn domain(&self) -> SpectralDomain {
        SpectralDomain::Complex
    }

    #[inline]
    fn edit(&mut self, _spectrum: &mut Spectrum) {}
}

/// Mirrors the lower half of the spectrum: low frequencies swap with high ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReverseBins;

impl SpectralEdit for ReverseBins {
    fn edit(&mut self, spectrum: &mut Spectrum) {
        let half = spectrum.len() / 2;
        let (magnitude, phase) = spectrum.polar_mut();
        magnitude[..half].reverse();
        phase[..half].reverse();
    }
}

impl<F> SpectralEdit for F
where
    F: FnMut(&mut Spectrum) + Send,
{
    fn edit(&mut self, spectrum: &mut Spectrum) {
        self(spectrum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_leaves_bins() {
        let mut spec = Spectrum::new(8);
        spec.magnitude_mut()[1] = 3.0;
        let mut hook = Passthrough;
        assert_eq!(hook.domain(), SpectralDomain::Complex);
        hook.edit(&mut spec);
        assert_eq!(spec.magnitude()[1], 3.0);
    }

    #[test]
    fn test_reverse_bins_lower_half_only() {
        let mut spec = Spectrum::new(8);
        for i in 0..8 {
            spec.magnitude_mut()[i] = i as f32;
            spec.phase_mut()[i] = -(i as f32);
        }
        let mut hook = ReverseBins;
        assert_eq!(hook.domain(), SpectralDomain::Polar);
        hook.edit(&mut spec);
        assert_eq!(spec.magnitude(), &[3.0, 2.0, 1.0, 0.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(spec.phase(), &[-3.0, -2.0, -1.0, 0.0, -4.0, -5.0, -6.0, -7.0]);
    }

    #[test]
    fn test_closure_hook() {
        let mut calls = 0usize;
        {
            let mut hook = |s: &mut Spectrum| {
                s.magnitude_mut()[0] = 1.0;
                calls += 1;
            };
            let mut spec = Spectrum::new(4);
            SpectralEdit::edit(&mut hook, &mut spec);
            SpectralEdit::edit(&mut hook, &mut spec);
            assert_eq!(spec.magnitude()[0], 1.0);
            assert_eq!(hook.expected_bins(), None);
        }
        assert_eq!(calls, 2);
    }
}
