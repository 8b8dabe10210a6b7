//! Hann windowing for analysis and synthesis.
//!
//! The same coefficient table is applied twice per frame (before the forward
//! transform and after the inverse), so the overlap-add sees `w[i]²`. For a
//! periodic Hann window at hop `N / R` with `R >= 3` the sum
//! `Σ_k w[j + k·hop]²` is the constant `3R / 8`, which is what the overlap-add
//! gain compensates (2/3 at `R = 4`).

use std::f32::consts::PI;
use std::sync::Arc;

/// Periodic Hann window of length `size`, coefficients in `[0, 1]`.
pub fn make_hann_window(size: usize) -> Vec<f32> {
    let n = size.max(1) as f32;
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / n).cos()))
        .collect()
}

/// Squared-window overlap sum measured over one hop period.
#[derive(Debug, Clone, Copy)]
pub struct OverlapEnergy {
    pub mean: f32,
    /// `(max - min) / max` over the hop period; 0 for a perfect constant overlap-add.
    pub ripple: f32,
}

/// Sums `window[j + k·hop]²` for every phase `j` in `0..hop`.
pub fn overlap_energy(window: &[f32], hop: usize) -> OverlapEnergy {
    let hop = hop.max(1);
    let mut min = f32::MAX;
    let mut max = 0.0f32;
    let mut total = 0.0f32;
    for j in 0..hop {
        let s: f32 = window.iter().skip(j).step_by(hop).map(|w| w * w).sum();
        min = min.min(s);
        max = max.max(s);
        total += s;
    }
    let ripple = if max > 0.0 { (max - min) / max } else { 1.0 };
    OverlapEnergy {
        mean: total / hop as f32,
        ripple,
    }
}

/// Applies a shared, read-only coefficient table to frames in place.
#[derive(Clone)]
pub struct Windower {
    coefficients: Arc<[f32]>,
}

impl Windower {
    pub fn hann(size: usize) -> Self {
        Self {
            coefficients: make_hann_window(size).into(),
        }
    }

    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    #[inline]
    pub fn apply(&self, frame: &mut [f32]) {
        debug_assert_eq!(frame.len(), self.coefficients.len());
        for (sample, &w) in frame.iter_mut().zip(self.coefficients.iter()) {
            *sample *= w;
        }
    }

    /// True when both windowers point at the same table.
    pub fn shares_table_with(&self, other: &Windower) -> bool {
        Arc::ptr_eq(&self.coefficients, &other.coefficients)
    }
}
