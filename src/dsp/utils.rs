// Magnitudes below this are treated as zero when decomposing a bin into polar form.
pub const MAG_FLOOR: f32 = 1e-20;
// Output samples below this are flushed to zero (keeps denormals off the audio path).
pub const DENORMAL_FLOOR: f32 = 1e-30;
// Floor used when converting levels to dB.
pub const DB_EPS: f32 = 1e-12;

#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < DENORMAL_FLOOR {
        0.0
    } else {
        x
    }
}

/// Replaces NaN and infinities with silence.
#[inline]
pub fn sanitize_sample(x: f32) -> f32 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

pub fn lin_to_db(x: f32) -> f32 {
    20.0 * x.max(DB_EPS).log10()
}

pub fn frame_rms(x: &[f32]) -> f32 {
    let mut s = 0.0f32;
    for &v in x {
        s += v * v;
    }
    (s / (x.len().max(1) as f32)).sqrt()
}
