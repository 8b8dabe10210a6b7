//! Overlap-add resynthesis into the output ring.
//!
//! The newest synthesis frame starts at the output write cursor. Its first
//! `N - hop` samples land on slots that earlier frames already touched and are
//! summed in; its last `hop` samples land on slots no earlier frame reaches, so
//! they overwrite whatever stale value the slot held from the previous lap.

use crate::dsp::ring_buffer::RingBuffer;

pub struct OverlapAdder {
    frame_size: usize,
    hop_size: usize,
    gain: f32,
}

impl OverlapAdder {
    pub fn new(frame_size: usize, hop_size: usize, gain: f32) -> Self {
        assert!(
            hop_size > 0 && hop_size <= frame_size,
            "hop size must be in 1..=frame_size"
        );
        Self {
            frame_size,
            hop_size,
            gain,
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Index of the first sample that overwrites instead of accumulating.
    #[inline]
    pub fn boundary(&self) -> usize {
        self.frame_size - self.hop_size
    }

    /// Scatters `frame * gain` into `output` starting at its write cursor.
    pub fn deposit(&self, output: &mut RingBuffer, frame: &[f32]) {
        debug_assert_eq!(frame.len(), self.frame_size);
        debug_assert_eq!(output.capacity(), self.frame_size);
        let boundary = self.boundary();
        for (i, &x) in frame.iter().enumerate() {
            let v = x * self.gain;
            if i < boundary {
                output.accumulate_add(i, v);
            } else {
                output.store(i, v);
            }
        }
    }
}
