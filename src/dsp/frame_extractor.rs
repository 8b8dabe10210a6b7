//! Analysis frame extraction.
//!
//! The input ring stores samples in physical slot order; the transform needs
//! them in time order. The extractor rotates the ring so index 0 is the oldest
//! sample, using the input write cursor (the slot about to be overwritten) as
//! the playhead.

use crate::dsp::ring_buffer::RingBuffer;

pub struct FrameExtractor {
    frame_size: usize,
}

impl FrameExtractor {
    pub fn new(frame_size: usize) -> Self {
        Self { frame_size }
    }

    /// Fills `frame` with the ring contents starting at `playhead` (the oldest sample).
    #[inline]
    pub fn extract(&self, input: &RingBuffer, playhead: usize, frame: &mut [f32]) {
        debug_assert_eq!(input.capacity(), self.frame_size);
        input.copy_linearized(playhead, frame);
    }
}
