//! Fixed-capacity circular sample buffer with independent read and write cursors.
//!
//! Both cursors live in `0..capacity` and advance by one (mod capacity). The
//! buffer never allocates after construction, so every operation is safe on
//! the audio thread.

pub struct RingBuffer {
    data: Vec<f32>,
    write_pos: usize,
    read_pos: usize,
}

impl RingBuffer {
    /// Creates a zero-filled ring with both cursors at 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be > 0");
        Self {
            data: vec![0.0; capacity],
            write_pos: 0,
            read_pos: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn write_cursor(&self) -> usize {
        self.write_pos
    }

    #[inline]
    pub fn read_cursor(&self) -> usize {
        self.read_pos
    }

    #[inline]
    fn wrap(&self, pos: usize) -> usize {
        pos % self.data.len()
    }

    /// Stores `sample` at the write cursor, then advances the write cursor.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.data[self.write_pos] = sample;
        self.write_pos = self.wrap(self.write_pos + 1);
    }

    /// Returns the sample at the read cursor, then advances the read cursor.
    #[inline]
    pub fn read(&mut self) -> f32 {
        let out = self.data[self.read_pos];
        self.read_pos = self.wrap(self.read_pos + 1);
        out
    }

    /// Moves the write cursor forward without touching the stored samples.
    #[inline]
    pub fn advance_write(&mut self, n: usize) {
        self.write_pos = self.wrap(self.write_pos + n);
    }

    /// Adds `value` to the slot `offset` samples past the write cursor.
    #[inline]
    pub fn accumulate_add(&mut self, offset: usize, value: f32) {
        let idx = self.wrap(self.write_pos + offset);
        self.data[idx] += value;
    }

    /// Overwrites the slot `offset` samples past the write cursor.
    #[inline]
    pub fn store(&mut self, offset: usize, value: f32) {
        let idx = self.wrap(self.write_pos + offset);
        self.data[idx] = value;
    }

    /// Copies the buffer into `out` in chronological order starting at `start_cursor`.
    ///
    /// `out` must hold exactly `capacity()` samples. When `start_cursor` is the
    /// write cursor, `out[0]` is the oldest sample and `out[capacity - 1]` the newest.
    pub fn copy_linearized(&self, start_cursor: usize, out: &mut [f32]) {
        let n = self.data.len();
        debug_assert_eq!(out.len(), n, "linearized frame must match ring capacity");
        let start = self.wrap(start_cursor);
        let tail = n - start;
        out[..tail].copy_from_slice(&self.data[start..]);
        out[tail..].copy_from_slice(&self.data[..start]);
    }

    /// Allocating variant of [`RingBuffer::copy_linearized`]. Not for the audio thread.
    pub fn snapshot_linearized(&self, start_cursor: usize) -> Vec<f32> {
        let mut out = vec![0.0; self.data.len()];
        self.copy_linearized(start_cursor, &mut out);
        out
    }

    /// Zeroes the contents and rewinds both cursors.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.write_pos = 0;
        self.read_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::RingBuffer;

    #[test]
    fn test_cursors_wrap() {
        let mut rb = RingBuffer::new(4);
        for i in 0..6 {
            rb.write(i as f32);
        }
        assert_eq!(rb.write_cursor(), 2);
        // Slots now hold [4, 5, 2, 3]
        let mut out = Vec::new();
        for _ in 0..5 {
            out.push(rb.read());
        }
        assert_eq!(out, vec![4.0, 5.0, 2.0, 3.0, 4.0]);
        assert_eq!(rb.read_cursor(), 1);
    }

    #[test]
    fn test_linearized_wraparound_all_sizes_and_starts() {
        for log2 in 2..=10 {
            let n = 1usize << log2;
            for start in 0..n {
                let mut rb = RingBuffer::new(n);
                for _ in 0..start {
                    rb.write(-1.0);
                }
                let total = 10 * n;
                for i in 0..total {
                    rb.write(i as f32);
                }
                let frame = rb.snapshot_linearized(rb.write_cursor());
                for (j, &v) in frame.iter().enumerate() {
                    assert_eq!(v, (total - n + j) as f32, "n={n} start={start} j={j}");
                }
            }
        }
    }

    #[test]
    fn test_accumulate_and_store_relative_to_write_cursor() {
        let mut rb = RingBuffer::new(8);
        rb.advance_write(6);
        rb.accumulate_add(0, 1.0);
        rb.accumulate_add(0, 0.5);
        rb.accumulate_add(3, 2.0); // wraps to slot 1
        rb.store(2, 7.0); // wraps to slot 0
        rb.store(2, 9.0);
        let raw = rb.snapshot_linearized(0);
        assert_eq!(raw, vec![9.0, 2.0, 0.0, 0.0, 0.0, 0.0, 1.5, 0.0]);
    }

    #[test]
    fn test_clear() {
        let mut rb = RingBuffer::new(4);
        rb.write(1.0);
        rb.read();
        rb.clear();
        assert_eq!(rb.write_cursor(), 0);
        assert_eq!(rb.read_cursor(), 0);
        assert!(rb.snapshot_linearized(0).iter().all(|&v| v == 0.0));
    }
}
