//! Real-time diagnostics for the STFT engine.
//!
//! `stft_log!` formats into a fixed-size entry and pushes it onto a lock-free
//! single-producer ring, so it can be called from the audio thread without
//! allocating. A non-audio thread drains the ring to a file. Without the
//! `debug` feature the macro compiles to nothing.

use std::fmt;

#[cfg(feature = "debug")]
pub mod logger {
    use std::cell::UnsafeCell;
    use std::fmt;
    use std::fs::OpenOptions;
    use std::io::{self, Write};
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::OnceLock;

    // Power of two; one slot stays empty to tell full from empty.
    const LOG_CAP: usize = 128;
    const LOG_MSG_MAX: usize = 256;

    /// One formatted message, truncated to `LOG_MSG_MAX` bytes on a char boundary.
    #[derive(Copy, Clone)]
    struct LogEntry {
        len: u16,
        bytes: [u8; LOG_MSG_MAX],
    }

    impl LogEntry {
        const EMPTY: LogEntry = LogEntry {
            len: 0,
            bytes: [0; LOG_MSG_MAX],
        };

        fn format(args: fmt::Arguments) -> Self {
            let mut entry = Self::EMPTY;
            let _ = fmt::write(&mut entry, args);
            entry
        }

        fn as_str(&self) -> &str {
            // Only whole chars are ever copied in.
            std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
        }
    }

    impl fmt::Write for LogEntry {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let len = self.len as usize;
            let avail = LOG_MSG_MAX - len;
            let mut n = s.len().min(avail);
            while !s.is_char_boundary(n) {
                n -= 1;
            }
            self.bytes[len..len + n].copy_from_slice(&s.as_bytes()[..n]);
            self.len = (len + n) as u16;
            Ok(())
        }
    }

    struct LogRing {
        head: AtomicUsize,
        tail: AtomicUsize,
        dropped: AtomicUsize,
        slots: Box<[UnsafeCell<LogEntry>]>,
    }

    // Single producer (audio thread) and single consumer (drain) coordinate through head/tail.
    unsafe impl Sync for LogRing {}

    impl LogRing {
        fn with_capacity(capacity: usize) -> Self {
            debug_assert!(capacity.is_power_of_two());
            Self {
                head: AtomicUsize::new(0),
                tail: AtomicUsize::new(0),
                dropped: AtomicUsize::new(0),
                slots: (0..capacity)
                    .map(|_| UnsafeCell::new(LogEntry::EMPTY))
                    .collect(),
            }
        }

        #[inline]
        fn mask(&self) -> usize {
            self.slots.len() - 1
        }

        fn push(&self, entry: &LogEntry) {
            let head = self.head.load(Ordering::Relaxed);
            let next = (head + 1) & self.mask();
            if next == self.tail.load(Ordering::Acquire) {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
            // The consumer never reads slot `head` until `head` is published below.
            unsafe {
                *self.slots[head].get() = *entry;
            }
            self.head.store(next, Ordering::Release);
        }

        fn pop(&self) -> Option<LogEntry> {
            let tail = self.tail.load(Ordering::Relaxed);
            if tail == self.head.load(Ordering::Acquire) {
                return None;
            }
            let entry = unsafe { *self.slots[tail].get() };
            self.tail.store((tail + 1) & self.mask(), Ordering::Release);
            Some(entry)
        }

        fn take_dropped(&self) -> usize {
            self.dropped.swap(0, Ordering::Relaxed)
        }

        fn drain_into<W: Write>(&self, out: &mut W) -> io::Result<DrainStats> {
            let mut stats = DrainStats::default();
            while let Some(entry) = self.pop() {
                if entry.len == 0 {
                    continue;
                }
                writeln!(out, "{}", entry.as_str())?;
                stats.written += 1;
            }
            stats.dropped = self.take_dropped();
            if stats.dropped > 0 {
                writeln!(out, "({} entries dropped, ring full)", stats.dropped)?;
            }
            Ok(stats)
        }
    }

    /// What one drain pass moved out of the ring.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct DrainStats {
        pub written: usize,
        pub dropped: usize,
    }

    static LOGGER: OnceLock<LogRing> = OnceLock::new();
    static LOG_ENABLED: AtomicBool = AtomicBool::new(false);

    /// Allocates the ring. Call once, off the audio thread, before processing starts.
    pub fn init_logger() {
        let _ = LOGGER.get_or_init(|| LogRing::with_capacity(LOG_CAP));
        LOG_ENABLED.store(true, Ordering::Relaxed);
    }

    pub fn log_args(args: fmt::Arguments) {
        if !LOG_ENABLED.load(Ordering::Relaxed) {
            return;
        }
        if let Some(ring) = LOGGER.get() {
            ring.push(&LogEntry::format(args));
        }
    }

    /// Appends every pending entry to `path`.
    pub fn drain_to_file(path: &Path) -> io::Result<DrainStats> {
        let Some(ring) = LOGGER.get() else {
            return Ok(DrainStats::default());
        };
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        ring.drain_into(&mut file)
    }

}

#[cfg(feature = "debug")]
#[doc(hidden)]
pub fn stft_log_inner(args: fmt::Arguments) {
    logger::log_args(args);
}

#[cfg(not(feature = "debug"))]
#[doc(hidden)]
pub fn stft_log_inner(_args: fmt::Arguments) {}

#[macro_export]
macro_rules! stft_log {
    ($($arg:tt)*) => {
        $crate::debug::stft_log_inner(format_args!($($arg)*))
    };
}
