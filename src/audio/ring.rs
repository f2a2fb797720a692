//! Delay ring: the fixed-capacity sample store behind delayed playback.
//!
//! Every frame ever written has a 64-bit absolute position ([`AbsPos`]); the
//! physical slot is `abs % capacity`, so a position stays addressable until
//! the writer laps it. Three parties touch the ring concurrently:
//!
//! - the audio callback appends at `write_head` and reads at `read_head`
//! - the censor worker mutates already-written spans via [`DelayRing::overwrite`]
//!
//! Head updates use release/acquire so an appended frame is visible to any
//! reader that observed the advanced `write_head`. Sample cells are relaxed
//! atomics: a playback read racing an overwrite may see a mix of original and
//! censored audio for one callback, which is inaudible next to the fade the
//! censor applies anyway.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use thiserror::Error;

/// Absolute sample position from stream start. Monotonic, never wraps in
/// practice (2^64 samples at 48kHz is twelve million years).
pub type AbsPos = u64;

/// Errors returned by windowed ring accesses.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    /// The span starts before `write_head - capacity`: already evicted.
    #[error("span at {abs_start} (len {len}) has been evicted from the ring window")]
    OutOfWindow { abs_start: AbsPos, len: usize },

    /// The span ends past `write_head`: not written yet.
    #[error("span at {abs_start} (len {len}) is ahead of the write head")]
    AheadOfWrite { abs_start: AbsPos, len: usize },
}

/// Multi-channel circular sample store indexed by absolute position.
///
/// Planar storage, one cell array per channel. `f32` samples are stored as
/// their bit patterns in `AtomicU32` so the accepted reader/mutator race
/// stays defined behavior.
pub struct DelayRing {
    channels: usize,
    capacity: usize,
    cells: Vec<Box<[AtomicU32]>>,
    write_head: AtomicU64,
    read_head: AtomicU64,
    stopped: AtomicBool,
}

impl DelayRing {
    /// Allocate a zero-filled ring of `capacity` frames per channel.
    pub fn new(channels: usize, capacity: usize) -> Self {
        assert!(channels > 0, "ring needs at least one channel");
        assert!(capacity > 0, "ring needs nonzero capacity");
        let cells = (0..channels)
            .map(|_| {
                (0..capacity)
                    .map(|_| AtomicU32::new(0.0f32.to_bits()))
                    .collect::<Vec<_>>()
                    .into_boxed_slice()
            })
            .collect();
        Self {
            channels,
            capacity,
            cells,
            write_head: AtomicU64::new(0),
            read_head: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Next absolute position to be written.
    pub fn write_head(&self) -> AbsPos {
        self.write_head.load(Ordering::Acquire)
    }

    /// Current playback cursor.
    pub fn read_head(&self) -> AbsPos {
        self.read_head.load(Ordering::Acquire)
    }

    /// Buffered frames: `write_head - read_head`.
    pub fn fill(&self) -> u64 {
        // Write head first: a racing append or read advance can only make
        // the result an underestimate, the safe direction for underrun
        // checks.
        let wh = self.write_head.load(Ordering::Acquire);
        let rh = self.read_head.load(Ordering::Acquire);
        wh.saturating_sub(rh)
    }

    /// Mark the ring stopped: subsequent `read_at` calls return silence.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Append interleaved frames at the write head. Audio thread only.
    ///
    /// Frames older than `write_head - capacity` after the append are
    /// evicted. `interleaved.len()` must be a multiple of the channel count.
    pub fn append(&self, interleaved: &[f32]) {
        debug_assert_eq!(interleaved.len() % self.channels, 0);
        let frames = interleaved.len() / self.channels;
        let base = self.write_head.load(Ordering::Relaxed);
        for f in 0..frames {
            let slot = ((base + f as u64) % self.capacity as u64) as usize;
            for ch in 0..self.channels {
                let sample = interleaved[f * self.channels + ch];
                self.cells[ch][slot].store(sample.to_bits(), Ordering::Relaxed);
            }
        }
        // Publish the samples: readers that acquire the new head see them.
        self.write_head
            .store(base + frames as u64, Ordering::Release);
    }

    /// Move the playback cursor. Audio thread only.
    pub fn set_read_head(&self, abs: AbsPos) {
        debug_assert!(abs >= self.read_head.load(Ordering::Relaxed));
        self.read_head.store(abs, Ordering::Release);
    }

    /// Read `out.len() / channels` interleaved frames starting at `abs`.
    ///
    /// On a stopped ring this fills `out` with silence instead of failing, so
    /// the callback stays total during shutdown.
    pub fn read_at(&self, abs: AbsPos, out: &mut [f32]) -> Result<(), RingError> {
        debug_assert_eq!(out.len() % self.channels, 0);
        if self.stopped.load(Ordering::Acquire) {
            out.fill(0.0);
            return Ok(());
        }
        let frames = out.len() / self.channels;
        self.check_span(abs, frames)?;
        for f in 0..frames {
            let slot = ((abs + f as u64) % self.capacity as u64) as usize;
            for ch in 0..self.channels {
                let bits = self.cells[ch][slot].load(Ordering::Relaxed);
                out[f * self.channels + ch] = f32::from_bits(bits);
            }
        }
        Ok(())
    }

    /// Read a single-channel span into `out`. Worker side.
    pub fn read_span(&self, channel: usize, abs: AbsPos, out: &mut [f32]) -> Result<(), RingError> {
        debug_assert!(channel < self.channels);
        self.check_span(abs, out.len())?;
        for (i, sample) in out.iter_mut().enumerate() {
            let slot = ((abs + i as u64) % self.capacity as u64) as usize;
            *sample = f32::from_bits(self.cells[channel][slot].load(Ordering::Relaxed));
        }
        Ok(())
    }

    /// Overwrite already-written frames starting at `abs_start` with planar
    /// per-channel data. Worker side.
    ///
    /// All channel slices must have equal length. The whole span must lie in
    /// the addressable window; partial writes are disallowed, so the caller
    /// clips first. A zero-length span is a no-op.
    pub fn overwrite(&self, abs_start: AbsPos, channels: &[&[f32]]) -> Result<(), RingError> {
        assert_eq!(channels.len(), self.channels, "channel count mismatch");
        let len = channels[0].len();
        debug_assert!(channels.iter().all(|c| c.len() == len));
        if len == 0 {
            return Ok(());
        }
        self.check_span(abs_start, len)?;
        for i in 0..len {
            let slot = ((abs_start + i as u64) % self.capacity as u64) as usize;
            for (ch, data) in channels.iter().enumerate() {
                self.cells[ch][slot].store(data[i].to_bits(), Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Validate that `[abs_start, abs_start + len)` is addressable.
    pub fn check_span(&self, abs_start: AbsPos, len: usize) -> Result<(), RingError> {
        let wh = self.write_head.load(Ordering::Acquire);
        let end = abs_start + len as u64;
        if end > wh {
            return Err(RingError::AheadOfWrite { abs_start, len });
        }
        if abs_start < wh.saturating_sub(self.capacity as u64) {
            return Err(RingError::OutOfWindow { abs_start, len });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interleave(frames: &[[f32; 2]]) -> Vec<f32> {
        frames.iter().flat_map(|f| f.iter().copied()).collect()
    }

    #[test]
    fn test_append_then_read_roundtrip() {
        let ring = DelayRing::new(2, 16);
        let frames = interleave(&[[0.1, -0.1], [0.2, -0.2], [0.3, -0.3]]);
        ring.append(&frames);
        assert_eq!(ring.write_head(), 3);

        let mut out = vec![0.0; 6];
        ring.read_at(0, &mut out).unwrap();
        assert_eq!(out, frames);
    }

    #[test]
    fn test_heads_are_monotonic() {
        let ring = DelayRing::new(1, 8);
        let mut last = ring.write_head();
        for _ in 0..5 {
            ring.append(&[1.0, 2.0]);
            let wh = ring.write_head();
            assert!(wh >= last);
            last = wh;
        }
        ring.set_read_head(3);
        assert!(ring.read_head() <= ring.write_head());
        assert_eq!(ring.fill(), 7);
    }

    #[test]
    fn test_read_wraps_across_physical_boundary() {
        let ring = DelayRing::new(1, 8);
        // Write 12 mono frames into an 8-frame ring; positions 4..12 remain.
        let data: Vec<f32> = (0..12).map(|i| i as f32).collect();
        ring.append(&data);

        let mut out = vec![0.0; 6];
        ring.read_at(5, &mut out).unwrap();
        assert_eq!(out, vec![5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn test_read_evicted_span_fails() {
        let ring = DelayRing::new(1, 8);
        ring.append(&vec![0.5; 12]);

        let mut out = vec![0.0; 2];
        let err = ring.read_at(2, &mut out).unwrap_err();
        assert_eq!(
            err,
            RingError::OutOfWindow {
                abs_start: 2,
                len: 2
            }
        );
    }

    #[test]
    fn test_read_ahead_of_write_fails() {
        let ring = DelayRing::new(1, 8);
        ring.append(&[1.0, 2.0]);

        let mut out = vec![0.0; 4];
        let err = ring.read_at(0, &mut out).unwrap_err();
        assert_eq!(
            err,
            RingError::AheadOfWrite {
                abs_start: 0,
                len: 4
            }
        );
    }

    #[test]
    fn test_overwrite_in_window_succeeds() {
        let ring = DelayRing::new(2, 16);
        ring.append(&vec![0.25; 20]); // 10 stereo frames

        let left = vec![0.0; 4];
        let right = vec![1.0; 4];
        ring.overwrite(3, &[&left, &right]).unwrap();

        let mut out = vec![0.0; 8];
        ring.read_at(3, &mut out).unwrap();
        for f in 0..4 {
            assert_eq!(out[f * 2], 0.0);
            assert_eq!(out[f * 2 + 1], 1.0);
        }
    }

    #[test]
    fn test_overwrite_straddles_wrap() {
        let ring = DelayRing::new(1, 8);
        ring.append(&vec![0.0; 10]); // wrap once

        let data: Vec<f32> = (0..4).map(|i| i as f32 + 1.0).collect();
        ring.overwrite(6, &[&data]).unwrap();

        let mut out = vec![0.0; 4];
        ring.read_at(6, &mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_overwrite_window_violations() {
        let ring = DelayRing::new(1, 8);
        ring.append(&vec![0.0; 12]);

        // Evicted: positions below 4 are gone.
        let data = vec![1.0; 2];
        assert!(matches!(
            ring.overwrite(1, &[&data]),
            Err(RingError::OutOfWindow { .. })
        ));

        // Unwritten: ends past the write head.
        assert!(matches!(
            ring.overwrite(11, &[&data]),
            Err(RingError::AheadOfWrite { .. })
        ));

        // Exactly filling the window is fine.
        let full = vec![1.0; 8];
        assert!(ring.overwrite(4, &[&full]).is_ok());
    }

    #[test]
    fn test_overwrite_zero_length_is_noop() {
        let ring = DelayRing::new(1, 8);
        let empty: &[f32] = &[];
        assert!(ring.overwrite(0, &[empty]).is_ok());
        // Even at a position that would otherwise be ahead of the write head.
        assert!(ring.overwrite(100, &[empty]).is_ok());
    }

    #[test]
    fn test_stopped_ring_reads_silence() {
        let ring = DelayRing::new(1, 8);
        ring.append(&[0.7, 0.7]);
        ring.stop();

        let mut out = vec![1.0; 2];
        ring.read_at(0, &mut out).unwrap();
        assert_eq!(out, vec![0.0, 0.0]);

        // Stopped reads never fail, even out of window.
        let mut far = vec![1.0; 2];
        assert!(ring.read_at(1000, &mut far).is_ok());
        assert_eq!(far, vec![0.0, 0.0]);
    }

    #[test]
    fn test_fill_tracks_heads() {
        let ring = DelayRing::new(1, 16);
        assert_eq!(ring.fill(), 0);
        ring.append(&vec![0.0; 10]);
        assert_eq!(ring.fill(), 10);
        ring.set_read_head(4);
        assert_eq!(ring.fill(), 6);
    }

    #[test]
    fn test_concurrent_append_and_overwrite() {
        use std::sync::Arc;
        use std::thread;

        let ring = Arc::new(DelayRing::new(1, 48_000));
        ring.append(&vec![0.5; 4_800]);

        let writer = {
            let ring = ring.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    ring.append(&vec![0.5; 128]);
                }
            })
        };
        let mutator = {
            let ring = ring.clone();
            thread::spawn(move || {
                let zeros = vec![0.0; 256];
                for _ in 0..100 {
                    // Mutate a span near the start; it stays in-window
                    // because capacity far exceeds what the writer appends.
                    let _ = ring.overwrite(1024, &[&zeros]);
                }
            })
        };
        writer.join().unwrap();
        mutator.join().unwrap();

        assert_eq!(ring.write_head(), 4_800 + 100 * 128);
        let mut out = vec![1.0; 256];
        ring.read_at(1024, &mut out).unwrap();
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
