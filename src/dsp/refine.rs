//! Energy-based word boundary refinement.
//!
//! ASR word timings derived from even distribution are approximate. The
//! refiner nudges each boundary to the quietest analysis frame nearby, on the
//! assumption that word boundaries sit in energy dips.

use crate::asr::words::WordSegment;
use crate::defaults;

/// Pluggable timestamp refinement stage.
///
/// Implementations are pure: no I/O, no allocation requirements, boundaries
/// stay within the chunk's time frame.
pub trait TimestampRefiner: Send + Sync {
    /// Possibly shift `word`'s boundaries. `chunk` is the mono chunk the word
    /// was recognized in, at `sample_rate` Hz.
    fn refine(&self, word: &mut WordSegment, chunk: &[f32], sample_rate: u32);
}

/// Shifts boundaries to the lowest-energy 10ms frame within ±150ms.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyRefiner;

impl EnergyRefiner {
    /// Frame energy around `center`, half a frame each side.
    fn frame_energy(chunk: &[f32], center: usize, half_frame: usize) -> f32 {
        let lo = center.saturating_sub(half_frame);
        let hi = (center + half_frame).min(chunk.len());
        if lo >= hi {
            return f32::MAX;
        }
        chunk[lo..hi].iter().map(|s| s * s).sum::<f32>() / (hi - lo) as f32
    }

    /// Best boundary position (in samples) near `boundary`.
    fn quietest_near(chunk: &[f32], boundary: usize, rate: u32) -> usize {
        let window = (rate as u64 * defaults::REFINE_WINDOW_MS as u64 / 1000) as usize;
        let frame = (rate as u64 * defaults::REFINE_FRAME_MS as u64 / 1000) as usize;
        let half_frame = (frame / 2).max(1);

        let lo = boundary.saturating_sub(window);
        let hi = (boundary + window).min(chunk.len());
        if lo >= hi {
            return boundary;
        }

        let mut best = boundary;
        let mut best_energy = Self::frame_energy(chunk, boundary, half_frame);
        let mut pos = lo;
        while pos < hi {
            let energy = Self::frame_energy(chunk, pos, half_frame);
            if energy < best_energy {
                best_energy = energy;
                best = pos;
            }
            pos += half_frame;
        }
        best
    }
}

impl TimestampRefiner for EnergyRefiner {
    fn refine(&self, word: &mut WordSegment, chunk: &[f32], sample_rate: u32) {
        if chunk.is_empty() || sample_rate == 0 {
            return;
        }
        let rate = sample_rate as f64;
        let start_sample = (word.start_s * rate) as usize;
        let end_sample = (word.end_s * rate) as usize;

        let new_start = Self::quietest_near(chunk, start_sample, sample_rate);
        let new_end = Self::quietest_near(chunk, end_sample, sample_rate);

        let start_s = new_start as f64 / rate;
        let end_s = new_end as f64 / rate;
        if end_s >= start_s + defaults::MIN_WORD_SECONDS {
            word.start_s = start_s;
            word.end_s = end_s;
        }
    }
}
