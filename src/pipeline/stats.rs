//! Observability surface: atomically published pipeline state.
//!
//! The audio callback and the worker store into these cells; external
//! observers poll [`PipelineStats::snapshot`]. No callbacks into user code
//! from the real-time path. f32 gauges are stored as bit patterns in
//! `AtomicU32`.

use crate::dsp::censor::CensorMode;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};

/// Shared pipeline counters and gauges.
#[derive(Debug)]
pub struct PipelineStats {
    // f32 bits
    input_level_rms: AtomicU32,
    fill_fraction: AtomicU32,
    latency_ms: AtomicU32,
    last_chunk_rtf: AtomicU32,
    // counters
    profanity_count: AtomicU64,
    window_missed: AtomicU64,
    asr_failures: AtomicU64,
    chunks_processed: AtomicU64,
    // flags
    running: AtomicBool,
    paused: AtomicBool,
    playback_started: AtomicBool,
    censor_mode: AtomicU8,
}

/// A plain, coherent-enough copy of the stats for polling observers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    pub input_level_rms: f32,
    pub fill_fraction: f32,
    pub latency_ms: f32,
    pub last_chunk_rtf: f32,
    pub profanity_count: u64,
    pub window_missed: u64,
    pub asr_failures: u64,
    pub chunks_processed: u64,
    pub running: bool,
    pub paused: bool,
    pub playback_started: bool,
    pub censor_mode: CensorMode,
}

impl PipelineStats {
    pub fn new(mode: CensorMode) -> Self {
        Self {
            input_level_rms: AtomicU32::new(0.0f32.to_bits()),
            fill_fraction: AtomicU32::new(0.0f32.to_bits()),
            latency_ms: AtomicU32::new(0.0f32.to_bits()),
            last_chunk_rtf: AtomicU32::new(0.0f32.to_bits()),
            profanity_count: AtomicU64::new(0),
            window_missed: AtomicU64::new(0),
            asr_failures: AtomicU64::new(0),
            chunks_processed: AtomicU64::new(0),
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            playback_started: AtomicBool::new(false),
            censor_mode: AtomicU8::new(mode.to_u8()),
        }
    }

    pub fn set_input_level_rms(&self, value: f32) {
        self.input_level_rms.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn set_fill_fraction(&self, value: f32) {
        self.fill_fraction.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn set_latency_ms(&self, value: f32) {
        self.latency_ms.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn set_last_chunk_rtf(&self, value: f32) {
        self.last_chunk_rtf.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn add_profanity(&self) {
        self.profanity_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_window_missed(&self) {
        self.window_missed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_asr_failure(&self) {
        self.asr_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_chunk_processed(&self) {
        self.chunks_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_running(&self, value: bool) {
        self.running.store(value, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, value: bool) {
        self.paused.store(value, Ordering::Release);
    }

    /// Mirrors the scheduler's pause state; the worker reads this as its
    /// underrun guard.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn set_playback_started(&self, value: bool) {
        self.playback_started.store(value, Ordering::Release);
    }

    pub fn playback_started(&self) -> bool {
        self.playback_started.load(Ordering::Acquire)
    }

    pub fn set_censor_mode(&self, mode: CensorMode) {
        self.censor_mode.store(mode.to_u8(), Ordering::Release);
    }

    pub fn censor_mode(&self) -> CensorMode {
        CensorMode::from_u8(self.censor_mode.load(Ordering::Acquire))
    }

    pub fn profanity_count(&self) -> u64 {
        self.profanity_count.load(Ordering::Relaxed)
    }

    pub fn window_missed(&self) -> u64 {
        self.window_missed.load(Ordering::Relaxed)
    }

    pub fn chunks_processed(&self) -> u64 {
        self.chunks_processed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            input_level_rms: f32::from_bits(self.input_level_rms.load(Ordering::Relaxed)),
            fill_fraction: f32::from_bits(self.fill_fraction.load(Ordering::Relaxed)),
            latency_ms: f32::from_bits(self.latency_ms.load(Ordering::Relaxed)),
            last_chunk_rtf: f32::from_bits(self.last_chunk_rtf.load(Ordering::Relaxed)),
            profanity_count: self.profanity_count.load(Ordering::Relaxed),
            window_missed: self.window_missed.load(Ordering::Relaxed),
            asr_failures: self.asr_failures.load(Ordering::Relaxed),
            chunks_processed: self.chunks_processed.load(Ordering::Relaxed),
            running: self.is_running(),
            paused: self.is_paused(),
            playback_started: self.playback_started(),
            censor_mode: self.censor_mode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauges_roundtrip_through_bits() {
        let stats = PipelineStats::new(CensorMode::Reverse);
        stats.set_input_level_rms(0.125);
        stats.set_fill_fraction(0.5);
        stats.set_latency_ms(10_000.0);

        let snap = stats.snapshot();
        assert_eq!(snap.input_level_rms, 0.125);
        assert_eq!(snap.fill_fraction, 0.5);
        assert_eq!(snap.latency_ms, 10_000.0);
    }

    #[test]
    fn test_counters_accumulate() {
        let stats = PipelineStats::new(CensorMode::Mute);
        stats.add_profanity();
        stats.add_profanity();
        stats.add_window_missed();
        stats.add_asr_failure();
        stats.add_chunk_processed();

        let snap = stats.snapshot();
        assert_eq!(snap.profanity_count, 2);
        assert_eq!(snap.window_missed, 1);
        assert_eq!(snap.asr_failures, 1);
        assert_eq!(snap.chunks_processed, 1);
    }

    #[test]
    fn test_flags() {
        let stats = PipelineStats::new(CensorMode::Mute);
        assert!(!stats.is_running());
        stats.set_running(true);
        stats.set_paused(true);
        stats.set_playback_started(true);

        let snap = stats.snapshot();
        assert!(snap.running && snap.paused && snap.playback_started);
    }

    #[test]
    fn test_mode_switch() {
        let stats = PipelineStats::new(CensorMode::Mute);
        assert_eq!(stats.censor_mode(), CensorMode::Mute);
        stats.set_censor_mode(CensorMode::Reverse);
        assert_eq!(stats.snapshot().censor_mode, CensorMode::Reverse);
    }
}
