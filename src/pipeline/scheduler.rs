//! Pipeline scheduler: the per-callback audio path.
//!
//! One `process` call per host period. Input frames land in the delay ring
//! and, downmixed to mono, in the staging buffer; output frames are read
//! from the ring at a cursor trailing the write head by the target delay.
//! Playback is gated until the delay has been buffered once, and pauses
//! below the hysteresis threshold until the delay recovers.
//!
//! Real-time contract: no allocation, no locks, no I/O. The staging buffer
//! never grows past its preallocated capacity and the handoff publish is a
//! lock-free channel operation.

use crate::audio::meter;
use crate::audio::ring::{AbsPos, DelayRing};
use crate::config::Config;
use crate::pipeline::handoff::StagedChunk;
use crate::pipeline::stats::PipelineStats;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::Arc;

/// The audio-callback half of the censor pipeline.
///
/// Owned by whoever drives the duplex stream; methods are called from the
/// real-time thread only.
pub struct Scheduler {
    ring: Arc<DelayRing>,
    stats: Arc<PipelineStats>,
    chunk_tx: Sender<StagedChunk>,
    recycle_rx: Receiver<Vec<f32>>,
    staging: Vec<f32>,
    staging_start_abs: AbsPos,
    chunk_samples: usize,
    channels: usize,
    target_delay_samples: u64,
    pause_low_samples: u64,
    playback_started: bool,
    paused: bool,
    /// Set when an output frame had to be substituted with silence.
    degraded: bool,
}

impl Scheduler {
    pub(crate) fn new(
        ring: Arc<DelayRing>,
        stats: Arc<PipelineStats>,
        chunk_tx: Sender<StagedChunk>,
        recycle_rx: Receiver<Vec<f32>>,
        config: &Config,
    ) -> Self {
        let chunk_samples = config.chunk_samples();
        Self {
            ring,
            stats,
            chunk_tx,
            recycle_rx,
            staging: Vec::with_capacity(chunk_samples),
            staging_start_abs: 0,
            chunk_samples,
            channels: config.audio.channels,
            target_delay_samples: config.target_delay_samples(),
            pause_low_samples: config.pause_low_samples(),
            playback_started: false,
            paused: false,
            degraded: false,
        }
    }

    /// Process one host period of interleaved audio.
    ///
    /// `input` and `output` hold whole frames but need not hold the same
    /// number: an input dropout delivers fewer (or zero) input frames while
    /// output must still be produced, which is how the fill genuinely drains.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len() % self.channels, 0);
        debug_assert_eq!(output.len() % self.channels, 0);
        let in_frames = input.len() / self.channels;
        let out_frames = output.len() / self.channels;
        let base = self.ring.write_head();

        if in_frames > 0 {
            self.stats
                .set_input_level_rms(meter::rms_channel0(input, self.channels));
        }

        self.ring.append(input);

        for f in 0..in_frames {
            let frame = &input[f * self.channels..(f + 1) * self.channels];
            self.accumulate(meter::downmix_frame(frame), base + f as u64);
        }

        let mut read_head = self.ring.read_head();
        for f in 0..out_frames {
            // Frames fully written before this output frame. Within a duplex
            // call, input frame f lands together with output frame f.
            let written = base + (f.min(in_frames)) as u64;

            if !self.playback_started {
                if written - read_head >= self.target_delay_samples {
                    self.playback_started = true;
                    read_head = written - self.target_delay_samples;
                    self.stats.set_playback_started(true);
                }
            } else {
                let fill = written.saturating_sub(read_head);
                if !self.paused && fill < self.pause_low_samples {
                    self.paused = true;
                    self.stats.set_paused(true);
                } else if self.paused && fill >= self.target_delay_samples {
                    self.paused = false;
                    self.stats.set_paused(false);
                }
            }

            let out_frame = &mut output[f * self.channels..(f + 1) * self.channels];
            if self.playback_started && !self.paused && !self.ring.is_stopped() {
                match self.ring.read_at(read_head, out_frame) {
                    Ok(()) => read_head += 1,
                    Err(_) => {
                        out_frame.fill(0.0);
                        self.degraded = true;
                    }
                }
            } else {
                out_frame.fill(0.0);
            }
        }
        self.ring.set_read_head(read_head);

        // Both heads are final for this period, so the ring's own fill is
        // the authoritative value for the gauge.
        self.stats
            .set_fill_fraction(self.ring.fill() as f32 / self.ring.capacity() as f32);
    }

    /// Add one mono sample to staging; publish when a chunk completes.
    ///
    /// While the slot is occupied the full staging is retained and incoming
    /// samples are skipped on the ASR path (they stay in the ring for
    /// playback); the held chunk goes out as soon as the worker drains the
    /// slot.
    fn accumulate(&mut self, mono: f32, abs: AbsPos) {
        if self.staging.len() == self.chunk_samples && !self.try_publish() {
            return;
        }
        if self.staging.is_empty() {
            self.staging_start_abs = abs;
        }
        self.staging.push(mono);
        if self.staging.len() == self.chunk_samples {
            self.try_publish();
        }
    }

    /// Publish the full staging buffer if the slot is empty and a spare
    /// buffer is available. Returns true when staging is empty afterwards.
    fn try_publish(&mut self) -> bool {
        if !self.chunk_tx.is_empty() {
            return false;
        }
        let Ok(mut spare) = self.recycle_rx.try_recv() else {
            return false;
        };
        spare.clear();
        let samples = std::mem::replace(&mut self.staging, spare);
        let chunk = StagedChunk {
            samples,
            start_abs: self.staging_start_abs,
        };
        match self.chunk_tx.try_send(chunk) {
            Ok(()) => true,
            // Only the worker's death can land here; keep the samples staged.
            Err(TrySendError::Full(chunk)) | Err(TrySendError::Disconnected(chunk)) => {
                self.staging = chunk.samples;
                self.degraded = true;
                false
            }
        }
    }

    /// True when the callback has ever substituted silence for real output.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::handoff::handoff;

    const RATE: u32 = 1_000;

    /// 0.1s chunks, 0.2s target delay, 0.05s hysteresis, mono, 1kHz.
    fn test_config() -> Config {
        let mut config = Config::default();
        config.audio.sample_rate = RATE;
        config.audio.channels = 1;
        config.audio.period_size = 50;
        config.pipeline.chunk_seconds = 0.1;
        config.pipeline.target_delay_seconds = 0.2;
        config.pipeline.pause_hysteresis_seconds = 0.05;
        config
    }

    struct Rig {
        scheduler: Scheduler,
        ring: Arc<DelayRing>,
        stats: Arc<PipelineStats>,
        chunk_rx: crossbeam_channel::Receiver<StagedChunk>,
        recycle_tx: crossbeam_channel::Sender<Vec<f32>>,
    }

    fn rig(config: &Config) -> Rig {
        let ring = Arc::new(DelayRing::new(config.audio.channels, config.ring_capacity()));
        let stats = Arc::new(PipelineStats::new(config.censor.mode));
        let h = handoff(config.chunk_samples());
        let scheduler = Scheduler::new(
            ring.clone(),
            stats.clone(),
            h.chunk_tx,
            h.recycle_rx,
            config,
        );
        Rig {
            scheduler,
            ring,
            stats,
            chunk_rx: h.chunk_rx,
            recycle_tx: h.recycle_tx,
        }
    }

    /// Drive `frames` of a ramp starting at `offset`, collecting output.
    fn pump_ramp(rig: &mut Rig, offset: usize, frames: usize, period: usize) -> Vec<f32> {
        let mut collected = Vec::new();
        let mut sent = 0;
        while sent < frames {
            let n = period.min(frames - sent);
            let input: Vec<f32> = (0..n)
                .map(|i| (offset + sent + i) as f32 / 1_000.0 + 0.001)
                .collect();
            let mut output = vec![9.9; n];
            rig.scheduler.process(&input, &mut output);
            collected.extend_from_slice(&output);
            sent += n;
        }
        collected
    }

    #[test]
    fn test_startup_gate_delays_exactly_target() {
        let config = test_config();
        let mut r = rig(&config);

        // 0.5s of input: 500 frames, target delay 200.
        let output = pump_ramp(&mut r, 0, 500, 50);

        // Nothing audible until the target delay has been buffered once.
        assert!(output[..200].iter().all(|&s| s == 0.0));
        // Frame 200 is input frame 0, and the delay stays constant.
        for k in 0..300 {
            let expected = k as f32 / 1_000.0 + 0.001;
            assert_eq!(output[200 + k], expected, "output frame {}", 200 + k);
        }
        assert!(r.stats.playback_started());
        assert!(!r.stats.is_paused());
    }

    #[test]
    fn test_staging_publishes_chunk_with_start_abs() {
        let config = test_config();
        let mut r = rig(&config);

        pump_ramp(&mut r, 0, 100, 50); // exactly one chunk
        let chunk = r.chunk_rx.try_recv().unwrap();
        assert_eq!(chunk.start_abs, 0);
        assert_eq!(chunk.samples.len(), 100);
        // Mono downmix of a mono stream is the stream itself.
        assert_eq!(chunk.samples[7], 7.0 / 1_000.0 + 0.001);
    }

    #[test]
    fn test_second_chunk_follows_first_when_drained() {
        let config = test_config();
        let mut r = rig(&config);

        pump_ramp(&mut r, 0, 100, 50);
        let first = r.chunk_rx.try_recv().unwrap();
        // Worker done: return the buffer.
        let mut buf = first.samples;
        buf.clear();
        r.recycle_tx.try_send(buf).unwrap();

        pump_ramp(&mut r, 100, 100, 50);
        let second = r.chunk_rx.try_recv().unwrap();
        assert_eq!(second.start_abs, 100);
        assert_eq!(second.samples.len(), 100);
    }

    #[test]
    fn test_busy_worker_holds_chunk_and_drops_asr_samples() {
        let config = test_config();
        let mut r = rig(&config);

        // Chunk 0 published at 100, never drained; staging refills 100..200
        // and then sticks while samples 200..250 bypass the ASR path.
        pump_ramp(&mut r, 0, 250, 50);
        let chunk0 = r.chunk_rx.try_recv().unwrap();
        assert_eq!(chunk0.start_abs, 0);
        assert!(r.chunk_rx.try_recv().is_err());

        // Drain + recycle; the held chunk (100..200) goes out on the next
        // accumulated sample.
        let mut buf = chunk0.samples;
        buf.clear();
        r.recycle_tx.try_send(buf).unwrap();
        pump_ramp(&mut r, 250, 1, 1);

        let chunk1 = r.chunk_rx.try_recv().unwrap();
        assert_eq!(chunk1.start_abs, 100);
        assert_eq!(chunk1.samples.len(), 100);
        // Playback audio was never dropped.
        assert_eq!(r.ring.write_head(), 251);
    }

    #[test]
    fn test_pause_on_drain_and_exact_resume() {
        let config = test_config();
        let mut r = rig(&config);

        // Reach steady playback.
        let output = pump_ramp(&mut r, 0, 400, 50);
        assert_eq!(output[399], 199.0 / 1_000.0 + 0.001);

        // Input dropout: output-only calls drain the fill below
        // target - hysteresis = 150 frames.
        let mut drained = Vec::new();
        for _ in 0..2 {
            let mut output = vec![9.9; 50];
            r.scheduler.process(&[], &mut output);
            drained.extend_from_slice(&output);
        }
        // Playback continues while fill >= 150; the pause lands on the frame
        // where the fill first dips below the threshold.
        assert_eq!(drained[49], 249.0 / 1_000.0 + 0.001);
        assert_eq!(drained[50], 250.0 / 1_000.0 + 0.001);
        assert!(r.stats.is_paused());
        assert!(drained[51..].iter().all(|&s| s == 0.0));
        let frozen = r.ring.read_head();

        // While paused the output is silence and the cursor does not move.
        let mut output = vec![9.9; 50];
        r.scheduler.process(&[], &mut output);
        assert!(output.iter().all(|&s| s == 0.0));
        assert_eq!(r.ring.read_head(), frozen);

        // Refill with input-only calls until fill recovers to the target.
        for _ in 0..4 {
            let input = vec![0.5; 50];
            r.scheduler.process(&input, &mut []);
        }
        // Resume: the next output continues at the frozen cursor, no skip.
        let mut output = vec![9.9; 50];
        r.scheduler.process(&[], &mut output);
        assert!(!r.stats.is_paused());
        assert_eq!(output[0], frozen as f32 / 1_000.0 + 0.001);
    }

    #[test]
    fn test_rms_gauge_published() {
        let config = test_config();
        let mut r = rig(&config);
        let input = vec![0.5; 50];
        let mut output = vec![0.0; 50];
        r.scheduler.process(&input, &mut output);
        assert!((r.stats.snapshot().input_level_rms - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_stereo_downmix_into_staging() {
        let mut config = test_config();
        config.audio.channels = 2;
        let mut r = rig(&config);

        // L = 0.2, R = 0.6 -> mono 0.4
        let input: Vec<f32> = (0..100).flat_map(|_| [0.2, 0.6]).collect();
        let mut output = vec![0.0; 200];
        r.scheduler.process(&input, &mut output);

        let chunk = r.chunk_rx.try_recv().unwrap();
        assert_eq!(chunk.samples.len(), 100);
        assert!(chunk.samples.iter().all(|&s| (s - 0.4).abs() < 1e-6));
    }

    #[test]
    fn test_callback_is_total_after_ring_stop() {
        let config = test_config();
        let mut r = rig(&config);
        pump_ramp(&mut r, 0, 400, 50);

        r.ring.stop();
        let input = vec![0.1; 50];
        let mut output = vec![9.9; 50];
        r.scheduler.process(&input, &mut output);
        assert!(output.iter().all(|&s| s == 0.0));
    }
}
