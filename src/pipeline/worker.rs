//! Censor worker: drains the handoff slot, transcribes, censors, loops.
//!
//! Runs on its own normal-priority thread where blocking and allocation are
//! fine. Per chunk: optional vocal filtering on a private copy, resampling to
//! the recognizer's rate, transcription, word timing, profanity detection
//! (single tokens and adjacent pairs), padding, mapping back to absolute ring
//! positions, and the mute/reverse overwrite.

use crate::asr::recognizer::SpeechRecognizer;
use crate::asr::words::{WordSegment, distribute_words, normalize_token};
use crate::audio::ring::{DelayRing, RingError};
use crate::defaults;
use crate::dsp::censor::{CensorMode, censor_span, fade_len};
use crate::dsp::refine::TimestampRefiner;
use crate::dsp::resample::LinearResampler;
use crate::dsp::vocal::VocalFilter;
use crate::error::Result;
use crate::lexicon::Lexicon;
use crate::pipeline::handoff::StagedChunk;
use crate::pipeline::report::{ErrorReporter, StageError};
use crate::pipeline::stats::PipelineStats;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// A detected profanity span, chunk-relative, pre-padding.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Hit {
    pub start_s: f64,
    pub end_s: f64,
    pub text: String,
}

/// Scan timed words for lexicon hits.
///
/// A single-word hit consumes its token. Otherwise the token is probed
/// together with its successor (normalized concatenation); a pair hit
/// produces one span over both and consumes them both.
pub(crate) fn detect_hits(words: &[WordSegment], lexicon: &dyn Lexicon) -> Vec<Hit> {
    let mut hits = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let word = &words[i];
        if lexicon.contains(&normalize_token(&word.text)) {
            hits.push(Hit {
                start_s: word.start_s,
                end_s: word.end_s,
                text: word.text.clone(),
            });
            i += 1;
            continue;
        }
        if i + 1 < words.len() {
            let next = &words[i + 1];
            let mut joined = word.text.clone();
            joined.push_str(&next.text);
            if lexicon.contains(&normalize_token(&joined)) {
                hits.push(Hit {
                    start_s: word.start_s,
                    end_s: next.end_s,
                    text: format!("{} {}", word.text, next.text),
                });
                i += 2;
                continue;
            }
        }
        i += 1;
    }
    hits
}

/// The worker half of the censor pipeline.
pub(crate) struct CensorWorker {
    pub(crate) ring: Arc<DelayRing>,
    pub(crate) stats: Arc<PipelineStats>,
    pub(crate) chunk_rx: Receiver<StagedChunk>,
    pub(crate) recycle_tx: Sender<Vec<f32>>,
    pub(crate) shutdown: Arc<AtomicBool>,
    pub(crate) recognizer: Arc<dyn SpeechRecognizer>,
    pub(crate) lexicon: Arc<dyn Lexicon>,
    pub(crate) refiner: Option<Box<dyn TimestampRefiner>>,
    pub(crate) vocal: Option<VocalFilter>,
    pub(crate) resampler: LinearResampler,
    pub(crate) reporter: Arc<dyn ErrorReporter>,
    pub(crate) sample_rate: u32,
    pub(crate) chunk_seconds: f64,
    pub(crate) pad_pre_s: f64,
    pub(crate) pad_post_s: f64,
    pub(crate) fade_max: usize,
    pub(crate) reverse_gain: f32,
}

impl CensorWorker {
    /// Idle/Transcribing/Applying loop; exits on shutdown or when the
    /// scheduler side hangs up.
    pub(crate) fn run(mut self) {
        while !self.shutdown.load(Ordering::Acquire) {
            match self
                .chunk_rx
                .recv_timeout(Duration::from_millis(defaults::WORKER_POLL_MS))
            {
                Ok(chunk) => {
                    let started = Instant::now();
                    if let Err(e) = self.process_chunk(&chunk) {
                        self.reporter
                            .report("censor-worker", &StageError::Fatal(e.to_string()));
                        self.stats.set_running(false);
                        return;
                    }
                    let rtf = started.elapsed().as_secs_f64() / self.chunk_seconds;
                    self.stats.set_last_chunk_rtf(rtf as f32);
                    if rtf > 1.0 {
                        self.reporter.report(
                            "censor-worker",
                            &StageError::Recoverable(format!(
                                "chunk processed in {:.2}x real time",
                                rtf
                            )),
                        );
                    }
                    self.stats.add_chunk_processed();

                    let StagedChunk { mut samples, .. } = chunk;
                    samples.clear();
                    let _ = self.recycle_tx.try_send(samples);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }

    /// Transcribe one chunk and write its censor ops into the ring.
    ///
    /// The returned error is fatal (resampler/filter family); recognition
    /// failures are recoverable and leave the chunk pass-through.
    pub(crate) fn process_chunk(&mut self, chunk: &StagedChunk) -> Result<()> {
        // The ring keeps the original audio; the filter runs on a private
        // ASR-bound copy only.
        let mut asr_copy = chunk.samples.clone();
        if let Some(filter) = &mut self.vocal {
            filter.reset();
            filter.process(&mut asr_copy);
        }

        let pcm = self.resampler.resample(&asr_copy);
        let segments = match self.recognizer.transcribe(&pcm) {
            Ok(segments) => segments,
            Err(e) => {
                self.stats.add_asr_failure();
                self.reporter.report(
                    "censor-worker",
                    &StageError::Recoverable(format!("recognition failed: {}", e)),
                );
                return Ok(());
            }
        };
        if segments.is_empty() {
            return Ok(());
        }

        let mut words = distribute_words(&segments, self.chunk_seconds);
        if let Some(refiner) = &self.refiner {
            for word in &mut words {
                refiner.refine(word, &asr_copy, self.sample_rate);
            }
        }

        let hits = detect_hits(&words, self.lexicon.as_ref());
        if hits.is_empty() {
            return Ok(());
        }

        // Underrun guard: leaking a word beats stuttering playback while the
        // scheduler is already starved.
        if self.stats.is_paused() {
            self.reporter.report(
                "censor-worker",
                &StageError::Recoverable(format!(
                    "{} hit(s) skipped during underrun",
                    hits.len()
                )),
            );
            return Ok(());
        }

        let mode = self.stats.censor_mode();
        for hit in &hits {
            self.apply_hit(chunk, hit, mode);
        }
        Ok(())
    }

    /// Pad, clamp, map to absolute positions, and overwrite one hit.
    pub(crate) fn apply_hit(&self, chunk: &StagedChunk, hit: &Hit, mode: CensorMode) {
        let start_padded = (hit.start_s - self.pad_pre_s).clamp(0.0, self.chunk_seconds);
        let end_padded = (hit.end_s + self.pad_post_s).clamp(0.0, self.chunk_seconds);
        let rate = self.sample_rate as f64;
        let abs_start = chunk.start_abs + (start_padded * rate) as u64;
        let abs_end = chunk.start_abs + (end_padded * rate) as u64;
        if abs_end <= abs_start {
            return;
        }

        let len = (abs_end - abs_start) as usize;
        let fade = fade_len(len, self.fade_max);
        let channels = self.ring.channels();

        let mut spans: Vec<Vec<f32>> = Vec::with_capacity(channels);
        for ch in 0..channels {
            let mut span = vec![0.0f32; len];
            match self.ring.read_span(ch, abs_start, &mut span) {
                Ok(()) => {}
                Err(e) => {
                    self.count_ring_miss(e);
                    return;
                }
            }
            censor_span(&mut span, mode, fade, self.reverse_gain);
            spans.push(span);
        }
        let planar: Vec<&[f32]> = spans.iter().map(Vec::as_slice).collect();
        match self.ring.overwrite(abs_start, &planar) {
            Ok(()) => self.stats.add_profanity(),
            Err(e) => self.count_ring_miss(e),
        }
    }

    fn count_ring_miss(&self, error: RingError) {
        match error {
            RingError::OutOfWindow { .. } => self.stats.add_window_missed(),
            RingError::AheadOfWrite { .. } => self.reporter.report(
                "censor-worker",
                &StageError::Recoverable(error.to_string()),
            ),
        }
    }
}
