//! Pipeline lifecycle: validate, start, stop.
//!
//! [`CensorPipeline`] owns the configuration and the injection points
//! (reporter, refiner). `start` allocates every buffer up front, spawns the
//! censor worker, and hands back the [`Scheduler`] for the audio callback
//! plus a [`PipelineHandle`] for control and observation.

use crate::asr::recognizer::SpeechRecognizer;
use crate::audio::ring::DelayRing;
use crate::config::Config;
use crate::dsp::censor::CensorMode;
use crate::dsp::refine::{EnergyRefiner, TimestampRefiner};
use crate::dsp::resample::LinearResampler;
use crate::dsp::vocal::VocalFilter;
use crate::error::{BleepError, Result};
use crate::lexicon::Lexicon;
use crate::pipeline::handoff::handoff;
use crate::pipeline::report::{ErrorReporter, LogReporter};
use crate::pipeline::scheduler::Scheduler;
use crate::pipeline::stats::{PipelineStats, StatsSnapshot};
use crate::pipeline::worker::CensorWorker;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// The censor pipeline, configured but not yet running.
pub struct CensorPipeline {
    config: Config,
    reporter: Arc<dyn ErrorReporter>,
    refiner: Option<Box<dyn TimestampRefiner>>,
}

impl CensorPipeline {
    /// Validate the configuration and build a pipeline.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let refiner: Option<Box<dyn TimestampRefiner>> = if config.filters.refiner_enabled {
            Some(Box::new(EnergyRefiner))
        } else {
            None
        };
        Ok(Self {
            config,
            reporter: Arc::new(LogReporter),
            refiner,
        })
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Sets a custom timestamp refiner (implies refinement is enabled).
    pub fn with_refiner(mut self, refiner: Box<dyn TimestampRefiner>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Allocate buffers, spawn the worker, and start the pipeline.
    ///
    /// # Returns
    /// The [`Scheduler`] to be driven by the audio host and a handle for
    /// control and stats polling.
    pub fn start(
        self,
        recognizer: Arc<dyn SpeechRecognizer>,
        lexicon: Arc<dyn Lexicon>,
    ) -> Result<(Scheduler, PipelineHandle)> {
        let CensorPipeline {
            config,
            reporter,
            refiner,
        } = self;
        let channels = config.audio.channels;

        let ring = Arc::new(DelayRing::new(channels, config.ring_capacity()));
        let stats = Arc::new(PipelineStats::new(config.censor.mode));
        stats.set_latency_ms((config.pipeline.target_delay_seconds * 1000.0) as f32);

        if recognizer.sample_rate() != config.asr.sample_rate {
            return Err(BleepError::ConfigInvalidValue {
                key: "asr.sample_rate".to_string(),
                message: format!(
                    "recognizer expects {} Hz, configured {}",
                    recognizer.sample_rate(),
                    config.asr.sample_rate
                ),
            });
        }
        let resampler = LinearResampler::new(config.audio.sample_rate, config.asr.sample_rate)?;
        let vocal = if config.filters.vocal_filter_enabled {
            Some(VocalFilter::new(config.audio.sample_rate)?)
        } else {
            None
        };

        let h = handoff(config.chunk_samples());
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker = CensorWorker {
            ring: ring.clone(),
            stats: stats.clone(),
            chunk_rx: h.chunk_rx,
            recycle_tx: h.recycle_tx,
            shutdown: shutdown.clone(),
            recognizer,
            lexicon,
            refiner,
            vocal,
            resampler,
            reporter,
            sample_rate: config.audio.sample_rate,
            chunk_seconds: config.pipeline.chunk_seconds,
            pad_pre_s: config.censor.pad_pre_ms as f64 / 1000.0,
            pad_post_s: config.censor.pad_post_ms as f64 / 1000.0,
            fade_max: config.censor.fade_samples_max,
            reverse_gain: config.censor.reverse_gain,
        };

        let join = thread::Builder::new()
            .name("bleep-censor".to_string())
            .spawn(move || worker.run())
            .map_err(|e| BleepError::Pipeline {
                message: format!("failed to spawn censor worker: {}", e),
            })?;

        stats.set_running(true);
        let scheduler = Scheduler::new(
            ring.clone(),
            stats.clone(),
            h.chunk_tx,
            h.recycle_rx,
            &config,
        );
        let handle = PipelineHandle {
            shutdown,
            worker: Some(join),
            stats,
            ring,
        };
        Ok((scheduler, handle))
    }
}

/// Handle to a running censor pipeline.
pub struct PipelineHandle {
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    stats: Arc<PipelineStats>,
    ring: Arc<DelayRing>,
}

impl PipelineHandle {
    /// Pollable snapshot of the observability surface.
    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns true while the worker is alive and no fatal error occurred.
    pub fn is_running(&self) -> bool {
        self.stats.is_running()
    }

    /// Switch the censor mode; takes effect from the next chunk.
    pub fn set_censor_mode(&self, mode: CensorMode) {
        self.stats.set_censor_mode(mode);
    }

    /// Stop the pipeline: signal the worker, join it, and stop the ring.
    ///
    /// An in-flight transcription runs to completion; its output lands in a
    /// ring that no longer plays.
    pub fn stop(mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(join) = self.worker.take() {
            let _ = join.join();
        }
        self.ring.stop();
        self.stats.set_running(false);
    }
}
