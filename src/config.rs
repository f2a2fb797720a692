//! Runtime configuration for the censor pipeline.
//!
//! All values are optional in the TOML file; missing fields fall back to the
//! defaults in [`crate::defaults`]. Validation happens once, at pipeline
//! construction, and produces configuration errors (never panics).

use crate::defaults;
use crate::dsp::censor::CensorMode;
use crate::error::{BleepError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub pipeline: PipelineConfig,
    pub censor: CensorConfig,
    pub asr: AsrConfig,
    pub filters: FilterConfig,
}

/// Audio device and format configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub input_device: Option<String>,
    pub output_device: Option<String>,
    pub sample_rate: u32,
    pub channels: usize,
    pub period_size: usize,
}

/// Delay-buffer and chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub chunk_seconds: f64,
    pub target_delay_seconds: f64,
    pub pause_hysteresis_seconds: f64,
}

/// Censorship DSP configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CensorConfig {
    pub mode: CensorMode,
    pub pad_pre_ms: u32,
    pub pad_post_ms: u32,
    pub fade_samples_max: usize,
    pub reverse_gain: f32,
}

/// Speech recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AsrConfig {
    pub sample_rate: u32,
    pub model: PathBuf,
    pub language: String,
}

/// Optional preprocessing stages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub vocal_filter_enabled: bool,
    pub refiner_enabled: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input_device: None,
            output_device: None,
            sample_rate: defaults::SAMPLE_RATE,
            channels: defaults::CHANNELS,
            period_size: defaults::PERIOD_SIZE,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_seconds: defaults::CHUNK_SECONDS,
            target_delay_seconds: defaults::TARGET_DELAY_SECONDS,
            pause_hysteresis_seconds: defaults::PAUSE_HYSTERESIS_SECONDS,
        }
    }
}

impl Default for CensorConfig {
    fn default() -> Self {
        Self {
            mode: CensorMode::Reverse,
            pad_pre_ms: defaults::PAD_PRE_MS,
            pad_post_ms: defaults::PAD_POST_MS,
            fade_samples_max: defaults::FADE_SAMPLES_MAX,
            reverse_gain: defaults::REVERSE_GAIN,
        }
    }
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::ASR_SAMPLE_RATE,
            model: PathBuf::from(defaults::DEFAULT_MODEL),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            vocal_filter_enabled: false,
            refiner_enabled: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields use default values. Returns an error if the file does
    /// not exist or contains invalid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BleepError::ConfigFileNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| BleepError::Other(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Validate the configuration.
    ///
    /// Called once at pipeline construction; every violation here is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(invalid("audio.sample_rate", "must be positive"));
        }
        if self.audio.channels == 0 || self.audio.channels > 2 {
            return Err(invalid("audio.channels", "must be 1 or 2"));
        }
        if self.audio.period_size == 0 {
            return Err(invalid("audio.period_size", "must be positive"));
        }
        if self.pipeline.chunk_seconds <= 0.0 {
            return Err(invalid("pipeline.chunk_seconds", "must be positive"));
        }
        if self.pipeline.target_delay_seconds < self.pipeline.chunk_seconds {
            return Err(invalid(
                "pipeline.target_delay_seconds",
                "must be at least chunk_seconds",
            ));
        }
        if self.pipeline.pause_hysteresis_seconds < 0.0
            || self.pipeline.pause_hysteresis_seconds > self.pipeline.target_delay_seconds
        {
            return Err(invalid(
                "pipeline.pause_hysteresis_seconds",
                "must be within [0, target_delay_seconds]",
            ));
        }
        if self.asr.sample_rate == 0 {
            return Err(invalid("asr.sample_rate", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.censor.reverse_gain) {
            return Err(invalid("censor.reverse_gain", "must be within [0, 1]"));
        }
        Ok(())
    }

    /// Samples per ASR chunk at the system rate.
    pub fn chunk_samples(&self) -> usize {
        (self.audio.sample_rate as f64 * self.pipeline.chunk_seconds) as usize
    }

    /// Playback delay in samples.
    pub fn target_delay_samples(&self) -> u64 {
        (self.audio.sample_rate as f64 * self.pipeline.target_delay_seconds) as u64
    }

    /// Fill level below which playback pauses, in samples.
    pub fn pause_low_samples(&self) -> u64 {
        let low = self.pipeline.target_delay_seconds - self.pipeline.pause_hysteresis_seconds;
        (self.audio.sample_rate as f64 * low.max(0.0)) as u64
    }

    /// Delay-ring capacity in frames: target delay plus headroom.
    pub fn ring_capacity(&self) -> usize {
        let seconds = self.pipeline.target_delay_seconds + defaults::RING_HEADROOM_SECONDS;
        (self.audio.sample_rate as f64 * seconds) as usize
    }
}

fn invalid(key: &str, message: &str) -> BleepError {
    BleepError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
