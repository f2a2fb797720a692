//! Whisper-based speech recognition.
//!
//! This module provides a Whisper implementation of the SpeechRecognizer
//! trait using whisper-rs.
//!
//! # Feature Gate
//!
//! This module requires the `whisper` feature to be enabled and cmake to be
//! installed:
//!
//! ```bash
//! cargo build --features whisper
//! ```

use crate::asr::recognizer::{Segment, SpeechRecognizer};
use crate::defaults;
use crate::error::{BleepError, Result};
use std::path::PathBuf;

#[cfg(feature = "whisper")]
use crate::asr::recognizer::SegmentWord;

#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Configuration for the Whisper recognizer.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Path to the Whisper model file.
    pub model_path: PathBuf,
    /// Language code (e.g., "en", "es", "fr").
    pub language: String,
    /// Number of threads for inference (None = auto-detect).
    pub threads: Option<usize>,
    /// Whether to use GPU acceleration.
    pub use_gpu: bool,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(defaults::DEFAULT_MODEL),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            threads: None,
            use_gpu: false,
        }
    }
}

/// Whisper-based recognizer.
///
/// Configured for word-granular output: greedy sampling with one-token
/// segments, so every returned [`Segment`] carries its own timestamps. The
/// WhisperContext is wrapped in a Mutex to ensure thread safety.
#[cfg(feature = "whisper")]
pub struct WhisperRecognizer {
    context: Mutex<WhisperContext>,
    config: WhisperConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRecognizer")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Whisper recognizer placeholder (without the whisper feature).
///
/// This is a stub that returns errors when used. Enable the `whisper`
/// feature for real recognition.
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperRecognizer {
    config: WhisperConfig,
    model_name: String,
}

fn model_name_from(config: &WhisperConfig) -> String {
    config
        .model_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(feature = "whisper")]
impl WhisperRecognizer {
    /// Load a Whisper model.
    ///
    /// # Errors
    /// Returns `BleepError::RecognizerModelNotFound` if the model file
    /// doesn't exist, `BleepError::Recognition` if loading fails.
    pub fn new(config: WhisperConfig) -> Result<Self> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !config.model_path.exists() {
            return Err(BleepError::RecognizerModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = model_name_from(&config);

        let mut context_params = WhisperContextParameters::default();
        context_params.use_gpu(config.use_gpu);
        let context = WhisperContext::new_with_params(
            config
                .model_path
                .to_str()
                .ok_or_else(|| BleepError::Recognition {
                    message: "Invalid UTF-8 in model path".to_string(),
                })?,
            context_params,
        )
        .map_err(|e| BleepError::Recognition {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        Ok(Self {
            context: Mutex::new(context),
            config,
            model_name,
        })
    }

    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperRecognizer {
    /// Create a Whisper recognizer (stub implementation).
    pub fn new(config: WhisperConfig) -> Result<Self> {
        if !config.model_path.exists() {
            return Err(BleepError::RecognizerModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }
        let model_name = model_name_from(&config);
        Ok(Self { config, model_name })
    }

    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }
}

#[cfg(feature = "whisper")]
impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(&self, pcm: &[f32]) -> Result<Vec<Segment>> {
        let context = self
            .context
            .lock()
            .map_err(|e| BleepError::Recognition {
                message: format!("Failed to acquire context lock: {}", e),
            })?;

        let mut state = context.create_state().map_err(|e| BleepError::Recognition {
            message: format!("Failed to create Whisper state: {}", e),
        })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(&self.config.language));
        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }
        // One token per segment: word-level timestamps without DTW.
        params.set_max_len(1);
        params.set_token_timestamps(true);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state.full(params, pcm).map_err(|e| BleepError::Recognition {
            message: format!("Whisper inference failed: {}", e),
        })?;

        let mut segments = Vec::new();
        for segment in state.as_iter() {
            // Centiseconds relative to the buffer start.
            let t0 = segment.start_timestamp() as f64 * 0.01;
            let t1 = segment.end_timestamp() as f64 * 0.01;

            let mut words = Vec::new();
            for i in 0..segment.n_tokens() {
                let Some(token) = segment.get_token(i) else {
                    continue;
                };
                let text = match token.to_str_lossy() {
                    Ok(t) => t.into_owned(),
                    Err(_) => continue,
                };
                // Skip special tokens
                if text.is_empty() || text.starts_with("<|") || text.starts_with("[_") {
                    continue;
                }
                words.push(SegmentWord { id: i, text });
            }

            if !words.is_empty() {
                segments.push(Segment { t0, t1, words });
            }
        }
        Ok(segments)
    }

    fn sample_rate(&self) -> u32 {
        defaults::ASR_SAMPLE_RATE
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(not(feature = "whisper"))]
impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(&self, _pcm: &[f32]) -> Result<Vec<Segment>> {
        Err(BleepError::Recognition {
            message: "Whisper support not compiled in. Rebuild with --features whisper"
                .to_string(),
        })
    }

    fn sample_rate(&self) -> u32 {
        defaults::ASR_SAMPLE_RATE
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        false
    }
}
