//! Default configuration constants for bleep.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default system sample rate in Hz.
///
/// 48kHz is the native rate of most consumer interfaces and the rate the
/// delay ring, scheduler and censor DSP operate at.
pub const SAMPLE_RATE: u32 = 48_000;

/// Default channel count (stereo).
pub const CHANNELS: usize = 2;

/// Default frames per host callback.
pub const PERIOD_SIZE: usize = 512;

/// Default ASR chunk length in seconds.
///
/// Five seconds is long enough for Whisper to produce stable word timings
/// and short enough to fit inside the playback delay with headroom.
pub const CHUNK_SECONDS: f64 = 5.0;

/// Default playback delay in seconds.
///
/// Must cover `CHUNK_SECONDS` plus the worst-case transcription time so the
/// worker can censor a span before the read cursor reaches it.
pub const TARGET_DELAY_SECONDS: f64 = 10.0;

/// Default pause hysteresis in seconds.
///
/// Playback pauses when the buffered audio drops below
/// `TARGET_DELAY_SECONDS - PAUSE_HYSTERESIS_SECONDS` and resumes only once it
/// has recovered to the full target, preventing rapid pause/resume toggling
/// when transcription time fluctuates.
pub const PAUSE_HYSTERESIS_SECONDS: f64 = 2.0;

/// Extra ring capacity beyond the target delay, in seconds.
///
/// Keeps a span addressable for a while after the read cursor's target has
/// moved past it, so a slow transcription can still land its censor ops.
pub const RING_HEADROOM_SECONDS: f64 = 10.0;

/// Padding applied before a detected word, in milliseconds.
///
/// ASR word onsets run late more often than early; the asymmetry is
/// empirically tuned.
pub const PAD_PRE_MS: u32 = 400;

/// Padding applied after a detected word, in milliseconds.
pub const PAD_POST_MS: u32 = 100;

/// Maximum fade length in samples (~10ms at 48kHz).
///
/// The actual fade is `min(FADE_SAMPLES_MAX, interval_len / 4)`.
pub const FADE_SAMPLES_MAX: usize = 480;

/// Gain applied to reversed audio in Reverse mode.
///
/// Reversed speech at full level draws attention to itself.
pub const REVERSE_GAIN: f32 = 0.5;

/// Sample rate expected by the ASR engine in Hz.
pub const ASR_SAMPLE_RATE: u32 = 16_000;

/// Minimum duration assigned to a distributed word, in seconds.
pub const MIN_WORD_SECONDS: f64 = 0.05;

/// Search window for energy-based timestamp refinement, in milliseconds.
pub const REFINE_WINDOW_MS: u32 = 150;

/// Analysis window used by the energy refiner, in milliseconds.
pub const REFINE_FRAME_MS: u32 = 10;

/// Vocal isolation band-pass corner frequencies in Hz.
pub const VOCAL_BAND_LOW_HZ: f32 = 150.0;
pub const VOCAL_BAND_HIGH_HZ: f32 = 5_000.0;

/// Default Whisper model file.
pub const DEFAULT_MODEL: &str = "models/ggml-tiny.en.bin";

/// Default language code for transcription.
pub const DEFAULT_LANGUAGE: &str = "en";

/// How long the worker sleeps between shutdown checks while idle, in ms.
pub const WORKER_POLL_MS: u64 = 100;
