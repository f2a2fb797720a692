//! bleep - real-time audio profanity censor
//!
//! Audio enters continuously, sits in a delay ring for a configurable number
//! of seconds, and leaves censored: while a span is still buffered, a
//! background worker transcribes it, looks its words up in a lexicon, and
//! mutes or reverses the offending intervals before playback reaches them.

pub mod asr;
pub mod audio;
pub mod config;
pub mod defaults;
pub mod dsp;
pub mod error;
pub mod lexicon;
pub mod pipeline;

pub use config::Config;
pub use dsp::CensorMode;
pub use error::{BleepError, Result};
pub use lexicon::{Lexicon, SetLexicon};
pub use pipeline::{CensorPipeline, PipelineHandle, Scheduler, StatsSnapshot};
