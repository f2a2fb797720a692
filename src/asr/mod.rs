//! Speech recognition: the engine seam, word timing, and the Whisper backend.

pub mod recognizer;
pub mod whisper;
pub mod words;

pub use recognizer::{MockRecognizer, Segment, SegmentWord, SpeechRecognizer};
pub use whisper::{WhisperConfig, WhisperRecognizer};
pub use words::{WordSegment, distribute_words, normalize_token};
