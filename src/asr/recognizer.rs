//! Speech recognition trait and test double.

use crate::error::{BleepError, Result};
use std::sync::{Arc, Mutex};

/// One word token inside a recognized segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentWord {
    /// Token index within the segment.
    pub id: i32,
    /// Raw token text as produced by the engine.
    pub text: String,
}

/// A recognized span of speech.
///
/// Times are in seconds, relative to the start of the submitted buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub t0: f64,
    pub t1: f64,
    pub words: Vec<SegmentWord>,
}

impl Segment {
    /// Convenience constructor used widely in tests.
    pub fn new(t0: f64, t1: f64, words: &[&str]) -> Self {
        Self {
            t0,
            t1,
            words: words
                .iter()
                .enumerate()
                .map(|(i, text)| SegmentWord {
                    id: i as i32,
                    text: (*text).to_string(),
                })
                .collect(),
        }
    }
}

/// Trait for speech recognition engines.
///
/// This trait allows swapping implementations (real Whisper vs mock). The
/// engine is called from the worker thread only, concurrently with audio I/O.
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe mono f32 PCM at the engine's expected sample rate.
    ///
    /// # Returns
    /// Zero or more segments with buffer-relative timestamps, or an error.
    /// An error is transient: the caller treats the chunk as pass-through.
    fn transcribe(&self, pcm: &[f32]) -> Result<Vec<Segment>>;

    /// Sample rate the engine expects, in Hz.
    fn sample_rate(&self) -> u32;

    /// Get the name of the loaded model.
    fn model_name(&self) -> &str;

    /// Check if the recognizer is ready.
    fn is_ready(&self) -> bool;
}

/// Implement SpeechRecognizer for Arc<T> to allow sharing across threads.
impl<T: SpeechRecognizer> SpeechRecognizer for Arc<T> {
    fn transcribe(&self, pcm: &[f32]) -> Result<Vec<Segment>> {
        (**self).transcribe(pcm)
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock recognizer for testing.
pub struct MockRecognizer {
    model_name: String,
    sample_rate: u32,
    /// Responses consumed one per call; empty once drained.
    script: Mutex<Vec<Vec<Segment>>>,
    /// Response repeated on every call when the script is empty.
    repeated: Vec<Segment>,
    should_fail: bool,
}

impl MockRecognizer {
    /// Create a mock that recognizes nothing.
    pub fn new() -> Self {
        Self {
            model_name: "mock".to_string(),
            sample_rate: 16_000,
            script: Mutex::new(Vec::new()),
            repeated: Vec::new(),
            should_fail: false,
        }
    }

    /// Return the given segments on every call.
    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.repeated = segments;
        self
    }

    /// Return each element once, in order, then fall back to `repeated`.
    pub fn with_script(self, script: Vec<Vec<Segment>>) -> Self {
        let mut stored = script;
        stored.reverse(); // pop() consumes front-first
        *self.script.lock().unwrap() = stored;
        self
    }

    /// Configure the mock to fail on transcribe.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Override the expected sample rate.
    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }
}

impl Default for MockRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechRecognizer for MockRecognizer {
    fn transcribe(&self, _pcm: &[f32]) -> Result<Vec<Segment>> {
        if self.should_fail {
            return Err(BleepError::Recognition {
                message: "mock recognition failure".to_string(),
            });
        }
        if let Some(next) = self.script.lock().unwrap().pop() {
            return Ok(next);
        }
        Ok(self.repeated.clone())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_returns_repeated_segments() {
        let segments = vec![Segment::new(0.5, 1.0, &["hello"])];
        let mock = MockRecognizer::new().with_segments(segments.clone());

        assert_eq!(mock.transcribe(&[0.0; 100]).unwrap(), segments);
        assert_eq!(mock.transcribe(&[0.0; 100]).unwrap(), segments);
    }

    #[test]
    fn test_mock_script_consumed_in_order() {
        let first = vec![Segment::new(0.0, 1.0, &["one"])];
        let second = vec![Segment::new(1.0, 2.0, &["two"])];
        let mock = MockRecognizer::new().with_script(vec![first.clone(), second.clone()]);

        assert_eq!(mock.transcribe(&[]).unwrap(), first);
        assert_eq!(mock.transcribe(&[]).unwrap(), second);
        assert!(mock.transcribe(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_mock_failure() {
        let mock = MockRecognizer::new().with_failure();
        assert!(!mock.is_ready());
        assert!(matches!(
            mock.transcribe(&[]),
            Err(BleepError::Recognition { .. })
        ));
    }

    #[test]
    fn test_segment_constructor_numbers_words() {
        let segment = Segment::new(0.1, 0.9, &["mother", "trucker"]);
        assert_eq!(segment.words.len(), 2);
        assert_eq!(segment.words[0].id, 0);
        assert_eq!(segment.words[1].id, 1);
        assert_eq!(segment.words[1].text, "trucker");
    }

    #[test]
    fn test_trait_is_object_safe() {
        let recognizer: Box<dyn SpeechRecognizer> = Box::new(MockRecognizer::new());
        assert_eq!(recognizer.sample_rate(), 16_000);
        assert_eq!(recognizer.model_name(), "mock");
        assert!(recognizer.transcribe(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_arc_forwarding() {
        let recognizer = Arc::new(MockRecognizer::new().with_sample_rate(8_000));
        assert_eq!(SpeechRecognizer::sample_rate(&recognizer), 8_000);
    }
}
