//! Word-level timing and token normalization.
//!
//! Engines that only report segment-level timing get their words spread
//! evenly across the segment; tokens are normalized into the form the lexicon
//! stores before lookup.

use crate::asr::recognizer::Segment;
use crate::defaults;

/// A word with chunk-relative timing.
#[derive(Debug, Clone, PartialEq)]
pub struct WordSegment {
    pub text: String,
    pub start_s: f64,
    pub end_s: f64,
    pub confidence: f32,
}

/// Confidence assigned to evenly-distributed words.
const DISTRIBUTED_CONFIDENCE: f32 = 0.9;

/// Flatten segments into timed words.
///
/// A segment of duration `d` containing `k` words yields `k` equal slices of
/// `d / k`. Words are clamped into `[0, chunk_seconds]`; each keeps at least
/// a 50ms duration except where the chunk boundary cuts it short.
pub fn distribute_words(segments: &[Segment], chunk_seconds: f64) -> Vec<WordSegment> {
    let mut words = Vec::new();
    for segment in segments {
        if segment.words.is_empty() {
            continue;
        }
        let duration = segment.t1 - segment.t0;
        let slice = duration / segment.words.len() as f64;
        for (k, word) in segment.words.iter().enumerate() {
            if word.text.is_empty() {
                continue;
            }
            let start = (segment.t0 + k as f64 * slice).clamp(0.0, chunk_seconds);
            let end = (start + slice)
                .max(start + defaults::MIN_WORD_SECONDS)
                .min(chunk_seconds);
            words.push(WordSegment {
                text: word.text.clone(),
                start_s: start,
                end_s: end,
                confidence: DISTRIBUTED_CONFIDENCE,
            });
        }
    }
    words
}

/// Normalize a token for lexicon lookup.
///
/// Lowercases, maps smart quotes to their ASCII forms, drops zero-width
/// characters, and keeps only `[a-z0-9'-]`. Whitespace and punctuation
/// vanish, so a two-word phrase normalizes to its concatenation.
pub fn normalize_token(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        let c = match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{200B}'..='\u{200D}' | '\u{FEFF}' => continue,
            c => c,
        };
        for lower in c.to_lowercase() {
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() || lower == '\'' || lower == '-'
            {
                out.push(lower);
            }
        }
    }
    out
}
