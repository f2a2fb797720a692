//! Censorship DSP: mute and reverse span processors with linear fades.

use serde::{Deserialize, Serialize};

/// How a censored span is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CensorMode {
    /// Replace the span with silence.
    Mute,
    /// Replace the span with the attenuated, time-reversed original.
    #[default]
    Reverse,
}

impl CensorMode {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            CensorMode::Mute => 0,
            CensorMode::Reverse => 1,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => CensorMode::Mute,
            _ => CensorMode::Reverse,
        }
    }
}

/// Fade length for a span: `min(fade_max, len / 4)`.
///
/// A quarter-length cap keeps short intervals from being all fade.
pub fn fade_len(span_len: usize, fade_max: usize) -> usize {
    fade_max.min(span_len / 4)
}

/// Linear fade envelope at position `i` of an `n`-sample span.
///
/// Ramps 0 → 1 over the first `fade` samples and 1 → 0 over the last.
#[inline]
fn envelope(i: usize, n: usize, fade: usize) -> f32 {
    if fade == 0 {
        return 1.0;
    }
    if i < fade {
        i as f32 / fade as f32
    } else if i >= n - fade {
        (n - i) as f32 / fade as f32
    } else {
        1.0
    }
}

/// Replace the span with silence.
///
/// The replacement body is zero, so the fade ramp degenerates to silence
/// across the whole interval; re-applying is a no-op.
pub fn mute_span(span: &mut [f32]) {
    span.fill(0.0);
}

/// Replace the span with the time-reversed original, attenuated by `gain`,
/// with a linear fade-in and fade-out of `fade` samples.
pub fn reverse_span(span: &mut [f32], fade: usize, gain: f32) {
    span.reverse();
    let n = span.len();
    for (i, sample) in span.iter_mut().enumerate() {
        *sample *= gain * envelope(i, n, fade);
    }
}

/// Apply `mode` to the span in place.
pub fn censor_span(span: &mut [f32], mode: CensorMode, fade: usize, reverse_gain: f32) {
    match mode {
        CensorMode::Mute => mute_span(span),
        CensorMode::Reverse => reverse_span(span, fade, reverse_gain),
    }
}
