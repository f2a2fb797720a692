//! Vocal isolation: an in-place band-pass applied to the ASR-bound copy.
//!
//! Two cascaded RBJ biquads (high-pass at 150Hz, low-pass at 5kHz) strip
//! rumble and hiss outside the speech band. The filter only ever touches the
//! worker's private chunk copy; the samples in the delay ring are untouched.

use crate::defaults;
use crate::error::{BleepError, Result};

/// Second-order IIR section, transposed direct form II.
#[derive(Debug, Clone)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

/// Butterworth Q for a single second-order section.
const SECTION_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

impl Biquad {
    fn low_pass(sample_rate: f32, cutoff: f32) -> Self {
        let omega = 2.0 * std::f32::consts::PI * cutoff / sample_rate;
        let alpha = omega.sin() / (2.0 * SECTION_Q);
        let cos_w = omega.cos();
        let a0 = 1.0 + alpha;
        Self {
            b0: ((1.0 - cos_w) / 2.0) / a0,
            b1: (1.0 - cos_w) / a0,
            b2: ((1.0 - cos_w) / 2.0) / a0,
            a1: (-2.0 * cos_w) / a0,
            a2: (1.0 - alpha) / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    fn high_pass(sample_rate: f32, cutoff: f32) -> Self {
        let omega = 2.0 * std::f32::consts::PI * cutoff / sample_rate;
        let alpha = omega.sin() / (2.0 * SECTION_Q);
        let cos_w = omega.cos();
        let a0 = 1.0 + alpha;
        Self {
            b0: ((1.0 + cos_w) / 2.0) / a0,
            b1: (-(1.0 + cos_w)) / a0,
            b2: ((1.0 + cos_w) / 2.0) / a0,
            a1: (-2.0 * cos_w) / a0,
            a2: (1.0 - alpha) / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    fn tick(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// Band-pass vocal isolation filter.
#[derive(Debug, Clone)]
pub struct VocalFilter {
    high_pass: Biquad,
    low_pass: Biquad,
}

impl VocalFilter {
    /// Create a filter for the given system sample rate.
    ///
    /// # Errors
    /// Returns `BleepError::VocalFilter` when the upper band edge does not
    /// fit below the Nyquist frequency.
    pub fn new(sample_rate: u32) -> Result<Self> {
        let nyquist = sample_rate as f32 / 2.0;
        if defaults::VOCAL_BAND_HIGH_HZ >= nyquist {
            return Err(BleepError::VocalFilter {
                message: format!(
                    "band edge {}Hz exceeds Nyquist for {}Hz",
                    defaults::VOCAL_BAND_HIGH_HZ,
                    sample_rate
                ),
            });
        }
        Ok(Self {
            high_pass: Biquad::high_pass(sample_rate as f32, defaults::VOCAL_BAND_LOW_HZ),
            low_pass: Biquad::low_pass(sample_rate as f32, defaults::VOCAL_BAND_HIGH_HZ),
        })
    }

    /// Clear filter state; call between independent chunks.
    pub fn reset(&mut self) {
        self.high_pass.reset();
        self.low_pass.reset();
    }

    /// Filter the buffer in place.
    pub fn process(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.low_pass.tick(self.high_pass.tick(*sample));
        }
    }
}
