//! Sample-rate conversion for the ASR path.
//!
//! The recognizer expects a fixed rate (commonly 16kHz) while the pipeline
//! runs at the device rate. Conversion happens on the worker thread, where
//! allocation is allowed. Linear interpolation is plenty for speech
//! recognition input; when the rates already match the converter is a
//! passthrough.

use crate::error::{BleepError, Result};

/// Converts f32 mono audio from one fixed sample rate to another.
#[derive(Debug, Clone)]
pub struct LinearResampler {
    source_rate: u32,
    target_rate: u32,
}

impl LinearResampler {
    /// Create a converter from `source_rate` to `target_rate` Hz.
    ///
    /// # Errors
    /// Returns `BleepError::Resample` if either rate is zero.
    pub fn new(source_rate: u32, target_rate: u32) -> Result<Self> {
        if source_rate == 0 || target_rate == 0 {
            return Err(BleepError::Resample {
                message: format!("invalid rates: {} -> {}", source_rate, target_rate),
            });
        }
        Ok(Self {
            source_rate,
            target_rate,
        })
    }

    /// True when no conversion is needed.
    pub fn is_passthrough(&self) -> bool {
        self.source_rate == self.target_rate
    }

    /// Source-rate offset corresponding to target-rate sample index `j`.
    pub fn source_offset(&self, j: usize) -> f64 {
        j as f64 * self.source_rate as f64 / self.target_rate as f64
    }

    /// Resample `input` into a new buffer at the target rate.
    pub fn resample(&self, input: &[f32]) -> Vec<f32> {
        if self.is_passthrough() {
            return input.to_vec();
        }
        let ratio = self.source_rate as f64 / self.target_rate as f64;
        let out_len = (input.len() as f64 / ratio) as usize;
        let mut output = Vec::with_capacity(out_len);
        for j in 0..out_len {
            let src_pos = j as f64 * ratio;
            let idx = src_pos as usize;
            let frac = (src_pos - idx as f64) as f32;
            let sample = if idx + 1 < input.len() {
                input[idx] * (1.0 - frac) + input[idx + 1] * frac
            } else if idx < input.len() {
                input[idx]
            } else {
                break;
            };
            output.push(sample);
        }
        output
    }
}
