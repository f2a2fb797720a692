//! Input level metering.

/// RMS of channel 0 over a block of interleaved frames.
///
/// Returns 0.0 for an empty block.
pub fn rms_channel0(interleaved: &[f32], channels: usize) -> f32 {
    debug_assert!(channels > 0);
    let frames = interleaved.len() / channels;
    if frames == 0 {
        return 0.0;
    }
    let mut sum = 0.0f32;
    for f in 0..frames {
        let sample = interleaved[f * channels];
        sum += sample * sample;
    }
    (sum / frames as f32).sqrt()
}

/// Mono downmix of one interleaved frame: the mean of its channels.
#[inline]
pub fn downmix_frame(frame: &[f32]) -> f32 {
    debug_assert!(!frame.is_empty());
    frame.iter().sum::<f32>() / frame.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_of_silence_is_zero() {
        assert_eq!(rms_channel0(&[0.0; 64], 2), 0.0);
    }

    #[test]
    fn test_rms_of_constant_signal() {
        // Stereo, channel 0 at 0.5, channel 1 ignored.
        let block: Vec<f32> = (0..32).flat_map(|_| [0.5, 0.9]).collect();
        let rms = rms_channel0(&block, 2);
        assert!((rms - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rms_empty_block() {
        assert_eq!(rms_channel0(&[], 2), 0.0);
    }

    #[test]
    fn test_downmix_averages_channels() {
        assert_eq!(downmix_frame(&[0.2, 0.6]), 0.4);
        assert_eq!(downmix_frame(&[0.8]), 0.8);
    }
}
