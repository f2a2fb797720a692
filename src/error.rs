//! Error types for bleep.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BleepError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio device errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio stream failed: {message}")]
    AudioStream { message: String },

    // Recognizer errors
    #[error("Recognizer model not found at {path}")]
    RecognizerModelNotFound { path: String },

    #[error("Recognition failed: {message}")]
    Recognition { message: String },

    // DSP errors
    #[error("Resampler error: {message}")]
    Resample { message: String },

    #[error("Vocal filter error: {message}")]
    VocalFilter { message: String },

    // Lexicon errors
    #[error("Lexicon file not found at {path}")]
    LexiconNotFound { path: String },

    // Pipeline lifecycle errors
    #[error("Pipeline error: {message}")]
    Pipeline { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, BleepError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = BleepError::ConfigFileNotFound {
            path: "/etc/bleep.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /etc/bleep.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = BleepError::ConfigInvalidValue {
            key: "target_delay_seconds".to_string(),
            message: "must cover chunk_seconds".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for target_delay_seconds: must cover chunk_seconds"
        );
    }

    #[test]
    fn test_audio_device_not_found_display() {
        let error = BleepError::AudioDeviceNotFound {
            device: "default".to_string(),
        };
        assert_eq!(error.to_string(), "Audio device not found: default");
    }

    #[test]
    fn test_audio_stream_display() {
        let error = BleepError::AudioStream {
            message: "output stream build failed".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Audio stream failed: output stream build failed"
        );
    }

    #[test]
    fn test_recognizer_model_not_found_display() {
        let error = BleepError::RecognizerModelNotFound {
            path: "/models/ggml-tiny.en.bin".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Recognizer model not found at /models/ggml-tiny.en.bin"
        );
    }

    #[test]
    fn test_recognition_display() {
        let error = BleepError::Recognition {
            message: "inference failed".to_string(),
        };
        assert_eq!(error.to_string(), "Recognition failed: inference failed");
    }

    #[test]
    fn test_resample_display() {
        let error = BleepError::Resample {
            message: "zero target rate".to_string(),
        };
        assert_eq!(error.to_string(), "Resampler error: zero target rate");
    }

    #[test]
    fn test_lexicon_not_found_display() {
        let error = BleepError::LexiconNotFound {
            path: "words.txt".to_string(),
        };
        assert_eq!(error.to_string(), "Lexicon file not found at words.txt");
    }

    #[test]
    fn test_pipeline_display() {
        let error = BleepError::Pipeline {
            message: "worker exited".to_string(),
        };
        assert_eq!(error.to_string(), "Pipeline error: worker exited");
    }

    #[test]
    fn test_other_display() {
        let error = BleepError::Other("unexpected error".to_string());
        assert_eq!(error.to_string(), "unexpected error");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: BleepError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: BleepError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: BleepError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<BleepError>();
        assert_sync::<BleepError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
