use std::path::PathBuf;
use thiserror::Error;

/// Bad input caught before any external service is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown voice '{0}' (expected one of: Puck, Charon, Kore, Fenrir, Aoede)")]
    UnknownVoice(String),

    #[error("unknown aspect ratio '{0}' (expected one of: 9:16, 4:5, 16:9, 1:1)")]
    UnknownAspectRatio(String),

    #[error("unknown quality '{0}' (expected 'high' or 'standard')")]
    UnknownQuality(String),

    #[error("script text is empty")]
    EmptyScript,

    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("dataset '{dataset}' contains no {kind} files")]
    EmptyDataset { dataset: String, kind: &'static str },
}

/// A composition that cannot be planned. Fatal for that one video, never for a batch.
#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("background footage has no usable duration ({0:.3}s)")]
    EmptyBackground(f64),

    #[error("music track has no usable duration ({0:.3}s)")]
    EmptyMusic(f64),

    #[error("narration duration must be positive, got {0:.3}s")]
    InvalidNarration(f64),

    #[error("invalid frame size {width}x{height}")]
    InvalidFrame { width: u32, height: u32 },
}

const QUOTA_INDICATORS: &[&str] = &[
    "quota",
    "429",
    "resource_exhausted",
    "rate_limit",
    "too many requests",
];

const AUTH_INDICATORS: &[&str] = &[
    "api key",
    "authentication",
    "unauthorized",
    "invalid key",
    "permission denied",
];

/// Failure of the speech synthesis service.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech service is rate limited: {0}")]
    RateLimited(String),

    #[error("speech service rejected the API key: {0}")]
    Authentication(String),

    #[error("generation cancelled by user")]
    Cancelled,

    #[error("text input is empty")]
    EmptyText,

    #[error("speech service failed: {0}")]
    Service(String),

    #[error("could not decode synthesized audio: {0}")]
    Decode(String),

    #[error("could not write synthesized audio: {0}")]
    Io(String),
}

impl SpeechError {
    /// Map a raw provider message onto the error taxonomy by case-insensitive substring
    /// match. Quota indicators win over authentication ones.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if QUOTA_INDICATORS.iter().any(|needle| lowered.contains(needle)) {
            SpeechError::RateLimited(message)
        } else if AUTH_INDICATORS.iter().any(|needle| lowered.contains(needle)) {
            SpeechError::Authentication(message)
        } else {
            SpeechError::Service(message)
        }
    }

    /// Whether retrying with the next API key may help.
    pub fn should_rotate(&self) -> bool {
        matches!(
            self,
            SpeechError::RateLimited(_) | SpeechError::Authentication(_)
        )
    }
}
