//! Narration synthesis: the speech service seam, the Gemini client, WAV output and API
//! key rotation.

mod cancel;
mod credentials;
mod gemini;
mod wav;

pub use cancel::CancellationFlag;
pub use credentials::{CredentialRotator, SharedCredentials};
pub use gemini::GeminiSynthesizer;
pub use wav::PcmAudio;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::ui::prelude::*;
use crate::video::errors::{SpeechError, ValidationError};

const WORDS_PER_MINUTE: f64 = 150.0;
const NARRATION_PADDING: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
pub enum Voice {
    #[value(name = "Puck", alias = "puck")]
    Puck,
    #[value(name = "Charon", alias = "charon")]
    Charon,
    #[value(name = "Kore", alias = "kore")]
    Kore,
    #[value(name = "Fenrir", alias = "fenrir")]
    Fenrir,
    #[value(name = "Aoede", alias = "aoede")]
    Aoede,
}

impl Voice {
    pub const ALL: [Voice; 5] = [
        Voice::Puck,
        Voice::Charon,
        Voice::Kore,
        Voice::Fenrir,
        Voice::Aoede,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Voice::Puck => "Puck",
            Voice::Charon => "Charon",
            Voice::Kore => "Kore",
            Voice::Fenrir => "Fenrir",
            Voice::Aoede => "Aoede",
        }
    }

    pub fn description(self) -> String {
        format!("{} (US English)", self.as_str())
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Voice {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Voice::ALL
            .into_iter()
            .find(|voice| voice.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::UnknownVoice(value.to_string()))
    }
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice: Voice,
        api_key: &str,
    ) -> Result<PcmAudio, SpeechError>;
}

/// Synthesize `text`, switching to the next API key whenever the service reports a quota
/// or authentication problem. At most `max_attempts` requests are made.
pub async fn synthesize_with_rotation(
    synthesizer: &dyn SpeechSynthesizer,
    credentials: &SharedCredentials,
    text: &str,
    voice: Voice,
    max_attempts: u32,
    cancel: &CancellationFlag,
) -> Result<PcmAudio, SpeechError> {
    if cancel.is_cancelled() {
        return Err(SpeechError::Cancelled);
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(SpeechError::EmptyText);
    }

    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let api_key = credentials.current().ok_or_else(|| {
            SpeechError::Authentication(
                "no Gemini API key configured (set GEMINI_API_KEYS or api_keys in video.toml)"
                    .to_string(),
            )
        })?;

        emit(
            Level::Debug,
            "video.speech.request",
            &format!(
                "Synthesizing {} characters with {} (attempt {attempt}/{max_attempts})",
                text.chars().count(),
                voice
            ),
            None,
        );

        match synthesizer.synthesize(text, voice, &api_key).await {
            Ok(audio) if audio.is_empty() => {
                return Err(SpeechError::Decode("service returned no samples".to_string()));
            }
            Ok(audio) => return Ok(audio),
            Err(err) if err.should_rotate() && attempt < max_attempts => {
                emit(
                    Level::Warn,
                    "video.speech.retry",
                    &format!("{err}; retrying with the next API key"),
                    None,
                );
                credentials.rotate_from(&api_key);
                attempt += 1;
            }
            Err(err) => {
                if err.should_rotate() {
                    credentials.rotate_from(&api_key);
                }
                return Err(err);
            }
        }

        if cancel.is_cancelled() {
            return Err(SpeechError::Cancelled);
        }
    }
}

/// Rough narration length for a script read at a normal pace, with some headroom.
pub fn estimate_narration_seconds(text: &str) -> f64 {
    let words = text.split_whitespace().count() as f64;
    words / WORDS_PER_MINUTE * 60.0 * NARRATION_PADDING
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedSynthesizer {
        responses: Mutex<Vec<Result<PcmAudio, SpeechError>>>,
        keys_seen: Mutex<Vec<String>>,
    }

    impl ScriptedSynthesizer {
        fn new(mut responses: Vec<Result<PcmAudio, SpeechError>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                keys_seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for ScriptedSynthesizer {
        async fn synthesize(
            &self,
            _text: &str,
            _voice: Voice,
            api_key: &str,
        ) -> Result<PcmAudio, SpeechError> {
            self.keys_seen.lock().unwrap().push(api_key.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(SpeechError::Service("exhausted".to_string())))
        }
    }

    fn audio() -> PcmAudio {
        PcmAudio {
            samples: vec![0; 2400],
            sample_rate: 24_000,
        }
    }

    fn credentials() -> SharedCredentials {
        SharedCredentials::new(
            CredentialRotator::new(vec!["key-a".to_string(), "key-b".to_string()]),
            None,
        )
    }

    #[test]
    fn voices_parse_case_insensitively() {
        assert_eq!("kore".parse::<Voice>().unwrap(), Voice::Kore);
        assert_eq!(" AOEDE ".parse::<Voice>().unwrap(), Voice::Aoede);
        assert_eq!(
            "Nova".parse::<Voice>(),
            Err(ValidationError::UnknownVoice("Nova".to_string()))
        );
        assert_eq!(Voice::Puck.description(), "Puck (US English)");
    }

    #[test]
    fn narration_estimate_uses_speaking_rate() {
        let text = vec!["word"; 150].join(" ");
        assert!((estimate_narration_seconds(&text) - 72.0).abs() < 1e-9);
        assert_eq!(estimate_narration_seconds("   "), 0.0);
    }

    #[tokio::test]
    async fn rotates_keys_after_quota_errors() {
        let synthesizer = ScriptedSynthesizer::new(vec![
            Err(SpeechError::classify("429 quota exceeded")),
            Ok(audio()),
        ]);
        let credentials = credentials();

        let result = synthesize_with_rotation(
            &synthesizer,
            &credentials,
            "Hello there.",
            Voice::Puck,
            3,
            &CancellationFlag::new(),
        )
        .await;

        assert_eq!(result.unwrap().duration_seconds(), 0.1);
        assert_eq!(*synthesizer.keys_seen.lock().unwrap(), vec!["key-a", "key-b"]);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let synthesizer = ScriptedSynthesizer::new(vec![
            Err(SpeechError::classify("401 unauthorized")),
            Err(SpeechError::classify("401 unauthorized")),
            Ok(audio()),
        ]);

        let result = synthesize_with_rotation(
            &synthesizer,
            &credentials(),
            "Hello",
            Voice::Puck,
            2,
            &CancellationFlag::new(),
        )
        .await;

        assert!(matches!(result, Err(SpeechError::Authentication(_))));
        assert_eq!(synthesizer.keys_seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let synthesizer =
            ScriptedSynthesizer::new(vec![Err(SpeechError::classify("500 backend error"))]);

        let result = synthesize_with_rotation(
            &synthesizer,
            &credentials(),
            "Hello",
            Voice::Kore,
            3,
            &CancellationFlag::new(),
        )
        .await;

        assert!(matches!(result, Err(SpeechError::Service(_))));
        assert_eq!(synthesizer.keys_seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_and_empty_requests_never_reach_the_service() {
        let synthesizer = ScriptedSynthesizer::new(vec![Ok(audio())]);
        let cancel = CancellationFlag::new();

        let empty =
            synthesize_with_rotation(&synthesizer, &credentials(), "  \n", Voice::Puck, 3, &cancel)
                .await;
        assert_eq!(empty, Err(SpeechError::EmptyText));

        cancel.cancel();
        let cancelled =
            synthesize_with_rotation(&synthesizer, &credentials(), "Hi", Voice::Puck, 3, &cancel)
                .await;
        assert_eq!(cancelled, Err(SpeechError::Cancelled));
        assert!(synthesizer.keys_seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_keys_fail_without_a_request() {
        let synthesizer = ScriptedSynthesizer::new(vec![Ok(audio())]);
        let credentials = SharedCredentials::new(CredentialRotator::new(Vec::new()), None);

        let result = synthesize_with_rotation(
            &synthesizer,
            &credentials,
            "Hi",
            Voice::Puck,
            3,
            &CancellationFlag::new(),
        )
        .await;

        assert!(matches!(result, Err(SpeechError::Authentication(_))));
        assert!(synthesizer.keys_seen.lock().unwrap().is_empty());
    }
}
