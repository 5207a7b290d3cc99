use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{PcmAudio, SpeechSynthesizer, Voice};
use crate::video::errors::SpeechError;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Gemini text-to-speech over the REST `generateContent` endpoint.
pub struct GeminiSynthesizer {
    client: Client,
    model: String,
    sample_rate: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: [&'static str; 1],
    speech_config: SpeechConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoice<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoice<'a> {
    voice_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct SpeechResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

impl GeminiSynthesizer {
    pub fn new(model: impl Into<String>, sample_rate: u32) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| SpeechError::Service(err.to_string()))?;
        Ok(Self {
            client,
            model: model.into(),
            sample_rate,
        })
    }

    fn endpoint(&self) -> String {
        format!("{API_BASE}/{}:generateContent", self.model)
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: Voice,
        api_key: &str,
    ) -> Result<PcmAudio, SpeechError> {
        let request = SpeechRequest {
            contents: vec![Content {
                parts: vec![TextPart { text }],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoice {
                            voice_name: voice.as_str(),
                        },
                    },
                },
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| SpeechError::classify(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| SpeechError::classify(err.to_string()))?;

        if !status.is_success() {
            return Err(SpeechError::classify(format!("{status}: {}", body.trim())));
        }

        let pcm = extract_audio(&body)?;
        PcmAudio::from_le_bytes(&pcm, self.sample_rate)
    }
}

/// Raw PCM bytes of the first inline audio part of a response body.
fn extract_audio(body: &str) -> Result<Vec<u8>, SpeechError> {
    let response: SpeechResponse = serde_json::from_str(body)
        .map_err(|err| SpeechError::Decode(format!("unexpected response: {err}")))?;

    let data = response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.inline_data)
        .ok_or_else(|| SpeechError::Decode("no audio data in response".to_string()))?;

    STANDARD
        .decode(data.data.as_bytes())
        .map_err(|err| SpeechError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_gemini_field_names() {
        let request = SpeechRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: "Hello" }],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoice { voice_name: "Kore" },
                    },
                },
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(json["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            json["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Kore"
        );
    }

    #[test]
    fn extracts_inline_audio() {
        let encoded = STANDARD.encode([1u8, 0, 2, 0]);
        let body = format!(
            r#"{{"candidates":[{{"content":{{"parts":[{{"text":"ignored"}},{{"inlineData":{{"mimeType":"audio/L16;rate=24000","data":"{encoded}"}}}}]}}}}]}}"#
        );
        assert_eq!(extract_audio(&body).unwrap(), vec![1, 0, 2, 0]);
    }

    #[test]
    fn missing_audio_is_a_decode_error() {
        assert!(matches!(
            extract_audio(r#"{"candidates":[]}"#),
            Err(SpeechError::Decode(_))
        ));
        assert!(matches!(
            extract_audio(r#"{"candidates":[{"content":{"parts":[{"inlineData":{"data":"@@"}}]}}]}"#),
            Err(SpeechError::Decode(_))
        ));
    }

    #[test]
    fn endpoint_includes_model() {
        let synthesizer = GeminiSynthesizer::new("gemini-2.5-flash-preview-tts", 24_000).unwrap();
        assert_eq!(
            synthesizer.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-preview-tts:generateContent"
        );
    }
}
