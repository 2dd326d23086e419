//! Google Cloud Text-to-Speech over REST.

use super::SpeechProvider;
use crate::config::TtsSettings;
use crate::error::{NewscastError, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f64,
    pitch: f64,
    volume_gain_db: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

/// Speech provider backed by Google Cloud Text-to-Speech (API key auth).
pub struct GoogleSpeech {
    client: Client,
    endpoint: String,
    api_key: String,
    language_code: String,
    voice_name: String,
    audio_config: AudioConfig,
}

impl GoogleSpeech {
    pub fn new(settings: &TtsSettings, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| NewscastError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            language_code: settings.language_code.clone(),
            voice_name: settings.voice_name.clone(),
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: settings.speaking_rate,
                pitch: settings.pitch,
                volume_gain_db: settings.volume_gain_db,
            },
        })
    }

    /// Read the API key from the configured environment variable.
    pub fn from_env(settings: &TtsSettings) -> Result<Self> {
        let env = settings.credential_env();
        let key = std::env::var(&env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| NewscastError::Config(format!("{} is not set", env)))?;
        Self::new(settings, key)
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[async_trait]
impl SpeechProvider for GoogleSpeech {
    fn name(&self) -> &str {
        "google"
    }

    async fn synthesize_chunk(&self, text: &str) -> Result<Vec<u8>> {
        debug!(chars = text.len(), voice = %self.voice_name, "Google TTS request");

        let body = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &self.language_code,
                name: &self.voice_name,
            },
            audio_config: self.audio_config.clone(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(NewscastError::Synthesis(format!(
                "Google TTS returned {}: {}",
                status.as_u16(),
                detail.chars().take(300).collect::<String>()
            )));
        }

        let parsed: SynthesizeResponse = response.json().await?;
        base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| NewscastError::Synthesis(format!("Invalid audio payload: {}", e)))
    }
}
