//! OpenAI speech endpoint.

use super::SpeechProvider;
use crate::error::{NewscastError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Speech provider backed by the OpenAI audio API.
pub struct OpenAISpeech {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    voice: Voice,
}

impl OpenAISpeech {
    pub fn new(api_key_env: &str, model: &str, voice: &str) -> Result<Self> {
        Ok(Self {
            client: create_client(api_key_env)?,
            model: model.to_string(),
            voice: parse_voice(voice),
        })
    }
}

fn parse_voice(name: &str) -> Voice {
    match name.to_lowercase().as_str() {
        "alloy" => Voice::Alloy,
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "nova" => Voice::Nova,
        "shimmer" => Voice::Shimmer,
        other => {
            warn!(voice = other, "Unknown OpenAI voice, using alloy");
            Voice::Alloy
        }
    }
}

#[async_trait]
impl SpeechProvider for OpenAISpeech {
    fn name(&self) -> &str {
        "openai"
    }

    async fn synthesize_chunk(&self, text: &str) -> Result<Vec<u8>> {
        debug!(chars = text.len(), model = %self.model, "OpenAI speech request");

        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(SpeechModel::Other(self.model.clone()))
            .voice(self.voice.clone())
            .response_format(SpeechResponseFormat::Mp3)
            .build()
            .map_err(|e| NewscastError::Synthesis(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .map_err(|e| NewscastError::OpenAI(format!("Speech API error: {}", e)))?;

        Ok(response.bytes.to_vec())
    }
}
