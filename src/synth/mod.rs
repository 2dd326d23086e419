//! Speech synthesis for Newscast.
//!
//! Text is split into sentence-aligned chunks, each chunk is synthesized with
//! retry, and the resulting MP3 frames are concatenated in order.

mod chunk;
mod google;
mod openai;

pub use chunk::{split_into_chunks, split_sentences};
pub use google::GoogleSpeech;
pub use openai::OpenAISpeech;

use crate::config::{TtsProvider, TtsSettings};
use crate::error::{NewscastError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A text-to-speech backend.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Synthesize one chunk into MP3 bytes.
    async fn synthesize_chunk(&self, text: &str) -> Result<Vec<u8>>;
}

/// Build the provider selected in settings.
pub fn create_provider(settings: &TtsSettings) -> Result<Arc<dyn SpeechProvider>> {
    match settings.provider {
        TtsProvider::Google => Ok(Arc::new(GoogleSpeech::from_env(settings)?)),
        TtsProvider::OpenAI => Ok(Arc::new(OpenAISpeech::new(
            &settings.credential_env(),
            &settings.openai_model,
            &settings.openai_voice,
        )?)),
    }
}

/// Chunked, retried synthesis over any provider.
pub struct Synthesizer {
    provider: Arc<dyn SpeechProvider>,
    max_chars_per_chunk: usize,
    retry: RetryPolicy,
}

impl Synthesizer {
    pub fn new(provider: Arc<dyn SpeechProvider>, max_chars_per_chunk: usize, retry: RetryPolicy) -> Self {
        Self {
            provider,
            max_chars_per_chunk,
            retry,
        }
    }

    pub fn from_settings(settings: &TtsSettings) -> Result<Self> {
        Ok(Self::new(
            create_provider(settings)?,
            settings.max_chars_per_chunk,
            RetryPolicy::from_secs_f64(settings.max_retries, settings.initial_retry_delay_secs),
        ))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Synthesize `text` into a single MP3 byte stream.
    ///
    /// A chunk that still fails after every retry fails the whole call.
    #[instrument(skip(self, text), fields(provider = %self.provider.name(), chars = text.len()))]
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let chunks = split_into_chunks(text, self.max_chars_per_chunk);
        if chunks.is_empty() {
            return Err(NewscastError::Synthesis("Nothing to synthesize".to_string()));
        }
        info!(chunks = chunks.len(), "Synthesizing chunks");

        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let part = self
                .retry
                .run("tts_chunk", |attempt| async move {
                    debug!(chunk_index = index, attempt, "Synthesizing chunk");
                    let bytes = self.provider.synthesize_chunk(chunk).await?;
                    if bytes.is_empty() {
                        return Err(NewscastError::Synthesis("Empty audio buffer".to_string()));
                    }
                    Ok(bytes)
                })
                .await?;
            audio.extend_from_slice(&part);
        }
        Ok(audio)
    }
}
