//! Optional AI-assisted cleanup and listen-friendly rewrite.
//!
//! Both passes are plain text-to-text transforms applied to narration text
//! after the content hash has been taken. Text is soft-chunked on paragraph
//! boundaries; a chunk whose call fails keeps its input text.

use crate::config::{credential_present, Prompts, Settings};
use crate::error::{NewscastError, Result};
use crate::normalize::strip_emoji;
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

const CLEANUP_SOFT_LIMIT: usize = 3500;
const REWRITE_SOFT_LIMIT: usize = 3200;

/// Transforms one chunk of text.
#[async_trait]
pub trait ChunkTransform: Send + Sync {
    async fn transform(&self, chunk: &str) -> Result<String>;
}

/// Chat-completion backed transform.
pub struct OpenAIChat {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    system: String,
    user_prefix: String,
    temperature: f32,
}

impl OpenAIChat {
    pub fn new(api_key_env: &str, model: &str, system: &str, user_prefix: &str, temperature: f32) -> Result<Self> {
        Ok(Self {
            client: create_client(api_key_env)?,
            model: model.to_string(),
            system: system.to_string(),
            user_prefix: user_prefix.to_string(),
            temperature,
        })
    }
}

#[async_trait]
impl ChunkTransform for OpenAIChat {
    async fn transform(&self, chunk: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system.clone())
                .build()
                .map_err(|e| NewscastError::OpenAI(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("{}{}", self.user_prefix, chunk))
                .build()
                .map_err(|e| NewscastError::OpenAI(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| NewscastError::OpenAI(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| NewscastError::OpenAI(format!("Chat completion failed: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| NewscastError::OpenAI("Empty response from LLM".to_string()))
    }
}

/// Group paragraphs into chunks of roughly `soft_limit` characters.
///
/// A single paragraph longer than the limit stays whole.
pub fn soft_chunks(text: &str, soft_limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buf: Vec<&str> = Vec::new();
    let mut total = 0usize;

    for para in text.split("\n\n") {
        let len = para.chars().count();
        if total + len + 2 > soft_limit && !buf.is_empty() {
            chunks.push(buf.join("\n\n"));
            buf = vec![para];
            total = len;
        } else {
            buf.push(para);
            total += len + 2;
        }
    }
    if !buf.is_empty() {
        chunks.push(buf.join("\n\n"));
    }
    chunks
}

/// One chunked pass over a [`ChunkTransform`].
pub struct TextPass {
    label: &'static str,
    transform: Arc<dyn ChunkTransform>,
    soft_limit: usize,
}

impl TextPass {
    pub fn new(label: &'static str, transform: Arc<dyn ChunkTransform>, soft_limit: usize) -> Self {
        Self {
            label,
            transform,
            soft_limit,
        }
    }

    pub async fn apply(&self, text: &str) -> String {
        let chunks = soft_chunks(text, self.soft_limit);
        let mut parts = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            match self.transform.transform(chunk).await {
                Ok(out) => parts.push(out),
                Err(e) => {
                    warn!(pass = self.label, chunk_index = index, error = %e, "LLM chunk failed, keeping input");
                    parts.push(chunk.clone());
                }
            }
        }
        let result = parts.join("\n\n");
        info!(
            pass = self.label,
            chunks = chunks.len(),
            orig_len = text.len(),
            new_len = result.len(),
            "LLM pass done"
        );
        result
    }
}

/// The cleanup-then-rewrite sequence. Missing passes are identity.
#[derive(Default)]
pub struct Rewriter {
    cleanup: Option<TextPass>,
    rewrite: Option<TextPass>,
    remove_emoji: bool,
}

impl Rewriter {
    /// A rewriter that returns its input unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn new(cleanup: Option<TextPass>, rewrite: Option<TextPass>, remove_emoji: bool) -> Self {
        Self {
            cleanup,
            rewrite,
            remove_emoji,
        }
    }

    /// Build the passes enabled in settings.
    ///
    /// An unsupported provider or a missing credential disables both passes.
    pub fn from_settings(settings: &Settings, prompts: &Prompts) -> Self {
        let llm = &settings.llm;
        if !llm.enabled && !llm.rewrite_enabled {
            return Self::identity();
        }
        if llm.provider != "openai" {
            info!(provider = %llm.provider, "LLM passes skipped: unsupported provider");
            return Self::identity();
        }
        if !credential_present(&llm.api_key_env) {
            info!(env = %llm.api_key_env, "LLM passes skipped: api key missing");
            return Self::identity();
        }

        let build = |model: &str, system: &str, prefix: &str, temperature: f32| {
            OpenAIChat::new(&llm.api_key_env, model, system, prefix, temperature)
                .map(|chat| Arc::new(chat) as Arc<dyn ChunkTransform>)
                .map_err(|e| warn!(error = %e, "LLM client unavailable"))
                .ok()
        };

        let cleanup = if llm.enabled {
            build(&llm.model, &prompts.cleanup.system, &prompts.cleanup.user_prefix, 0.2)
                .map(|t| TextPass::new("cleanup", t, CLEANUP_SOFT_LIMIT))
        } else {
            None
        };
        let rewrite = if llm.rewrite_enabled {
            build(&llm.rewrite_model, &prompts.rewrite.system, "", 0.4)
                .map(|t| TextPass::new("rewrite", t, REWRITE_SOFT_LIMIT))
        } else {
            None
        };

        Self::new(cleanup, rewrite, settings.clean.remove_emoji)
    }

    pub fn is_identity(&self) -> bool {
        self.cleanup.is_none() && self.rewrite.is_none()
    }

    /// Run the enabled passes in order.
    pub async fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        if let Some(pass) = &self.cleanup {
            out = pass.apply(&out).await;
            if self.remove_emoji {
                out = strip_emoji(&out);
            }
        }
        if let Some(pass) = &self.rewrite {
            out = pass.apply(&out).await;
        }
        debug!(changed = out != text, "Narration text prepared");
        out
    }
}
