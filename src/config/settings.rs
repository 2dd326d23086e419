//! Configuration settings for Newscast.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub site: SiteSettings,
    pub feed: FeedSettings,
    pub output: OutputSettings,
    pub mode: EpisodeMode,
    pub tts: TtsSettings,
    pub clean: CleanSettings,
    pub llm: LlmSettings,
    pub fetch: FetchSettings,
    pub logging: LoggingSettings,
    pub prompts: PromptSettings,
}

/// Podcast channel metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub title: String,
    /// Public base URL that audio, transcripts and the feed are served from.
    pub link: String,
    pub description: String,
    pub language: String,
    pub image_url: String,
    pub author: String,
    pub owner_name: String,
    pub owner_email: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: "Newsletter Podcast".to_string(),
            link: "http://localhost/".to_string(),
            description: "Auto podcast feed".to_string(),
            language: "en-us".to_string(),
            image_url: String::new(),
            author: String::new(),
            owner_name: String::new(),
            owner_email: String::new(),
        }
    }
}

/// Source feed or newsletter listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Display name used in episode titles.
    pub name: String,
    /// Syndication feed URL or single-page newsletter listing URL.
    pub url: String,
    /// Fetch each entry's own page and replace the summary with extracted content.
    pub fetch_original: bool,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            name: "Axios".to_string(),
            url: "https://www.axios.com/feeds/feed.rss".to_string(),
            fetch_original: false,
        }
    }
}

/// Output file layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Root directory of the published site.
    pub root_dir: String,
    /// Audio directory, relative to `root_dir`.
    pub audio_dir: String,
    pub feed_filename: String,
    pub index_filename: String,
    /// Location of the persisted processing state.
    pub state_path: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            root_dir: "docs".to_string(),
            audio_dir: "audio".to_string(),
            feed_filename: "feed.xml".to_string(),
            index_filename: "index.html".to_string(),
            state_path: "data/state.json".to_string(),
        }
    }
}

/// Episode assembly mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeMode {
    /// One episode per new item.
    Separate,
    /// One episode for all new items published today.
    #[default]
    Compilation,
    /// One episode per run: the newsletter issue if present, otherwise the whole pool.
    #[serde(alias = "force_compilation", alias = "newsletter")]
    ForcedCompilation,
}

impl std::str::FromStr for EpisodeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "separate" => Ok(EpisodeMode::Separate),
            "compilation" => Ok(EpisodeMode::Compilation),
            "forced_compilation" | "force_compilation" | "newsletter" => {
                Ok(EpisodeMode::ForcedCompilation)
            }
            _ => Err(format!("Unknown mode: {}", s)),
        }
    }
}

impl std::fmt::Display for EpisodeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EpisodeMode::Separate => write!(f, "separate"),
            EpisodeMode::Compilation => write!(f, "compilation"),
            EpisodeMode::ForcedCompilation => write!(f, "forced_compilation"),
        }
    }
}

/// Speech synthesis provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    /// Google Cloud Text-to-Speech.
    #[default]
    Google,
    /// OpenAI speech endpoint.
    OpenAI,
}

impl std::str::FromStr for TtsProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" | "gcp" => Ok(TtsProvider::Google),
            "openai" => Ok(TtsProvider::OpenAI),
            _ => Err(format!("Unknown TTS provider: {}", s)),
        }
    }
}

impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TtsProvider::Google => write!(f, "google"),
            TtsProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    pub enabled: bool,
    pub provider: TtsProvider,
    pub language_code: String,
    /// Google voice name.
    pub voice_name: String,
    pub speaking_rate: f64,
    pub pitch: f64,
    pub volume_gain_db: f64,
    pub openai_model: String,
    pub openai_voice: String,
    /// Upper bound for a synthesis request, in characters.
    pub max_chars_per_chunk: usize,
    /// Attempts per chunk, including the first.
    pub max_retries: u32,
    pub initial_retry_delay_secs: f64,
    /// Environment variable holding the provider credential.
    pub api_key_env: Option<String>,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: TtsProvider::Google,
            language_code: "en-US".to_string(),
            voice_name: "en-US-Standard-C".to_string(),
            speaking_rate: 1.0,
            pitch: 0.0,
            volume_gain_db: 0.0,
            openai_model: "gpt-4o-mini-tts".to_string(),
            openai_voice: "alloy".to_string(),
            max_chars_per_chunk: 4500,
            max_retries: 3,
            initial_retry_delay_secs: 2.0,
            api_key_env: None,
        }
    }
}

impl TtsSettings {
    /// Credential variable for the configured provider.
    pub fn credential_env(&self) -> String {
        self.api_key_env.clone().unwrap_or_else(|| match self.provider {
            TtsProvider::Google => "GOOGLE_TTS_API_KEY".to_string(),
            TtsProvider::OpenAI => "OPENAI_API_KEY".to_string(),
        })
    }
}

/// Text normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanSettings {
    pub remove_emoji: bool,
    pub strip_html: bool,
    pub remove_ads: bool,
    /// Case-insensitive substrings that mark a block as sponsored.
    pub ad_keywords: Vec<String>,
}

impl Default for CleanSettings {
    fn default() -> Self {
        Self {
            remove_emoji: true,
            strip_html: true,
            remove_ads: true,
            ad_keywords: Vec::new(),
        }
    }
}

/// Optional AI-assisted cleanup and rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Enable the cleanup pass.
    pub enabled: bool,
    /// Enable the audio rewrite pass.
    pub rewrite_enabled: bool,
    pub provider: String,
    pub model: String,
    pub rewrite_model: String,
    pub api_key_env: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            rewrite_enabled: false,
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            rewrite_model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Article fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient statuses.
    pub max_retries: u32,
    /// Base delay for the retry backoff, doubled per attempt.
    pub backoff_secs: f64,
    pub diffbot_token_env: String,
    pub reader_proxy_base: String,
    /// URL path fragments that identify a single-page newsletter listing.
    pub listing_patterns: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            backoff_secs: 1.0,
            diffbot_token_env: "DIFFBOT_TOKEN".to_string(),
            reader_proxy_base: "https://r.jina.ai".to_string(),
            listing_patterns: vec!["/newsletters/axios-ai-plus".to_string()],
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Output format (pretty, json).
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else if path.is_some() {
            Err(crate::error::NewscastError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )))
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newscast")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded site root directory.
    pub fn root_dir(&self) -> PathBuf {
        Self::expand_path(&self.output.root_dir)
    }

    /// Get the expanded state file path.
    pub fn state_path(&self) -> PathBuf {
        Self::expand_path(&self.output.state_path)
    }

    /// Collect non-fatal configuration problems.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.site.link.trim().is_empty() {
            warnings.push("site.link is empty; public URLs will be relative".to_string());
        }
        if self.feed.url.trim().is_empty() {
            warnings.push("feed.url is empty; nothing will be fetched".to_string());
        }
        if self.tts.max_chars_per_chunk == 0 {
            warnings.push("tts.max_chars_per_chunk must be positive".to_string());
        }
        if self.tts.max_retries == 0 {
            warnings.push("tts.max_retries is 0; synthesis will be attempted once".to_string());
        }
        if self.tts.enabled && !credential_present(&self.tts.credential_env()) {
            warnings.push(format!(
                "{} not set; TTS ({}) disabled, episodes will be published without audio",
                self.tts.credential_env(),
                self.tts.provider
            ));
        }
        if (self.llm.enabled || self.llm.rewrite_enabled) && self.llm.provider != "openai" {
            warnings.push(format!(
                "llm.provider '{}' is not supported; AI cleanup/rewrite disabled",
                self.llm.provider
            ));
        }
        if (self.llm.enabled || self.llm.rewrite_enabled) && !credential_present(&self.llm.api_key_env)
        {
            warnings.push(format!(
                "{} not set; AI cleanup/rewrite will be skipped",
                self.llm.api_key_env
            ));
        }
        if self.clean.remove_ads && self.clean.ad_keywords.is_empty() {
            warnings.push("clean.remove_ads is on but clean.ad_keywords is empty".to_string());
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            warnings.push(format!(
                "logging.format '{}' is unknown; using pretty",
                self.logging.format
            ));
        }

        warnings
    }
}

/// Check whether an environment variable holds a non-empty value.
pub fn credential_present(env_name: &str) -> bool {
    std::env::var(env_name).map(|v| !v.trim().is_empty()).unwrap_or(false)
}
