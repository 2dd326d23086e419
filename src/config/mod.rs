//! Configuration module for Newscast.
//!
//! Handles loading and validating application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{CleanupPrompts, Prompts, RewritePrompts};
pub use settings::{
    credential_present, CleanSettings, EpisodeMode, FeedSettings, FetchSettings, LlmSettings,
    LoggingSettings, OutputSettings, PromptSettings, Settings, SiteSettings, TtsProvider,
    TtsSettings,
};
