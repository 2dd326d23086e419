//! Prompt templates for the optional AI text passes.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    /// Prompt for the speech-safety cleanup pass.
    pub cleanup: CleanupPrompts,
    /// Prompt for the listen-friendly rewrite pass.
    pub rewrite: RewritePrompts,
}

/// Prompts for cleanup of normalized text before synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupPrompts {
    pub system: String,
    /// Prefix placed before each text chunk in the user message.
    pub user_prefix: String,
}

impl Default for CleanupPrompts {
    fn default() -> Self {
        Self {
            system: r#"You clean newsletter text for text-to-speech. Return plain text only.
Rules:
- Remove all Markdown syntax: **, __, `code`, _italics_, [text](url), images.
- Drop boilerplate/meta lines: 'Title:', 'Published Time:', 'URL Source', 'Markdown Content', 'Illustration:', 'Image N: ...'.
- Drop editorial footers like 'Share this story.' and lines starting with 'Thanks to'.
- Remove standalone bylines and credit-only bullets.
- Normalize bullets into normal sentences; remove leading bullet symbols.
- Keep the meaningful prose and numbered sections in original order, but without symbols.
- Normalize spacing and punctuation (ensure a space after colons).
Do not summarize or add commentary. Do not fabricate content."#
                .to_string(),
            user_prefix: "Clean this newsletter excerpt for TTS. Return plain text only.\n\n"
                .to_string(),
        }
    }
}

/// Prompts for rewriting text so it reads well aloud.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewritePrompts {
    pub system: String,
}

impl Default for RewritePrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a professional audio editor and voice adaptation expert.
Transform the written newsletter into a version that sounds great when read aloud.
Goals:
- Make it natural, clear, and conversational.
- Simplify and shorten sentences for listening comprehension.
- Maintain original tone and intent.
- Remove or rephrase visual-only references (e.g., 'see chart below').
Return plain text only. Do not add new facts or commentary."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding defaults with any TOML files in `custom_dir`.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let cleanup_path = custom_path.join("cleanup.toml");
            if cleanup_path.exists() {
                let content = std::fs::read_to_string(&cleanup_path)?;
                prompts.cleanup = toml::from_str(&content)?;
            }

            let rewrite_path = custom_path.join("rewrite.toml");
            if rewrite_path.exists() {
                let content = std::fs::read_to_string(&rewrite_path)?;
                prompts.rewrite = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.cleanup.system.is_empty());
        assert!(!prompts.rewrite.system.is_empty());
    }

    #[test]
    fn test_custom_dir_overrides_rewrite_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rewrite.toml"), "system = \"Read it slowly.\"\n").unwrap();

        let prompts = Prompts::load(dir.path().to_str()).unwrap();
        assert_eq!(prompts.rewrite.system, "Read it slowly.");
        assert_eq!(prompts.cleanup.system, CleanupPrompts::default().system);
    }
}
