//! Text normalization for Newscast.
//!
//! Converts raw content markup into speech-safe prose plus a matching HTML
//! description, and fingerprints the prose for deduplication.

mod dom;
mod text;

pub use dom::{flatten_blocks, split_paragraphs};
pub use text::{
    clean_paragraph, is_credit_text, is_noise_line, space_after_colons, strip_emoji,
    strip_inline_credits, strip_markdown,
};

use crate::acquire::{is_plaintext, SourceItem};
use crate::config::CleanSettings;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Output of the cleanup pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CleanedText {
    /// Paragraphs joined with a blank line.
    pub clean_text: String,
    /// Each paragraph escaped into its own `<p>`.
    pub desc_html: String,
    pub paragraphs: Vec<String>,
}

impl CleanedText {
    fn from_paragraphs(paragraphs: Vec<String>) -> Self {
        let clean_text = paragraphs.join("\n\n");
        let desc_html = paragraphs
            .iter()
            .map(|p| format!("<p>{}</p>", html_escape::encode_text(p)))
            .collect();
        Self {
            clean_text,
            desc_html,
            paragraphs,
        }
    }
}

/// A source item with its cleaned text and fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    #[serde(flatten)]
    pub item: SourceItem,
    pub clean_text: String,
    pub desc_html: String,
    /// SHA-256 of `clean_text`, computed before any rewrite.
    pub content_hash: String,
    /// `guid::content_hash`.
    pub key: String,
}

impl NormalizedItem {
    pub fn title(&self) -> &str {
        &self.item.title
    }

    pub fn link(&self) -> &str {
        &self.item.link
    }
}

/// Hex SHA-256 digest of normalized text.
pub fn content_hash(clean_text: &str) -> String {
    let digest = Sha256::digest(clean_text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Dedup key for an item.
pub fn dedup_key(guid: &str, content_hash: &str) -> String {
    format!("{}::{}", guid, content_hash)
}

/// Applies the cleanup pipeline configured by [`CleanSettings`].
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    settings: CleanSettings,
}

impl Normalizer {
    pub fn new(settings: CleanSettings) -> Self {
        Self { settings }
    }

    /// Clean raw markup or plain text.
    pub fn clean(&self, content: &str) -> CleanedText {
        let raw = if !self.settings.strip_html || is_plaintext(content) {
            split_paragraphs(content)
        } else {
            flatten_blocks(
                content,
                self.settings.remove_ads,
                &self.settings.ad_keywords,
            )
        };

        let paragraphs: Vec<String> = raw
            .iter()
            .filter_map(|p| clean_paragraph(p, self.settings.remove_emoji))
            .collect();

        let cleaned = CleanedText::from_paragraphs(paragraphs);
        debug!(chars = cleaned.clean_text.len(), "Cleaned text length");
        cleaned
    }

    pub fn normalize(&self, item: SourceItem) -> NormalizedItem {
        let cleaned = self.clean(&item.content_html);
        let content_hash = content_hash(&cleaned.clean_text);
        let key = dedup_key(item.key(), &content_hash);
        NormalizedItem {
            item,
            clean_text: cleaned.clean_text,
            desc_html: cleaned.desc_html,
            content_hash,
            key,
        }
    }

    pub fn normalize_all(&self, items: Vec<SourceItem>) -> Vec<NormalizedItem> {
        items.into_iter().map(|item| self.normalize(item)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::ContentSource;
    use pretty_assertions::assert_eq;

    fn normalizer() -> Normalizer {
        Normalizer::new(CleanSettings::default())
    }

    #[test]
    fn test_photo_credit_snippet() {
        let cleaned = normalizer().clean("<p>Hello <b>World</b>! (Photo: Getty Images)</p>");
        assert_eq!(cleaned.clean_text, "Hello World!");
        assert_eq!(cleaned.desc_html, "<p>Hello World!</p>");
    }

    #[test]
    fn test_desc_html_matches_clean_text() {
        let cleaned = normalizer().clean("<p>Tom &amp; Jerry</p><p>1 < 2</p>");
        assert_eq!(cleaned.clean_text, "Tom & Jerry\n\n1 < 2");
        assert_eq!(cleaned.desc_html, "<p>Tom &amp; Jerry</p><p>1 &lt; 2</p>");
        let unescaped: Vec<String> = cleaned
            .paragraphs
            .iter()
            .map(|p| format!("<p>{}</p>", html_escape::encode_text(p)))
            .collect();
        assert_eq!(unescaped.concat(), cleaned.desc_html);
    }

    #[test]
    fn test_normalizer_is_idempotent() {
        let inputs = [
            "<h2>## **Top** story</h2><p>Why it matters:it's [R]ecent 🚀</p><ul><li>- first point</li></ul><p>Share this story.</p>",
            "Title: Issue\n\nURL Source: https://x.test\n\nMarkdown Content:\nBody [link](https://y.test) text.\n\nThanks to the team.",
            "<div>Plain <a href='/x'>div</a> text</div><div>Second block at 10:30</div>",
            "<p>By<br>Jane Doe</p><p>Body text here about models.</p>",
            "<p>- - item one</p>",
            "<p>[link<br>text](https://x.io)</p>",
            "<p>### ## nested</p>",
            "* * * starred",
            "<p>Tom &amp;amp; Jerry</p>",
        ];
        let n = normalizer();
        for input in inputs {
            let once = n.clean(input);
            let twice = n.clean(&once.clean_text);
            assert_eq!(once.clean_text, twice.clean_text, "input: {}", input);
            assert!(!once.clean_text.contains("**"));
            assert!(!once.clean_text.is_empty());
        }
    }

    #[test]
    fn test_plaintext_reader_output() {
        let cleaned = normalizer().clean(
            "Title: Issue\n\nURL Source: https://x.test\n\nMarkdown Content:\nBody [link](https://y.test) text.",
        );
        assert_eq!(cleaned.clean_text, "Body link text.");
    }

    #[test]
    fn test_hash_and_key() {
        let item = SourceItem {
            guid: String::new(),
            link: "https://news.test/a".to_string(),
            title: "A".to_string(),
            author: String::new(),
            published: String::new(),
            content_html: "<p>Same text</p>".to_string(),
            content_source: ContentSource::Feed,
        };
        let n = normalizer();
        let first = n.normalize(item.clone());
        let second = n.normalize(item);
        assert_eq!(first.content_hash, second.content_hash);
        assert_eq!(first.content_hash.len(), 64);
        assert_eq!(first.key, format!("https://news.test/a::{}", first.content_hash));
        assert_eq!(first.content_hash, content_hash("Same text"));
    }

    #[test]
    fn test_raw_text_when_html_stripping_disabled() {
        let n = Normalizer::new(CleanSettings {
            strip_html: false,
            ..CleanSettings::default()
        });
        assert_eq!(n.clean("<b>bold</b>\n\nnext").paragraphs, vec!["<b>bold</b>", "next"]);
    }
}
