//! Published episode records.

use super::dates::deserialize_lenient;
use crate::acquire::ContentSource;
use crate::normalize::NormalizedItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One source item that contributed to an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default = "unknown_source")]
    pub source: String,
}

fn unknown_source() -> String {
    "unknown".to_string()
}

impl Component {
    pub fn from_item(item: &NormalizedItem) -> Self {
        Self {
            title: item.item.title.clone(),
            link: item.item.link.clone(),
            source: item.item.content_source.to_string(),
        }
    }
}

/// A publishable podcast episode.
///
/// `audio_url` is present only when synthesis succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub pub_date: DateTime<Utc>,
    #[serde(default)]
    pub description_html: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub audio_bytes: u64,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub transcript_url: Option<String>,
    #[serde(default)]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts_error: Option<String>,
}

impl Episode {
    /// Content hash, falling back to the suffix of `::`-separated ids.
    pub fn effective_hash(&self) -> Option<&str> {
        if let Some(hash) = self.content_hash.as_deref().filter(|h| !h.is_empty()) {
            return Some(hash);
        }
        self.id.rsplit_once("::").map(|(_, hash)| hash)
    }

    pub fn has_audio(&self) -> bool {
        self.audio_url.as_deref().is_some_and(|u| !u.is_empty())
    }

    pub fn date(&self) -> chrono::NaiveDate {
        self.pub_date.date_naive()
    }
}

/// `<p><strong>n. title</strong><br/>desc</p>` per item.
pub fn numbered_description(items: &[&NormalizedItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "<p><strong>{}. {}</strong><br/>{}</p>",
                i + 1,
                html_escape::encode_text(&item.item.title),
                item.desc_html
            )
        })
        .collect()
}

/// The "Included items" list with each component's content source.
pub fn included_items(components: &[Component]) -> String {
    let list: String = components
        .iter()
        .map(|c| {
            format!(
                "<li><a href=\"{}\">{}</a> — source: {}</li>",
                html_escape::encode_double_quoted_attribute(&c.link),
                html_escape::encode_text(&c.title),
                html_escape::encode_text(&c.source)
            )
        })
        .collect();
    format!("<h4>Included items</h4><ul>{}</ul>", list)
}

/// Footer naming where a single item's text came from.
pub fn source_footer(source: ContentSource) -> String {
    format!("<p><small>Source: {}</small></p>", source)
}

/// Note appended when synthesis failed.
pub fn tts_failure_note(error: &str) -> String {
    format!("<p><em>TTS failed: {}</em></p>", html_escape::encode_text(error))
}
