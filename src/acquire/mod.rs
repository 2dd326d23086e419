//! Source acquisition for Newscast.
//!
//! Turns a configured source URL into a list of [`SourceItem`]s. The source is
//! either a syndication feed or a single-page newsletter listing; article pages
//! are fetched through a resilient cascade and reduced to their main content.

mod diffbot;
mod extract;
mod feed;
mod fetch;
mod listing;
mod reader;

pub use diffbot::DiffbotClient;
pub use extract::{
    is_plaintext, plaintext_to_html, ArticleMetadataExtractor, ExtractedContent,
    ExtractionCascade, Extractor, FullTextExtractor, HeuristicExtractor, ReadabilityExtractor,
    MIN_USEFUL_CHARS,
};
pub use feed::parse_feed;
pub use fetch::{looks_blocked_or_too_short, HttpPageFetcher, PageFetcher};
pub use listing::{
    find_issue_date, find_issue_date_in_html, is_listing_url, parse_issue_plaintext, IssueSection,
    ListingIssue,
};
pub use reader::ReaderProxy;

use crate::config::Settings;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where an item's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentSource {
    /// The feed entry's own summary or content.
    #[serde(rename = "rss")]
    Feed,
    /// The fetched page, used as-is.
    #[serde(rename = "original")]
    Original,
    /// Boilerplate-removal extraction.
    #[serde(rename = "trafilatura")]
    FullText,
    /// Readability-style candidate scoring.
    #[serde(rename = "readability")]
    Readability,
    /// Structured article metadata embedded in the page.
    #[serde(rename = "newspaper")]
    ArticleMetadata,
    /// Container heuristics.
    #[serde(rename = "heuristic")]
    Heuristic,
    /// Plain text wrapped into paragraphs.
    #[serde(rename = "plaintext")]
    Plaintext,
    /// A listing page parsed as one newsletter issue (HTML).
    #[serde(rename = "newsletter_issue")]
    NewsletterIssue,
    /// A listing page parsed as one newsletter issue (plain text).
    #[serde(rename = "newsletter_issue_text")]
    NewsletterIssueText,
}

impl ContentSource {
    /// Tag string as stored in descriptions and state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSource::Feed => "rss",
            ContentSource::Original => "original",
            ContentSource::FullText => "trafilatura",
            ContentSource::Readability => "readability",
            ContentSource::ArticleMetadata => "newspaper",
            ContentSource::Heuristic => "heuristic",
            ContentSource::Plaintext => "plaintext",
            ContentSource::NewsletterIssue => "newsletter_issue",
            ContentSource::NewsletterIssueText => "newsletter_issue_text",
        }
    }

    /// Whether the item represents a whole newsletter issue.
    pub fn is_issue(&self) -> bool {
        matches!(
            self,
            ContentSource::NewsletterIssue | ContentSource::NewsletterIssueText
        )
    }
}

impl std::fmt::Display for ContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single stage in a fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    /// The stage produced usable output.
    Content(T),
    /// The stage ran but produced nothing usable.
    Empty,
    /// The stage could not run (network, credentials, parse error).
    Failed(String),
}

impl<T> StageOutcome<T> {
    pub fn content(self) -> Option<T> {
        match self {
            StageOutcome::Content(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_content(&self) -> bool {
        matches!(self, StageOutcome::Content(_))
    }
}

/// One acquired piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceItem {
    /// Stable identifier; falls back to the link.
    pub guid: String,
    pub link: String,
    pub title: String,
    pub author: String,
    /// Publication date as found in the source, possibly empty.
    pub published: String,
    /// Possibly empty HTML (or plain text) body.
    pub content_html: String,
    pub content_source: ContentSource,
}

impl SourceItem {
    /// Dedup key: the guid, or the link when the guid is empty.
    pub fn key(&self) -> &str {
        if self.guid.is_empty() {
            &self.link
        } else {
            &self.guid
        }
    }
}

/// Acquires items from a feed or a newsletter listing.
pub struct Acquirer {
    feed_name: String,
    listing_patterns: Vec<String>,
    fetcher: Arc<dyn PageFetcher>,
    cascade: ExtractionCascade,
}

impl Acquirer {
    /// Create an acquirer over any page fetcher.
    pub fn new(
        feed_name: impl Into<String>,
        listing_patterns: Vec<String>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            feed_name: feed_name.into(),
            listing_patterns,
            fetcher,
            cascade: ExtractionCascade::standard(),
        }
    }

    /// Create an acquirer with the HTTP fetcher configured from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let fetcher = HttpPageFetcher::from_settings(&settings.fetch)?;
        Ok(Self::new(
            settings.feed.name.clone(),
            settings.fetch.listing_patterns.clone(),
            Arc::new(fetcher),
        ))
    }

    /// Replace the extraction cascade.
    pub fn with_cascade(mut self, cascade: ExtractionCascade) -> Self {
        self.cascade = cascade;
        self
    }

    /// Acquire items from `source`.
    ///
    /// Network failures never abort the run: an unreachable feed yields no
    /// items and an unreachable article keeps its feed summary.
    pub async fn acquire(&self, source: &str, fetch_original: bool) -> Result<Vec<SourceItem>> {
        if is_listing_url(source, &self.listing_patterns) {
            let items = self.acquire_listing(source).await;
            info!(count = items.len(), url = source, "Fetched items from newsletter listing");
            return Ok(items);
        }

        let body = match self.fetcher.fetch_feed(source).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = source, error = %e, "Feed download failed");
                return Ok(Vec::new());
            }
        };

        let mut items = match parse_feed(&body) {
            Ok(items) => items,
            Err(e) => {
                warn!(url = source, error = %e, "Feed parse warning");
                return Ok(Vec::new());
            }
        };

        if fetch_original {
            for item in items.iter_mut() {
                if item.link.is_empty() {
                    continue;
                }
                self.replace_with_original(item).await;
            }
        }

        info!(count = items.len(), "Fetched feed entries");
        Ok(items)
    }

    async fn replace_with_original(&self, item: &mut SourceItem) {
        let Some(page) = self.fetcher.fetch_page(&item.link).await else {
            debug!(url = %item.link, "Keeping feed summary; page unavailable");
            return;
        };
        if let Some(extracted) = self.cascade.extract(&page) {
            item.content_html = extracted.html;
            item.content_source = extracted.source;
        }
    }

    /// Build a single issue item from a listing page.
    pub async fn acquire_listing(&self, url: &str) -> Vec<SourceItem> {
        let Some(page) = self.fetcher.fetch_page(url).await else {
            warn!(url, "Failed to load listing page");
            return Vec::new();
        };

        if is_plaintext(&page) {
            if let Some(issue) = parse_issue_plaintext(&page) {
                return vec![self.issue_item(
                    url,
                    issue.published.clone(),
                    issue.to_html(),
                    ContentSource::NewsletterIssueText,
                )];
            }
        }

        let published = find_issue_date_in_html(&page);
        let Some(extracted) = self.cascade.extract(&page) else {
            info!(url, "Could not extract main content from listing page");
            return Vec::new();
        };

        vec![self.issue_item(
            url,
            published,
            extracted.html,
            ContentSource::NewsletterIssue,
        )]
    }

    fn issue_item(
        &self,
        url: &str,
        published: Option<String>,
        html: String,
        source: ContentSource,
    ) -> SourceItem {
        let published = published.unwrap_or_default();
        let (guid, title) = if published.is_empty() {
            (url.to_string(), format!("{} — Latest", self.feed_name))
        } else {
            (
                format!("{}#{}", url, published),
                format!("{} — {}", self.feed_name, published),
            )
        };
        SourceItem {
            guid,
            link: url.to_string(),
            title,
            author: self.feed_name.clone(),
            published,
            content_html: html,
            content_source: source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NewscastError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Serves canned pages and feeds keyed by URL.
    struct CannedFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch_page(&self, url: &str) -> Option<String> {
            self.pages.get(url).cloned()
        }

        async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
            self.pages
                .get(url)
                .map(|s| s.as_bytes().to_vec())
                .ok_or_else(|| NewscastError::Fetch(format!("no feed at {}", url)))
        }
    }

    fn acquirer(pages: &[(&str, &str)]) -> Acquirer {
        let pages = pages
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Acquirer::new(
            "AI+",
            vec!["/newsletters/ai-plus".to_string()],
            Arc::new(CannedFetcher { pages }),
        )
    }

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Test</title>
<item><guid>g-1</guid><link>https://news.test/a</link><title>First</title>
<description>&lt;p&gt;Short summary.&lt;/p&gt;</description></item>
</channel></rss>"#;

    #[tokio::test]
    async fn test_feed_items_keep_summary_without_fetch_original() {
        let acq = acquirer(&[("https://feed.test/rss", FEED)]);
        let items = acq.acquire("https://feed.test/rss", false).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].guid, "g-1");
        assert_eq!(items[0].content_source, ContentSource::Feed);
        assert!(items[0].content_html.contains("Short summary."));
    }

    #[tokio::test]
    async fn test_fetch_original_replaces_summary() {
        let article = format!(
            "<html><body><nav>Menu</nav><article>{}</article></body></html>",
            "<p>The full story has many words in it and keeps going for a while. </p>".repeat(6)
        );
        let acq = acquirer(&[
            ("https://feed.test/rss", FEED),
            ("https://news.test/a", article.as_str()),
        ]);
        let items = acq.acquire("https://feed.test/rss", true).await.unwrap();
        assert!(items[0].content_html.contains("full story"));
        assert_ne!(items[0].content_source, ContentSource::Feed);
    }

    #[tokio::test]
    async fn test_unreachable_feed_yields_no_items() {
        let acq = acquirer(&[]);
        let items = acq.acquire("https://feed.test/missing", false).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_plaintext_listing_becomes_issue() {
        let listing = "AI+ newsletter\nOctober 14, 2025\n\nWelcome back.\n\n1. Big thing\nBody one.\n\n2. Second\nBody two.\n\n3. Third\nBody three.\n\n4. Fourth\nBody four.\n";
        let url = "https://news.test/newsletters/ai-plus";
        let acq = acquirer(&[(url, listing)]);
        let items = acq.acquire(url, false).await.unwrap();

        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.content_source, ContentSource::NewsletterIssueText);
        assert_eq!(item.guid, format!("{}#October 14, 2025", url));
        assert_eq!(item.title, "AI+ — October 14, 2025");
        assert!(item.content_html.contains("<h3>1. Big thing</h3>"));
    }

    #[test]
    fn test_content_source_tags() {
        assert_eq!(ContentSource::FullText.to_string(), "trafilatura");
        assert_eq!(
            serde_json::to_string(&ContentSource::NewsletterIssueText).unwrap(),
            "\"newsletter_issue_text\""
        );
        assert!(ContentSource::NewsletterIssue.is_issue());
        assert!(!ContentSource::Feed.is_issue());
    }
}
