//! Syndication feed parsing.

use super::{ContentSource, SourceItem};
use crate::error::{NewscastError, Result};
use feed_rs::model::Entry;
use feed_rs::parser;
use std::io::Cursor;

/// Parse an RSS or Atom document into source items.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<SourceItem>> {
    let feed = parser::parse(Cursor::new(bytes)).map_err(|e| NewscastError::Feed(e.to_string()))?;
    Ok(feed.entries.iter().map(entry_to_item).collect())
}

fn entry_to_item(entry: &Entry) -> SourceItem {
    let link = entry
        .links
        .iter()
        .map(|l| l.href.trim())
        .find(|href| !href.is_empty())
        .unwrap_or_default()
        .to_string();

    let guid = if entry.id.trim().is_empty() {
        link.clone()
    } else {
        entry.id.trim().to_string()
    };

    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "(no title)".to_string());

    let author = entry
        .authors
        .first()
        .map(|p| p.name.trim().to_string())
        .unwrap_or_default();

    let published = entry
        .published
        .or(entry.updated)
        .map(|d| d.to_rfc2822())
        .unwrap_or_default();

    let summary = entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .unwrap_or_default();
    let content_html = entry
        .content
        .as_ref()
        .and_then(|c| c.body.clone())
        .filter(|b| !b.trim().is_empty())
        .unwrap_or(summary);

    SourceItem {
        guid,
        link,
        title,
        author,
        published,
        content_html,
        content_source: ContentSource::Feed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rss_entry_fields() {
        let rss = br#"<?xml version="1.0"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/"><channel><title>T</title>
<item>
  <guid>abc-123</guid>
  <link>https://news.test/story</link>
  <title>Story title</title>
  <dc:creator>Jane Writer</dc:creator>
  <pubDate>Tue, 14 Oct 2025 10:00:00 GMT</pubDate>
  <description>&lt;p&gt;Summary&lt;/p&gt;</description>
</item>
</channel></rss>"#;
        let items = parse_feed(rss).unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.guid, "abc-123");
        assert_eq!(item.link, "https://news.test/story");
        assert_eq!(item.title, "Story title");
        assert_eq!(item.author, "Jane Writer");
        assert!(item.published.starts_with("Tue, 14 Oct 2025"));
        assert_eq!(item.content_html, "<p>Summary</p>");
        assert_eq!(item.content_source, ContentSource::Feed);
    }

    #[test]
    fn test_atom_content_beats_summary() {
        let atom = br#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"><title>T</title><id>urn:feed</id><updated>2025-10-14T00:00:00Z</updated>
<entry>
  <id>urn:entry:1</id>
  <title></title>
  <link href="https://news.test/atom"/>
  <updated>2025-10-14T08:00:00Z</updated>
  <summary>Short</summary>
  <content type="html">&lt;p&gt;Full body&lt;/p&gt;</content>
</entry>
</feed>"#;
        let items = parse_feed(atom).unwrap();
        assert_eq!(items[0].title, "(no title)");
        assert_eq!(items[0].content_html, "<p>Full body</p>");
        assert!(items[0].published.contains("14 Oct 2025"));
    }

    #[test]
    fn test_garbage_is_a_feed_error() {
        assert!(matches!(parse_feed(b"not a feed"), Err(NewscastError::Feed(_))));
    }
}
