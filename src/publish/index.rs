//! Landing page that links the feed.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

/// Render a minimal index page advertising `feed_url`.
pub fn render_index_html(title: &str, description: &str, feed_url: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{title}</title>
  <link rel="alternate" type="application/rss+xml" title="{title_attr}" href="{feed_attr}" />
  <meta property="og:type" content="website" />
  <meta property="og:title" content="{title_attr}" />
  <meta property="og:description" content="{description_attr}" />
  <meta property="og:url" content="{feed_attr}" />
  <link rel="icon" href="data:," />
</head>
<body>
  <h1>{title}</h1>
  <p>{description}</p>
  <p>RSS: <a href="{feed_attr}"><code>{feed}</code></a></p>
</body>
</html>
"#,
        title = text(title),
        title_attr = attr(title),
        description = text(description),
        description_attr = attr(description),
        feed = text(feed_url),
        feed_attr = attr(feed_url),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_feed_and_escapes_title() {
        let html = render_index_html("News & Notes", "Daily \"AI\"", "https://x.io/feed.xml");
        assert!(html.contains("<h1>News &amp; Notes</h1>"));
        assert!(html.contains("href=\"https://x.io/feed.xml\""));
        assert!(html.contains("content=\"Daily &quot;AI&quot;\""));
    }
}
