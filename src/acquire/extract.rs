//! Main-content extraction cascade.
//!
//! Plain text is wrapped into paragraphs. HTML goes through a fixed sequence
//! of extractors; the first one whose output carries enough visible text wins.

use super::{ContentSource, StageOutcome};
use ego_tree::NodeId;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Visible characters an extraction must exceed to be accepted.
pub const MIN_USEFUL_CHARS: usize = 200;

/// Characters a heuristic container must exceed.
const MIN_CONTAINER_CHARS: usize = 120;

/// Leading characters inspected when deciding whether input is plain text.
const PLAINTEXT_PROBE_CHARS: usize = 1000;

static BLOCK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p, h1, h2, h3, h4, li, blockquote, pre").expect("block selector should parse")
});
static PARAGRAPH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("paragraph selector should parse"));
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("link selector should parse"));
static LD_JSON_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("ld+json selector should parse")
});
static ARTICLE_BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[itemprop="articleBody"]"#).expect("articleBody selector should parse")
});
static FALLBACK_CONTAINER_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div, section, article").expect("container selector should parse")
});
static HEURISTIC_CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "article",
        r#"div[data-component="ArticleBody"]"#,
        r#"div[data-testid="ArticleContent"]"#,
        r#"section[role="main"]"#,
        "main",
    ]
    .iter()
    .filter_map(|s| Selector::parse(s).ok())
    .collect()
});

static JUNK_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(comment|share|social|related|promo|subscribe|signup|footer|sidebar|menu|breadcrumb|advert|cookie|popup|modal|newsletter-form)")
        .expect("junk attribute regex should compile")
});
static POSITIVE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(article|body|content|entry|main|page|post|text|story)")
        .expect("positive attribute regex should compile")
});
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("blank line regex should compile"));

const BOILERPLATE_TAGS: [&str; 10] = [
    "nav", "header", "footer", "aside", "form", "script", "style", "noscript", "button", "iframe",
];
const BLOCK_TAGS: [&str; 8] = ["p", "h1", "h2", "h3", "h4", "li", "blockquote", "pre"];

/// Extracted main content and the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub html: String,
    pub source: ContentSource,
}

/// A single extraction strategy.
pub trait Extractor: Send + Sync {
    /// Tag recorded when this stage wins.
    fn source(&self) -> ContentSource;

    /// Visible text the output must exceed.
    fn min_chars(&self) -> usize {
        MIN_USEFUL_CHARS
    }

    fn extract(&self, doc: &Html) -> StageOutcome<String>;
}

/// Ordered extraction stages.
pub struct ExtractionCascade {
    stages: Vec<Box<dyn Extractor>>,
}

impl ExtractionCascade {
    /// Full-text, readability, article metadata, then container heuristics.
    pub fn standard() -> Self {
        Self::with_stages(vec![
            Box::new(FullTextExtractor),
            Box::new(ReadabilityExtractor),
            Box::new(ArticleMetadataExtractor),
            Box::new(HeuristicExtractor),
        ])
    }

    pub fn with_stages(stages: Vec<Box<dyn Extractor>>) -> Self {
        Self { stages }
    }

    /// Extract the main content of `page`, or `None` if no stage succeeds.
    pub fn extract(&self, page: &str) -> Option<ExtractedContent> {
        if page.trim().is_empty() {
            return None;
        }
        if is_plaintext(page) {
            let html = plaintext_to_html(page);
            return (!html.is_empty()).then_some(ExtractedContent {
                html,
                source: ContentSource::Plaintext,
            });
        }

        let doc = Html::parse_document(page);
        for stage in &self.stages {
            match stage.extract(&doc) {
                StageOutcome::Content(html) => {
                    let chars = visible_chars(&html);
                    if chars > stage.min_chars() {
                        debug!(stage = %stage.source(), chars, "Extraction stage accepted");
                        return Some(ExtractedContent {
                            html,
                            source: stage.source(),
                        });
                    }
                    debug!(stage = %stage.source(), chars, "Extraction stage too short");
                }
                StageOutcome::Empty => debug!(stage = %stage.source(), "Extraction stage empty"),
                StageOutcome::Failed(reason) => {
                    debug!(stage = %stage.source(), reason = %reason, "Extraction stage failed")
                }
            }
        }
        None
    }
}

/// Input with no `<` in its first 1000 characters is treated as plain text.
pub fn is_plaintext(page: &str) -> bool {
    !page.chars().take(PLAINTEXT_PROBE_CHARS).any(|c| c == '<')
}

/// Wrap blank-line-separated blocks into escaped paragraphs.
///
/// Single line breaks inside a block are kept as `<br>` so line-oriented
/// cleanup still sees them.
pub fn plaintext_to_html(text: &str) -> String {
    BLANK_LINES
        .split(&text.replace("\r\n", "\n"))
        .map(|block| {
            block
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| html_escape::encode_text(l).into_owned())
                .collect::<Vec<_>>()
                .join("<br>")
        })
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", p))
        .collect()
}

/// Boilerplate-removal extraction: every content block outside navigation,
/// chrome and link-heavy lists.
pub struct FullTextExtractor;

impl Extractor for FullTextExtractor {
    fn source(&self) -> ContentSource {
        ContentSource::FullText
    }

    fn extract(&self, doc: &Html) -> StageOutcome<String> {
        let blocks: Vec<Block> = doc
            .select(&BLOCK_SELECTOR)
            .filter(|el| !nested_in_block(*el))
            .filter(|el| !in_boilerplate(*el))
            .filter_map(Block::from_element)
            .filter(|b| !(b.link_density > 0.5 && b.text.chars().count() < MIN_USEFUL_CHARS))
            .collect();

        blocks_outcome(&blocks)
    }
}

/// Readability-style scoring: paragraphs vote for their parent and
/// grandparent, and the best-scoring container's blocks are returned.
pub struct ReadabilityExtractor;

impl ReadabilityExtractor {
    fn initial_score(el: ElementRef) -> f64 {
        let tag_score = match el.value().name() {
            "article" => 10.0,
            "div" => 5.0,
            "pre" | "td" | "blockquote" => 3.0,
            "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
            _ => 0.0,
        };
        tag_score + class_weight(el)
    }
}

impl Extractor for ReadabilityExtractor {
    fn source(&self) -> ContentSource {
        ContentSource::Readability
    }

    fn extract(&self, doc: &Html) -> StageOutcome<String> {
        let mut scores: HashMap<NodeId, f64> = HashMap::new();

        for p in doc.select(&PARAGRAPH_SELECTOR) {
            let text = collapse(&p.text().collect::<String>());
            let len = text.chars().count();
            if len < 25 {
                continue;
            }
            let score = 1.0 + text.matches(',').count() as f64 + (len as f64 / 100.0).min(3.0);

            let ancestors: Vec<ElementRef> = p.ancestors().filter_map(ElementRef::wrap).take(2).collect();
            for (depth, ancestor) in ancestors.into_iter().enumerate() {
                let entry = scores
                    .entry(ancestor.id())
                    .or_insert_with(|| Self::initial_score(ancestor));
                *entry += if depth == 0 { score } else { score / 2.0 };
            }
        }

        let best = scores
            .into_iter()
            .filter_map(|(id, score)| {
                let el = doc.tree.get(id).and_then(ElementRef::wrap)?;
                Some((el, score * (1.0 - link_density(el))))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1));

        let Some((candidate, _)) = best else {
            return StageOutcome::Empty;
        };

        let blocks: Vec<Block> = candidate
            .select(&BLOCK_SELECTOR)
            .filter(|el| !nested_in_block(*el))
            .filter(|el| !in_boilerplate(*el))
            .filter_map(Block::from_element)
            .collect();

        blocks_outcome(&blocks)
    }
}

/// Article body published as structured metadata (JSON-LD or microdata).
pub struct ArticleMetadataExtractor;

impl Extractor for ArticleMetadataExtractor {
    fn source(&self) -> ContentSource {
        ContentSource::ArticleMetadata
    }

    fn extract(&self, doc: &Html) -> StageOutcome<String> {
        let mut parse_error = None;
        for script in doc.select(&LD_JSON_SELECTOR) {
            let raw = script.text().collect::<String>();
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => {
                    if let Some(body) = find_article_body(&value) {
                        return StageOutcome::Content(plaintext_paragraphs(&body));
                    }
                }
                Err(e) => parse_error = Some(e.to_string()),
            }
        }

        if let Some(body) = doc.select(&ARTICLE_BODY_SELECTOR).next() {
            let blocks: Vec<Block> = body
                .select(&BLOCK_SELECTOR)
                .filter(|el| !nested_in_block(*el))
                .filter_map(Block::from_element)
                .collect();
            if !blocks.is_empty() {
                return blocks_outcome(&blocks);
            }
            let text = body.text().collect::<Vec<_>>().join("\n");
            return StageOutcome::Content(plaintext_paragraphs(&text));
        }

        match parse_error {
            Some(e) => StageOutcome::Failed(e),
            None => StageOutcome::Empty,
        }
    }
}

/// Well-known article containers, then the largest text container.
pub struct HeuristicExtractor;

impl Extractor for HeuristicExtractor {
    fn source(&self) -> ContentSource {
        ContentSource::Heuristic
    }

    fn min_chars(&self) -> usize {
        MIN_CONTAINER_CHARS
    }

    fn extract(&self, doc: &Html) -> StageOutcome<String> {
        for selector in HEURISTIC_CONTAINERS.iter() {
            if let Some(node) = doc
                .select(selector)
                .find(|el| text_chars(*el) > MIN_CONTAINER_CHARS)
            {
                return StageOutcome::Content(node.html());
            }
        }

        doc.select(&FALLBACK_CONTAINER_SELECTOR)
            .map(|el| (text_chars(el), el))
            .filter(|(chars, _)| *chars > MIN_CONTAINER_CHARS)
            .max_by_key(|(chars, _)| *chars)
            .map(|(_, el)| StageOutcome::Content(el.html()))
            .unwrap_or(StageOutcome::Empty)
    }
}

struct Block {
    heading: bool,
    text: String,
    link_density: f64,
}

impl Block {
    fn from_element(el: ElementRef) -> Option<Self> {
        let text = collapse(&el.text().collect::<String>());
        if text.is_empty() {
            return None;
        }
        Some(Self {
            heading: matches!(el.value().name(), "h1" | "h2" | "h3" | "h4"),
            link_density: link_density(el),
            text,
        })
    }

    fn to_html(&self) -> String {
        let tag = if self.heading { "h3" } else { "p" };
        format!("<{0}>{1}</{0}>", tag, html_escape::encode_text(&self.text))
    }
}

fn blocks_outcome(blocks: &[Block]) -> StageOutcome<String> {
    if blocks.is_empty() {
        return StageOutcome::Empty;
    }
    StageOutcome::Content(blocks.iter().map(Block::to_html).collect())
}

fn plaintext_paragraphs(text: &str) -> String {
    text.lines()
        .map(collapse)
        .filter(|l| !l.is_empty())
        .map(|l| format!("<p>{}</p>", html_escape::encode_text(&l)))
        .collect()
}

fn find_article_body(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            if let Some(body) = map.get("articleBody").and_then(Value::as_str) {
                if !body.trim().is_empty() {
                    return Some(body.to_string());
                }
            }
            map.values().find_map(find_article_body)
        }
        Value::Array(items) => items.iter().find_map(find_article_body),
        _ => None,
    }
}

fn nested_in_block(el: ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| BLOCK_TAGS.contains(&a.value().name()))
}

fn in_boilerplate(el: ElementRef) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .any(|a| BOILERPLATE_TAGS.contains(&a.value().name()) || has_junk_attr(a))
}

fn has_junk_attr(el: ElementRef) -> bool {
    let value = el.value();
    [value.attr("class"), value.attr("id"), value.attr("role")]
        .into_iter()
        .flatten()
        .any(|attr| JUNK_ATTR.is_match(attr) || attr.eq_ignore_ascii_case("navigation"))
}

fn class_weight(el: ElementRef) -> f64 {
    let value = el.value();
    let mut weight = 0.0;
    for attr in [value.attr("class"), value.attr("id")].into_iter().flatten() {
        if JUNK_ATTR.is_match(attr) {
            weight -= 25.0;
        }
        if POSITIVE_ATTR.is_match(attr) {
            weight += 25.0;
        }
    }
    weight
}

fn link_density(el: ElementRef) -> f64 {
    let total = text_chars(el);
    if total == 0 {
        return 0.0;
    }
    let linked: usize = el.select(&LINK_SELECTOR).map(text_chars).sum();
    linked as f64 / total as f64
}

fn text_chars(el: ElementRef) -> usize {
    collapse(&el.text().collect::<String>()).chars().count()
}

fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

fn visible_chars(html: &str) -> usize {
    let fragment = Html::parse_fragment(html);
    collapse(&fragment.root_element().text().collect::<String>())
        .chars()
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn sentence(n: usize) -> String {
        "This sentence, which is part of the story, carries real content. ".repeat(n)
    }

    struct Scripted {
        source: ContentSource,
        output: StageOutcome<String>,
        calls: Arc<Mutex<Vec<ContentSource>>>,
    }

    impl Extractor for Scripted {
        fn source(&self) -> ContentSource {
            self.source
        }

        fn extract(&self, _doc: &Html) -> StageOutcome<String> {
            self.calls.lock().unwrap().push(self.source);
            self.output.clone()
        }
    }

    #[test]
    fn test_cascade_stops_at_first_long_result() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let stage = |source, output| -> Box<dyn Extractor> {
            Box::new(Scripted {
                source,
                output,
                calls: calls.clone(),
            })
        };
        let cascade = ExtractionCascade::with_stages(vec![
            stage(ContentSource::FullText, StageOutcome::Content("<p>short</p>".to_string())),
            stage(ContentSource::Readability, StageOutcome::Failed("boom".to_string())),
            stage(ContentSource::ArticleMetadata, StageOutcome::Content(format!("<p>{}</p>", sentence(5)))),
            stage(ContentSource::Heuristic, StageOutcome::Content(format!("<p>{}</p>", sentence(5)))),
        ]);

        let result = cascade.extract("<html><body><p>x</p></body></html>").unwrap();
        assert_eq!(result.source, ContentSource::ArticleMetadata);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                ContentSource::FullText,
                ContentSource::Readability,
                ContentSource::ArticleMetadata
            ]
        );
    }

    #[test]
    fn test_plaintext_is_wrapped() {
        let result = ExtractionCascade::standard()
            .extract("First line\ncontinues\n\nSecond & last")
            .unwrap();
        assert_eq!(result.source, ContentSource::Plaintext);
        assert_eq!(result.html, "<p>First line<br>continues</p><p>Second &amp; last</p>");
    }

    #[test]
    fn test_plaintext_probe_only_checks_prefix() {
        let late_tag = format!("{}<b>", "a".repeat(1200));
        assert!(is_plaintext(&late_tag));
        assert!(!is_plaintext("<p>hi</p>"));
    }

    #[test]
    fn test_full_text_skips_navigation() {
        let page = format!(
            "<html><body><nav><ul><li><a href='/'>Home</a></li></ul></nav>\
             <div class='share-bar'><p>Share this on social</p></div>\
             <main><h2>Headline</h2><p>{}</p><p>{}</p></main>\
             <footer><p>Copyright</p></footer></body></html>",
            sentence(2),
            sentence(2)
        );
        let result = ExtractionCascade::standard().extract(&page).unwrap();
        assert_eq!(result.source, ContentSource::FullText);
        assert!(result.html.starts_with("<h3>Headline</h3>"));
        assert!(!result.html.contains("Home"));
        assert!(!result.html.contains("Share this"));
        assert!(!result.html.contains("Copyright"));
    }

    #[test]
    fn test_readability_picks_dense_container() {
        let doc = Html::parse_document(&format!(
            "<html><body><div id='sidebar'><p>{}</p></div>\
             <div class='story-body'><p>{}</p><p>{}</p><p>{}</p></div></body></html>",
            sentence(1),
            sentence(2),
            sentence(2),
            sentence(2)
        ));
        let html = ReadabilityExtractor.extract(&doc).content().unwrap();
        assert_eq!(html.matches("<p>").count(), 3);
    }

    #[test]
    fn test_article_metadata_from_json_ld() {
        let doc = Html::parse_document(
            r#"<html><head><script type="application/ld+json">
            {"@graph": [{"@type": "WebPage"}, {"@type": "NewsArticle", "articleBody": "Para one.\nPara two."}]}
            </script></head><body></body></html>"#,
        );
        assert_eq!(
            ArticleMetadataExtractor.extract(&doc),
            StageOutcome::Content("<p>Para one.</p><p>Para two.</p>".to_string())
        );
    }

    #[test]
    fn test_heuristic_prefers_known_container() {
        let doc = Html::parse_document(&format!(
            "<html><body><div>{}</div><div data-component=\"ArticleBody\">{}</div></body></html>",
            sentence(6),
            sentence(3)
        ));
        let html = HeuristicExtractor.extract(&doc).content().unwrap();
        assert!(html.starts_with("<div data-component=\"ArticleBody\">"));
    }

    #[test]
    fn test_nothing_usable_returns_none() {
        assert!(ExtractionCascade::standard()
            .extract("<html><body><p>Too short.</p></body></html>")
            .is_none());
        assert!(ExtractionCascade::standard().extract("   ").is_none());
    }
}
