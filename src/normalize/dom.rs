//! Markup flattening.
//!
//! Detaches non-textual, credit and sponsored elements from the parsed tree,
//! then reads the remaining paragraph-level blocks in document order. Link
//! elements contribute only their visible text.

use super::text::is_credit_text;
use ego_tree::iter::Edge;
use ego_tree::NodeId;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static NON_TEXT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("img, picture, figure, figcaption, svg, video, audio, script, style, noscript")
        .expect("non-text selector should parse")
});
static CREDIT_CANDIDATES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p, span, div, small, cite, em, i, caption, li")
        .expect("credit selector should parse")
});
static AD_CANDIDATES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, div, section").expect("ad selector should parse"));
static BLOCKS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p, h1, h2, h3, h4, h5, h6, li, blockquote")
        .expect("block selector should parse")
});
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("blank line regex should compile"));

const BLOCK_TAGS: [&str; 9] = ["p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote"];
const BREAK_TAGS: [&str; 12] = [
    "div", "section", "article", "main", "header", "footer", "table", "tr", "ul", "ol", "dl", "body",
];

/// Flatten markup into raw paragraph texts. Lines inside a paragraph are
/// separated by `\n` where the markup had `<br>`.
pub fn flatten_blocks(html: &str, remove_ads: bool, ad_keywords: &[String]) -> Vec<String> {
    let mut doc = Html::parse_document(html);

    detach_matching(&mut doc, &NON_TEXT, |_| true);
    detach_matching(&mut doc, &CREDIT_CANDIDATES, |el| {
        !has_block_child(el) && is_credit_text(&element_text(el))
    });

    let keywords: Vec<String> = ad_keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if remove_ads && !keywords.is_empty() {
        detach_matching(&mut doc, &AD_CANDIDATES, |el| {
            let text = element_text(el).to_lowercase();
            keywords.iter().any(|k| text.contains(k.as_str()))
        });
    }

    let blocks: Vec<String> = doc
        .select(&BLOCKS)
        .filter(|el| !nested_in_block(*el))
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    if !blocks.is_empty() {
        return blocks;
    }

    split_paragraphs(&collect_text(doc.root_element(), true))
}

/// Split plain text on blank-line runs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    BLANK_LINES
        .split(&text.replace("\r\n", "\n"))
        .map(|p| tidy_lines(p))
        .filter(|p| !p.is_empty())
        .collect()
}

fn detach_matching<F>(doc: &mut Html, selector: &Selector, predicate: F)
where
    F: Fn(ElementRef) -> bool,
{
    let ids: Vec<NodeId> = doc
        .select(selector)
        .filter(|el| predicate(*el))
        .map(|el| el.id())
        .collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn nested_in_block(el: ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| BLOCK_TAGS.contains(&a.value().name()))
}

fn has_block_child(el: ElementRef) -> bool {
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|d| BLOCK_TAGS.contains(&d.value().name()) || d.value().name() == "div")
}

fn element_text(el: ElementRef) -> String {
    tidy_lines(&collect_text(el, false))
}

/// Gather text nodes, mapping `<br>` to a line break and, when
/// `paragraph_breaks` is set, container boundaries to blank lines.
fn collect_text(el: ElementRef, paragraph_breaks: bool) -> String {
    let mut out = String::new();
    for edge in el.traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Text(text) => out.push_str(&text.replace(['\n', '\r', '\t'], " ")),
                Node::Element(e) if e.name() == "br" => out.push('\n'),
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(e) = node.value() {
                    let name = e.name();
                    if paragraph_breaks && (BREAK_TAGS.contains(&name) || BLOCK_TAGS.contains(&name)) {
                        out.push_str("\n\n");
                    }
                }
            }
        }
    }
    out
}

/// Collapse whitespace per line and drop empty lines.
fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_in_order_without_nesting() {
        let html = "<h2>Head</h2><p>One <a href='https://x.test'>link</a> here.</p>\
                    <ul><li><p>Item</p></li></ul><blockquote><p>Quote</p></blockquote>";
        assert_eq!(
            flatten_blocks(html, false, &[]),
            vec!["Head", "One link here.", "Item", "Quote"]
        );
    }

    #[test]
    fn test_non_text_and_credits_removed() {
        let html = "<figure><img src='a.png'><figcaption>Chart</figcaption></figure>\
                    <p>Story text.</p><p>Photo: Jane Doe/Getty Images</p>\
                    <span>Jane Doe/Reuters via AP</span><script>var x = 1;</script>";
        assert_eq!(flatten_blocks(html, false, &[]), vec!["Story text."]);
    }

    #[test]
    fn test_ads_removed_case_insensitively() {
        let html = "<p>Real news.</p><div><p>Presented by ACME Corp.</p></div>";
        let keywords = vec!["presented by".to_string()];
        assert_eq!(flatten_blocks(html, true, &keywords), vec!["Real news."]);
        assert_eq!(flatten_blocks(html, false, &keywords).len(), 2);
    }

    #[test]
    fn test_line_breaks_survive() {
        assert_eq!(
            flatten_blocks("<p>Title: X<br>Body line</p>", false, &[]),
            vec!["Title: X\nBody line"]
        );
    }

    #[test]
    fn test_fallback_without_blocks() {
        let html = "<div>First chunk of text</div><div>Second chunk</div>";
        assert_eq!(
            flatten_blocks(html, false, &[]),
            vec!["First chunk of text", "Second chunk"]
        );
    }
}
