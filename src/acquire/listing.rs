//! Single-page newsletter listings.
//!
//! A listing page carries one whole issue: an intro followed by numbered
//! sections. Plain-text listings are split into those sections directly.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Section numbers that must all be present for a plain-text issue.
const REQUIRED_SECTIONS: [u32; 4] = [1, 2, 3, 4];
const MAX_SECTIONS: usize = 5;
const DATE_SEARCH_CHARS: usize = 2000;
const DATE_HEADING_LIMIT: usize = 8;

static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<num>[1-5])(?:\.|\)|:)?\s+(?P<title>.+)$")
        .expect("section header regex should compile")
});
const ISSUE_DATE_PATTERN: &str = r"\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},\s+20\d{2}\b";
static ISSUE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ISSUE_DATE_PATTERN).expect("issue date regex should compile"));
/// Page chrome on rendered listings is often upper- or lower-cased.
static ISSUE_DATE_ANY_CASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i){}", ISSUE_DATE_PATTERN)).expect("issue date regex should compile")
});
static TRAILING_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*:\s*$").expect("trailing colon regex should compile"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("blank line regex should compile"));
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex should compile"));
static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3").expect("heading selector should parse"));

/// A numbered section of an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSection {
    pub number: u32,
    pub title: String,
    pub paragraphs: Vec<String>,
}

/// One newsletter issue parsed from a plain-text listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingIssue {
    /// Date in "Month D, YYYY" form when one was found.
    pub published: Option<String>,
    pub intro: Vec<String>,
    pub sections: Vec<IssueSection>,
}

impl ListingIssue {
    /// Render as HTML: intro paragraphs, then `<h3>n. title</h3>` per section.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for p in &self.intro {
            html.push_str(&paragraph(p));
        }
        for section in &self.sections {
            html.push_str(&format!(
                "<h3>{}. {}</h3>",
                section.number,
                html_escape::encode_text(&section.title)
            ));
            for p in &section.paragraphs {
                html.push_str(&paragraph(p));
            }
        }
        html
    }
}

fn paragraph(text: &str) -> String {
    format!("<p>{}</p>", html_escape::encode_text(&TAG.replace_all(text, "")))
}

/// Whether `url` matches one of the configured listing path patterns.
pub fn is_listing_url(url: &str, patterns: &[String]) -> bool {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    patterns
        .iter()
        .filter(|p| !p.is_empty())
        .any(|p| path.contains(p.as_str()))
}

/// First "Month D, 20YY" date in `text`, month name capitalized.
pub fn find_issue_date(text: &str) -> Option<String> {
    ISSUE_DATE.find(text).map(|m| m.as_str().to_string())
}

fn find_issue_date_any_case(text: &str) -> Option<String> {
    ISSUE_DATE_ANY_CASE.find(text).map(|m| m.as_str().to_string())
}

/// Issue date from the first headings, else from the start of the page text.
pub fn find_issue_date_in_html(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let from_headings = doc
        .select(&HEADING_SELECTOR)
        .take(DATE_HEADING_LIMIT)
        .find_map(|h| find_issue_date_any_case(&h.text().collect::<Vec<_>>().join(" ")));
    if from_headings.is_some() {
        return from_headings;
    }

    let text = doc.root_element().text().collect::<Vec<_>>().join(" ");
    let prefix: String = text.chars().take(DATE_SEARCH_CHARS).collect();
    find_issue_date_any_case(&prefix)
}

/// Split plain text into one issue.
///
/// Returns `None` unless sections 1 through 4 are all present. The first
/// occurrence of each number wins and at most five sections are kept.
pub fn parse_issue_plaintext(text: &str) -> Option<ListingIssue> {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();

    let headers: Vec<(usize, u32, String)> = lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            let caps = SECTION_HEADER.captures(line.trim())?;
            let number = caps["num"].parse().ok()?;
            let title = caps["title"]
                .trim()
                .replace("**", "")
                .replace("__", "")
                .replace('`', "");
            let title = TRAILING_COLON.replace(&title, "").to_string();
            Some((idx, number, title))
        })
        .collect();

    let present: HashSet<u32> = headers.iter().map(|(_, n, _)| *n).collect();
    if !REQUIRED_SECTIONS.iter().all(|n| present.contains(n)) {
        return None;
    }

    let mut seen = HashSet::new();
    let ordered: Vec<(usize, u32, String)> = headers
        .into_iter()
        .filter(|(_, n, _)| seen.insert(*n))
        .take(MAX_SECTIONS)
        .collect();

    let first_start = ordered.first().map(|(idx, _, _)| *idx)?;
    let intro = split_paragraphs(&lines[..first_start].join("\n"));

    let sections = ordered
        .iter()
        .enumerate()
        .map(|(i, (start, number, title))| {
            let end = ordered.get(i + 1).map(|(idx, _, _)| *idx).unwrap_or(lines.len());
            IssueSection {
                number: *number,
                title: title.clone(),
                paragraphs: split_paragraphs(&lines[start + 1..end].join("\n")),
            }
        })
        .collect();

    Some(ListingIssue {
        published: find_issue_date(text),
        intro,
        sections,
    })
}

fn split_paragraphs(block: &str) -> Vec<String> {
    BLANK_LINES
        .split(block.trim())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
