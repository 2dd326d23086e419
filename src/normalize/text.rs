//! Per-paragraph text cleanup.
//!
//! Each paragraph is cleaned line by line so that boilerplate lines coming
//! from reader proxies can be dropped whole. Surviving lines are joined with
//! a single space and the joined paragraph is cleaned again until it stops
//! changing, so cleaning the output a second time is a no-op.

use regex::Regex;
use std::sync::LazyLock;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect(concat!(stringify!($name), " should compile")));
    };
}

pattern!(HORIZONTAL_SPACE, r"[ \t\u{a0}]+");
pattern!(BRACKET_LETTER, r"\[([A-Za-z])\]");
pattern!(MD_IMAGE, r"!\[([^\]]*)\]\([^)]*\)");
pattern!(MD_LINK, r"\[([^\]]+)\]\([^)]*\)");
pattern!(MD_UNDERSCORE_ITALIC, r"(^|[\s(\[])_([^_\s][^_]*?)_($|[\s.,;:!?)\]])");
pattern!(MD_HEADING, r"^(?:\s{0,3}#{1,6}\s+)+");
pattern!(MD_BLOCKQUOTE, r"^\s*>\s?");
pattern!(BULLET, r"^\s*(?:[-*•]\s+)+");
pattern!(URL_SOURCE_INLINE, r"(?i)\bURL\s*Source\b\s*:?\s*\S+");
pattern!(MARKDOWN_CONTENT_INLINE, r"(?i)\bMarkdown\s*Content\s*:");
pattern!(
    PAREN_CREDIT,
    r"(?i)\s*\((?:photos?|credit|credits|image|illustration|courtesy)\b[^)]*\)"
);
pattern!(
    PAREN_WIRE_CREDIT,
    r"\s*\([^)]*\b(?:Getty Images|AP Photo|Associated Press|Reuters|AFP|EPA|Shutterstock|Alamy|Unsplash|Bloomberg)\b[^)]*\)"
);
pattern!(
    TRAILING_CREDIT,
    r"(?i)\s*\b(?:photo|photos|credit|courtesy)\s*:\s*[^.!?]{0,80}$"
);
pattern!(
    LEADING_CREDIT_LABEL,
    r"(?i)^\s*(?:(?:photo|photos|credit|credits|image|illustration)(?:\s+illustration)?\s*(?::|by\b)|courtesy\b)"
);
pattern!(
    WIRE_SERVICE,
    r"\b(?:Getty Images|Getty|AP|Associated Press|Reuters|AFP|EPA|Shutterstock|Alamy|Unsplash|Bloomberg)\b"
);
pattern!(CREDIT_WORD, r"(?i)\b(?:photo|photos|credit|via)\b");
pattern!(PARENTHETICAL, r"\([^)]*\)");

/// Whole-line boilerplate, dropped entirely.
static NOISE_LINES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^\s*(?:URL\s*Source|Markdown\s*Content)\b.*$",
        r"(?i)^\s*!?\s*Image\b.*$",
        r"(?i)^\s*Illustration\b.*$",
        r"(?i)^\s*(?:Publish|Published)\s*Time:\s*\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}.*$",
        r"(?i)^\s*(?:Updated|Published|Posted)(?:\s+(?:on|at))?\s*:?\s*(?:\d{4}-\d{2}-\d{2}|(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}).*$",
        r"(?i)^\s*Title\s*:.*$",
        r"(?i)^\s*Share this story\.?\s*$",
        r"(?i)^\s*Thanks to\b.*$",
        r"(?i)(?:verify you are human|captcha|needs to review the security of your connection|enable javascript and cookies|checking your browser)",
        r"^\s*(?i:by)\s+\p{Lu}[\p{L}.'-]*(?:\s+\p{Lu}[\p{L}.'-]*){0,3}(?:\s*(?:,|and|&)\s*\p{Lu}[\p{L}.'-]*(?:\s+\p{Lu}[\p{L}.'-]*){0,3})*\s*$",
    ]
    .iter()
    .filter_map(|re| Regex::new(re).ok())
    .collect()
});

/// Emoji blocks removed when emoji stripping is on.
const EMOJI_RANGES: [(u32, u32); 7] = [
    (0x1F600, 0x1F64F),
    (0x1F300, 0x1F5FF),
    (0x1F680, 0x1F6FF),
    (0x1F1E0, 0x1F1FF),
    (0x2700, 0x27BF),
    (0x1F900, 0x1F9FF),
    (0x2600, 0x26FF),
];

/// Upper bound on re-cleaning a joined paragraph.
const MAX_PASSES: usize = 8;

/// Clean one raw paragraph. `None` when nothing survives.
pub fn clean_paragraph(raw: &str, remove_emoji: bool) -> Option<String> {
    let lines: Vec<String> = raw
        .lines()
        .filter_map(|line| clean_line(line, remove_emoji))
        .collect();
    let mut text = lines.join(" ");

    // A byline or link split across lines only matches once joined.
    for _ in 0..MAX_PASSES {
        let next = clean_line(&text, remove_emoji)?;
        if next == text {
            break;
        }
        text = next;
    }
    Some(text)
}

fn clean_line(line: &str, remove_emoji: bool) -> Option<String> {
    let text = html_escape::decode_html_entities(line);
    let text = collapse_horizontal(&text);
    let text = BRACKET_LETTER.replace_all(&text, "$1");
    let text = strip_markdown(&text);

    if is_noise_line(&text) {
        return None;
    }
    let text = URL_SOURCE_INLINE.replace_all(&text, "");
    let text = MARKDOWN_CONTENT_INLINE.replace_all(&text, "");
    let text = strip_inline_credits(&text);
    let text = BULLET.replace(&text, "");
    let text = space_after_colons(&text);
    let text = if remove_emoji {
        strip_emoji(&text)
    } else {
        text
    };

    let text = collapse_horizontal(&text);
    (!text.is_empty()).then_some(text)
}

fn collapse_horizontal(text: &str) -> String {
    HORIZONTAL_SPACE.replace_all(text, " ").trim().to_string()
}

/// Remove Markdown link, image, emphasis, code, heading and quote syntax.
pub fn strip_markdown(text: &str) -> String {
    let text = MD_IMAGE.replace_all(text, "$1");
    let text = MD_LINK.replace_all(&text, "$1");
    let text = text.replace("**", "").replace("__", "").replace('`', "");
    let text = MD_UNDERSCORE_ITALIC.replace_all(&text, "$1$2$3");
    let text = MD_HEADING.replace(&text, "");
    MD_BLOCKQUOTE.replace(&text, "").into_owned()
}

/// Whether a whole line is boilerplate.
pub fn is_noise_line(line: &str) -> bool {
    NOISE_LINES.iter().any(|re| re.is_match(line))
}

/// Remove parenthetical and trailing photo credits.
pub fn strip_inline_credits(text: &str) -> String {
    let text = PAREN_CREDIT.replace_all(text, "");
    let text = PAREN_WIRE_CREDIT.replace_all(&text, "");
    TRAILING_CREDIT.replace(&text, "").into_owned()
}

/// Whether an element's whole text is a photo credit or caption line.
pub fn is_credit_text(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text.chars().count() >= 200 {
        return false;
    }
    if LEADING_CREDIT_LABEL.is_match(text) {
        return true;
    }
    let outside_parens = PARENTHETICAL.replace_all(text, "");
    WIRE_SERVICE.is_match(&outside_parens)
        && CREDIT_WORD.is_match(&outside_parens)
        && outside_parens.split_whitespace().count() <= 12
}

/// Ensure a space follows every colon, leaving times and URLs alone.
pub fn space_after_colons(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        if c != ':' {
            continue;
        }
        let Some(&next) = chars.get(i + 1) else {
            continue;
        };
        let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
        let keep = next.is_whitespace() || next == '/' || (prev_digit && next.is_ascii_digit());
        if !keep {
            out.push(' ');
        }
    }
    out
}

/// Drop characters in the emoji denylist, plus joiners left behind.
pub fn strip_emoji(text: &str) -> String {
    text.chars()
        .filter(|c| {
            let code = *c as u32;
            code != 0xFE0F
                && code != 0x200D
                && !EMOJI_RANGES
                    .iter()
                    .any(|(lo, hi)| (*lo..=*hi).contains(&code))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_is_stripped() {
        assert_eq!(
            strip_markdown("## **Big** [news](https://x.test) with `code` and _style_ ![chart](c.png)"),
            "Big news with code and style chart"
        );
        assert_eq!(strip_markdown("> quoted"), "quoted");
        assert_eq!(strip_markdown("snake_case_name stays"), "snake_case_name stays");
    }

    #[test]
    fn test_noise_lines() {
        for line in [
            "URL Source: https://news.test/a",
            "Markdown Content:",
            "Image 3: chart",
            "Published Time: 2025-10-14T08:00:00Z",
            "Title: Something",
            "Share this story.",
            "Thanks to Jane for editing.",
            "Please verify you are human",
            "By Ina Fried",
            "By Ina Fried and Madison Mills",
        ] {
            assert!(is_noise_line(line), "{}", line);
        }
        assert!(!is_noise_line("Byte-sized news for you."));
        assert!(!is_noise_line("by the numbers: a lot"));
        assert!(!is_noise_line("Images of the future are changing."));
    }

    #[test]
    fn test_clean_paragraph_pipeline() {
        assert_eq!(
            clean_paragraph("  - Why it matters:it&#39;s [R]ecent  news 🚀", true).unwrap(),
            "Why it matters: it's Recent news"
        );
        assert_eq!(
            clean_paragraph("Title: Foo\nReal line one\nURL Source: https://x", true).unwrap(),
            "Real line one"
        );
        assert!(clean_paragraph("Share this story", true).is_none());
    }

    #[test]
    fn test_repeated_markers_removed_in_one_pass() {
        assert_eq!(clean_paragraph("- - item one", false).unwrap(), "item one");
        assert_eq!(clean_paragraph("* * * starred", false).unwrap(), "starred");
        assert_eq!(clean_paragraph("### ## nested", false).unwrap(), "nested");
    }

    #[test]
    fn test_joined_lines_are_cleaned_again() {
        assert!(clean_paragraph("By\nJane Doe", false).is_none());
        assert_eq!(
            clean_paragraph("[link\ntext](https://x.io)", false).unwrap(),
            "link text"
        );
    }

    #[test]
    fn test_colon_spacing_keeps_times_and_urls() {
        assert_eq!(space_after_colons("At 10:30 see https://x.test"), "At 10:30 see https://x.test");
        assert_eq!(space_after_colons("Key:value"), "Key: value");
        assert_eq!(space_after_colons("End:"), "End:");
    }

    #[test]
    fn test_credit_detection() {
        assert!(is_credit_text("Photo: Jane Doe/Getty Images"));
        assert!(is_credit_text("Courtesy of the artist"));
        assert!(is_credit_text("Jane Doe/Getty Images via AP"));
        assert!(!is_credit_text("Hello World! (Photo: Getty Images)"));
        assert!(!is_credit_text("Reuters reported the deal closed on Tuesday after regulators signed off on it."));
    }

    #[test]
    fn test_inline_credits_removed() {
        assert_eq!(strip_inline_credits("Hello World! (Photo: Getty Images)"), "Hello World!");
        assert_eq!(strip_inline_credits("A scene (Jane Doe/Reuters) today"), "A scene today");
        assert_eq!(strip_inline_credits("The rally. Photo: Jane Doe"), "The rally.");
    }

    #[test]
    fn test_emoji_removed() {
        assert_eq!(strip_emoji("Hi 👋 there ☀️!"), "Hi  there !");
    }
}
