//! Sentence-aware chunking for synthesis requests.

/// Sentence terminators, Latin and CJK, plus line breaks.
const TERMINATORS: [char; 7] = ['.', '!', '?', '。', '！', '？', '\n'];

/// Split text after every terminator; pieces are trimmed and empties dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if TERMINATORS.contains(&c) {
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
    }
    push_trimmed(&mut sentences, &current);
    sentences
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Greedily pack sentences into chunks of at most `max_chars` characters.
///
/// A sentence longer than `max_chars` becomes its own chunk. Sentences are
/// joined with a single space.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_chars = 0usize;

    for sentence in split_sentences(text) {
        let len = sentence.chars().count();
        if buf.is_empty() {
            buf = sentence;
            buf_chars = len;
        } else if buf_chars + 1 + len <= max_chars {
            buf.push(' ');
            buf.push_str(&sentence);
            buf_chars += 1 + len;
        } else {
            chunks.push(std::mem::replace(&mut buf, sentence));
            buf_chars = len;
        }
    }
    if !buf.is_empty() {
        chunks.push(buf);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentences_split_on_latin_and_cjk() {
        assert_eq!(
            split_sentences("One. Two! 三。 Four?\nFive"),
            vec!["One.", "Two!", "三。", "Four?", "Five"]
        );
    }

    #[test]
    fn test_packs_greedily() {
        let chunks = split_into_chunks("Aaaa. Bbbb. Cccc. Dddd.", 11);
        assert_eq!(chunks, vec!["Aaaa. Bbbb.", "Cccc. Dddd."]);
    }

    #[test]
    fn test_chunk_length_invariant() {
        let sentences: Vec<String> = (0..60)
            .map(|i| format!("{}.", "word ".repeat((i * 7) % 23 + 1).trim()))
            .collect();
        let text = sentences.join(" ");
        let max = 40;

        let chunks = split_into_chunks(&text, max);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            let oversized_single = split_sentences(chunk).len() == 1;
            assert!(chunk.chars().count() <= max || oversized_single, "{}", chunk);
        }
        assert_eq!(chunks.join(" "), split_sentences(&text).join(" "));
    }

    #[test]
    fn test_oversized_sentence_is_kept_whole() {
        let long = format!("{}.", "x".repeat(50));
        let chunks = split_into_chunks(&format!("Hi. {} Bye.", long), 10);
        assert_eq!(chunks, vec!["Hi.".to_string(), long, "Bye.".to_string()]);
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        assert!(split_into_chunks("  \n ", 100).is_empty());
    }

    #[test]
    fn test_text_without_terminators_is_one_chunk() {
        assert_eq!(split_into_chunks("  no full stop here ", 100), vec!["no full stop here"]);
    }
}
