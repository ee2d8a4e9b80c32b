//! Application questions embedded in a job description.
//!
//! HTML descriptions: every `<li>` / `<p>` whose text ends with `?`.
//! Plain text: every sentence ending with `?`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<li\b[^>]*>(.*?)</li\s*>|<p\b[^>]*>(.*?)</p\s*>")
        .expect("block pattern is valid")
});

static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"));

static SENTENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?\n]*[.!?]+").expect("sentence pattern is valid"));

/// Extracts candidate application questions, de-duplicated, in document order.
pub fn extract_questions(description: &str) -> Vec<String> {
    let candidates: Vec<String> = if TAG_REGEX.is_match(description) {
        BLOCK_REGEX
            .captures_iter(description)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| html_to_text(m.as_str()))
            .collect()
    } else {
        SENTENCE_REGEX
            .find_iter(description)
            .map(|m| collapse_whitespace(m.as_str()))
            .collect()
    };

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|text| text.ends_with('?') && text.len() > 1)
        .filter(|text| seen.insert(text.clone()))
        .collect()
}

fn html_to_text(fragment: &str) -> String {
    let without_tags = TAG_REGEX.replace_all(fragment, "");
    collapse_whitespace(&decode_entities(&without_tags))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_questions_from_html_blocks() {
        let html = r#"
        <div>
            <p>This is a job description.</p>
            <ul>
                <li>What is your greatest strength?</li>
                <li>Please describe your experience with Python.</li>
                <li>This is not a question.</li>
            </ul>
            <p>Why do you want to work here?</p>
        </div>
        "#;
        let questions = extract_questions(html);
        assert_eq!(
            questions,
            vec![
                "What is your greatest strength?".to_string(),
                "Why do you want to work here?".to_string()
            ]
        );
    }

    #[test]
    fn test_strips_inline_tags_and_entities() {
        let html = "<ul><li class=\"q\"><strong>Are you  authorized</strong> to work in the U.S.&nbsp;?</li></ul>";
        assert_eq!(
            extract_questions(html),
            vec!["Are you authorized to work in the U.S. ?".to_string()]
        );
    }

    #[test]
    fn test_plain_text_sentences() {
        let text = "Need Python and SQL skills. Do you have 5 years experience?";
        assert_eq!(
            extract_questions(text),
            vec!["Do you have 5 years experience?".to_string()]
        );
    }

    #[test]
    fn test_duplicates_are_removed() {
        let html = "<p>Can you relocate?</p><li>Can you relocate?</li>";
        assert_eq!(extract_questions(html).len(), 1);
    }

    #[test]
    fn test_no_questions() {
        assert!(extract_questions("We are hiring. Apply now!").is_empty());
        assert!(extract_questions("").is_empty());
    }
}
