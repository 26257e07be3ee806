// Text analysis shared by the index, the topic trainer and the summarizer.
//
// Tokens are lower-cased runs of alphanumeric characters (apostrophes and
// inner hyphens kept). Sentences are split on terminal punctuation that is
// followed by whitespace, so abbreviations inside numbers ("3.5") survive.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex_lite::Regex;
use stop_words::{get, LANGUAGE};

fn sentence_boundary() -> Option<&'static Regex> {
    static BOUNDARY: OnceLock<Option<Regex>> = OnceLock::new();
    BOUNDARY
        .get_or_init(|| Regex::new(r#"[.!?]+["'”’)\]]*\s+"#).ok())
        .as_ref()
}

fn stop_word_set() -> &'static HashSet<String> {
    static STOP_WORDS: OnceLock<HashSet<String>> = OnceLock::new();
    STOP_WORDS.get_or_init(|| get(LANGUAGE::English).into_iter().collect())
}

/// Whether `word` (already lower-cased) is an English stop word.
pub fn is_stop_word(word: &str) -> bool {
    stop_word_set().contains(word)
}

/// Split text into trimmed, non-empty sentences in reading order.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    if let Some(boundary_re) = sentence_boundary() {
        for boundary in boundary_re.find_iter(text) {
            push_sentence(&mut sentences, &text[start..boundary.end()]);
            start = boundary.end();
        }
    }
    push_sentence(&mut sentences, &text[start..]);
    sentences
}

fn push_sentence(out: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Lower-cased word tokens, stop words included.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .map(|t| t.trim_matches(|c: char| c == '\'' || c == '-'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// A token carries content if it is not a stop word and longer than one
/// character.
pub fn is_content_term(token: &str) -> bool {
    token.chars().count() > 1 && !is_stop_word(token)
}

pub fn content_terms(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| is_content_term(t))
        .cloned()
        .collect()
}
