use std::sync::OnceLock;

use regex::Regex;

/// Tokens dropped from every prompt.
const STOPWORDS: &[&str] = &["the", "a", "an", "in", "is", "to", "of", "and", "for", "on"];

static NON_WORD: OnceLock<Regex> = OnceLock::new();

fn non_word() -> &'static Regex {
    NON_WORD.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_]").expect("invalid non-word pattern"))
}

/// Extract the keyword list from a free-text prompt.
///
/// The prompt is lowercased, every character outside `[a-zA-Z0-9_]` becomes a
/// space, and the result is split on whitespace. Tokens of length <= 2 and
/// stopwords are dropped. Order is first occurrence; duplicates are kept.
pub fn extract_keywords(prompt: &str) -> Vec<String> {
    let lowered = prompt.to_lowercase();
    non_word()
        .replace_all(&lowered, " ")
        .split_whitespace()
        .filter(|token| token.len() > 2 && !STOPWORDS.contains(token))
        .map(str::to_owned)
        .collect()
}
