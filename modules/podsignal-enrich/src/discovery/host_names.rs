use std::sync::LazyLock;

use regex::Regex;

static HOST_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:hosted by|co-hosted by|the hosts? (?:is|are|was|were)|hosts?:|presented by)\s+(?:podcasters?\s+)?(.+?)(?:[.;!?\n(]|,\s+who\b|\s+who\b|$)",
    )
    .expect("valid host phrase regex")
});

static SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:,|&|\band\b)\s*").expect("valid split regex"));

static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\p{Lu}[\p{L}'\-]+(?:\s+(?:\p{Lu}\.|\p{Lu}[\p{L}'\-]+)){0,3}$")
        .expect("valid name regex")
});

/// Pull host names out of free text such as a search answer.
///
/// Looks for "hosted by ..." style phrasing first; otherwise treats a short text as a
/// bare name list. Splits on commas, "&" and "and"; keeps capitalized 1-4 word names.
pub fn extract_host_names(text: &str) -> Vec<String> {
    let text = text.trim();
    let candidates = match HOST_PHRASE.captures(text).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None if text.len() <= 80 => text.trim_end_matches('.'),
        None => return Vec::new(),
    };

    let mut names: Vec<String> = Vec::new();
    for part in SPLIT.split(candidates) {
        let part = part.trim().trim_matches(|c: char| c == '"' || c == '\'');
        if NAME.is_match(part) && !names.iter().any(|n| n == part) {
            names.push(part.to_string());
        }
    }
    names
}
