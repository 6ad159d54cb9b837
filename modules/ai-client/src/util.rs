/// Longest prefix of `s` that fits in `max_bytes` without splitting a character.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let end = (0..=max_bytes)
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0);
    &s[..end]
}

/// Remove a surrounding markdown fence (with or without a language tag) from model
/// output. Unfenced text is returned trimmed.
pub fn strip_code_blocks(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line, if any.
    let body = match body.find('\n') {
        Some(newline) if !body[..newline].contains('{') => &body[newline + 1..],
        _ => body,
    };
    body.trim_end().trim_end_matches("```").trim()
}
