//! Lenient numeric/text casts for scraper output. Anything malformed becomes `None`
//! instead of an error.

use serde_json::Value;

/// Non-negative count from a number or a human string (`"1,234"`, `"1.2K"`, `"3M"`).
/// Negative, NaN, infinite and boolean inputs yield `None`.
pub fn to_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Some(u);
            }
            from_float(n.as_f64()?)
        }
        Value::String(s) => parse_count(s),
        _ => None,
    }
}

fn from_float(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f < u64::MAX as f64).then(|| f.round() as u64)
}

fn parse_count(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (number, multiplier) = match cleaned.chars().last()?.to_ascii_lowercase() {
        'k' => (&cleaned[..cleaned.len() - 1], 1_000.0),
        'm' => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        'b' => (&cleaned[..cleaned.len() - 1], 1_000_000_000.0),
        _ => (cleaned.as_str(), 1.0),
    };

    let parsed: f64 = number.parse().ok()?;
    from_float(parsed * multiplier)
}

/// Trimmed non-empty string.
pub fn to_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_from_numbers() {
        assert_eq!(to_count(&json!(1234)), Some(1234));
        assert_eq!(to_count(&json!(12.6)), Some(13));
        assert_eq!(to_count(&json!(-5)), None);
        assert_eq!(to_count(&json!(-0.5)), None);
    }

    #[test]
    fn counts_from_strings() {
        assert_eq!(to_count(&json!("1,234")), Some(1234));
        assert_eq!(to_count(&json!("1.2K")), Some(1200));
        assert_eq!(to_count(&json!("3M")), Some(3_000_000));
        assert_eq!(to_count(&json!(" 45 ")), Some(45));
        assert_eq!(to_count(&json!("NaN")), None);
        assert_eq!(to_count(&json!("lots")), None);
        assert_eq!(to_count(&json!("")), None);
        assert_eq!(to_count(&json!("-10")), None);
    }

    #[test]
    fn non_numeric_values_are_none() {
        assert_eq!(to_count(&json!(true)), None);
        assert_eq!(to_count(&json!(null)), None);
        assert_eq!(to_count(&json!({"count": 1})), None);
    }

    #[test]
    fn text_and_bool() {
        assert_eq!(to_text(&json!("  Tech Show ")), Some("Tech Show".to_string()));
        assert_eq!(to_text(&json!("   ")), None);
        assert_eq!(to_text(&json!(5)), None);
        assert_eq!(to_bool(&json!(true)), Some(true));
        assert_eq!(to_bool(&json!("FALSE")), Some(false));
        assert_eq!(to_bool(&json!(1)), None);
    }
}
