/// Parse a numeric token from a report, tolerating thousands separators.
///
/// Handles formats like:
/// - "1200" -> 1200.0
/// - "1,234.5" -> 1234.5
/// - "0.25" -> 0.25
/// - ".5" -> 0.5
///
/// Returns None for anything that is not a number once commas are removed.
pub fn parse_number(s: &str) -> Option<f64> {
    let normalized: String = s.trim().chars().filter(|&c| c != ',').collect();
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_integer() {
        assert_eq!(parse_number("1200"), Some(1200.0));
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number("12,345,678"), Some(12_345_678.0));
    }

    #[test]
    fn test_leading_dot() {
        assert_eq!(parse_number(".5"), Some(0.5));
    }

    #[test]
    fn test_whitespace_trimming() {
        assert_eq!(parse_number("  0.25 "), Some(0.25));
    }

    #[test]
    fn test_separator_only_returns_none() {
        assert_eq!(parse_number(","), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_garbage_returns_none() {
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number("n/a"), None);
    }
}
