//! Time-spec parsing - "60s", "2min", "45" into whole seconds

/// Parse a free-form duration into seconds.
///
/// Malformed input never errors; it degrades to 0, which callers treat as
/// "no timer".
pub fn parse_time_to_seconds(text: &str) -> u32 {
    let time = text.trim().to_lowercase();
    if time.is_empty() {
        return 0;
    }

    if let Some(prefix) = time.strip_suffix('s') {
        return parse_int_prefix(prefix).unwrap_or(0);
    }

    if time.contains('m') {
        let stripped = time.replace("min", "").replace('m', "");
        return parse_int_prefix(&stripped)
            .map(|minutes| minutes.saturating_mul(60))
            .unwrap_or(0);
    }

    parse_int_prefix(&time).unwrap_or(0)
}

/// Lenient integer parse: leading whitespace, optional sign, then the longest
/// run of digits. Trailing garbage is ignored ("12abc" -> 12), negatives map to 0.
fn parse_int_prefix(text: &str) -> Option<u32> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    if negative {
        return Some(0);
    }

    Some(digits.parse::<u64>().map(|v| v.min(u32::MAX as u64) as u32).unwrap_or(u32::MAX))
}

/// Format seconds as MM:SS (minutes are not capped at 59)
pub fn format_clock(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_suffix() {
        assert_eq!(parse_time_to_seconds("60s"), 60);
        assert_eq!(parse_time_to_seconds("1s"), 1);
        assert_eq!(parse_time_to_seconds("  45S "), 45);
    }

    #[test]
    fn test_minutes() {
        assert_eq!(parse_time_to_seconds("2min"), 120);
        assert_eq!(parse_time_to_seconds("3m"), 180);
        assert_eq!(parse_time_to_seconds("1 MIN"), 60);
    }

    #[test]
    fn test_bare_number_is_seconds() {
        assert_eq!(parse_time_to_seconds("90"), 90);
        assert_eq!(parse_time_to_seconds("0"), 0);
    }

    #[test]
    fn test_garbage_is_zero() {
        assert_eq!(parse_time_to_seconds(""), 0);
        assert_eq!(parse_time_to_seconds("   "), 0);
        assert_eq!(parse_time_to_seconds("abc"), 0);
        assert_eq!(parse_time_to_seconds("xs"), 0);
        assert_eq!(parse_time_to_seconds("min"), 0);
    }

    #[test]
    fn test_lenient_prefix() {
        assert_eq!(parse_time_to_seconds("12abc"), 12);
        assert_eq!(parse_time_to_seconds("-5"), 0);
        // "seconds" ends with s, prefix "second" has no digits
        assert_eq!(parse_time_to_seconds("seconds"), 0);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(3600), "60:00");
    }
}
