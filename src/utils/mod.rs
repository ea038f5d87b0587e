//! Utility functions.
//!
//! Parsing, sanitizing and formatting helpers used across the bot.

use crate::database::RosterUser;

/// Split a command argument string into whitespace-separated parts.
pub fn split_args(args: &str) -> Vec<&str> {
    args.split_whitespace().collect()
}

/// Extract a numeric user id from a command argument.
///
/// Returns `None` for `@username` arguments and anything non-numeric;
/// username arguments are resolved through the roster instead.
pub fn extract_user_id(arg: &str) -> Option<i64> {
    let arg = arg.trim();
    if arg.is_empty() || arg.starts_with('@') {
        return None;
    }
    arg.parse::<i64>().ok().filter(|id| *id > 0)
}

/// Normalize a username argument: strip the leading `@`, lowercase.
pub fn normalize_username(arg: &str) -> String {
    arg.trim().trim_start_matches('@').to_lowercase()
}

/// Validate a car description: at least 3 meaningful characters.
pub fn validate_car_description(text: &str) -> bool {
    let meaningful: String = text
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '.' | ','))
        .collect();
    meaningful.trim().chars().count() >= 3
}

/// Strip characters that would break HTML replies or query text.
pub fn sanitize_text(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\''))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Truncate to at most `max` characters, appending an ellipsis when cut.
///
/// Operates on characters, not bytes, so multi-byte text stays valid.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str("...");
    cut
}

/// Parse a limit argument: `-` or `none` clears the limit, a number sets it.
pub fn parse_limit_arg(arg: &str) -> Result<Option<i64>, String> {
    let arg = arg.trim();
    if arg == "-" || arg.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match arg.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(Some(n)),
        _ => Err(format!("'{}' is not a valid limit (use a number or '-')", arg)),
    }
}

/// Format one roster entry as a listing line.
pub fn format_roster_line(index: usize, user: &RosterUser) -> String {
    let access = if user.allowed { "✅" } else { "❌" };
    let username = user
        .username
        .as_deref()
        .map(|u| format!("@{}", u))
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "{}. ID: {} | {} | {} | {}\n",
        index,
        user.user_id,
        html_escape(&username),
        user.role.as_str(),
        access
    );
    if let Some(car) = &user.car {
        line.push_str(&format!("   🚗 {}\n", html_escape(car)));
    }
    line
}

/// Group listing lines into messages no longer than `max_chars` each.
pub fn chunk_lines(lines: &[String], max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in lines {
        if !current.is_empty() && current.chars().count() + line.chars().count() > max_chars {
            chunks.push(current.trim_end().to_string());
            current = String::new();
        }
        current.push_str(line);
    }
    if !current.trim().is_empty() {
        chunks.push(current.trim_end().to_string());
    }
    chunks
}

/// Format a unix timestamp for operator-facing output.
pub fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Escape a CSV field: quote when it contains separators, double inner quotes.
pub fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_user_id() {
        assert_eq!(extract_user_id("363046871"), Some(363046871));
        assert_eq!(extract_user_id(" 42 "), Some(42));
        assert_eq!(extract_user_id("@someone"), None);
        assert_eq!(extract_user_id("-5"), None);
        assert_eq!(extract_user_id("abc"), None);
        assert_eq!(extract_user_id(""), None);
    }

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("@SomeOne"), "someone");
        assert_eq!(normalize_username("plain"), "plain");
    }

    #[test]
    fn test_validate_car_description() {
        assert!(validate_car_description("Haval Jolion 2022"));
        assert!(!validate_car_description("ab"));
        assert!(!validate_car_description("!!!"));
        assert!(!validate_car_description("   "));
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("plain question"), "plain question");
        assert_eq!(sanitize_text("  check <engine> light  "), "check engine light");
        assert_eq!(sanitize_text("<>\"'"), "");
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        // Multi-byte characters must not be split.
        assert_eq!(truncate_chars("привет мир", 6), "привет...");
    }

    #[test]
    fn test_parse_limit_arg() {
        assert_eq!(parse_limit_arg("10"), Ok(Some(10)));
        assert_eq!(parse_limit_arg("-"), Ok(None));
        assert_eq!(parse_limit_arg("none"), Ok(None));
        assert!(parse_limit_arg("ten").is_err());
        assert!(parse_limit_arg("-3").is_err());
    }

    #[test]
    fn test_chunk_lines() {
        let lines: Vec<String> = (0..10).map(|i| format!("line {}\n", i)).collect();
        let chunks = chunk_lines(&lines, 30);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 30);
        }
        let joined = chunks.join("\n");
        assert!(joined.contains("line 0") && joined.contains("line 9"));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00 UTC");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13 UTC");
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
