//! Pure presentation helpers: date localization and hash truncation

use chrono::{DateTime, FixedOffset};

/// Display timezone offset (UTC+5:30)
const DISPLAY_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

/// Render an ISO-8601 UTC timestamp as `Mon DD HH:MM AM/PM` in the fixed
/// display timezone. Unparseable input is a caller contract violation; the
/// raw string is echoed back rather than panicking.
pub fn format_date(date: &str) -> String {
    let Ok(parsed) = DateTime::parse_from_rfc3339(date) else {
        return date.to_string();
    };
    let Some(offset) = FixedOffset::east_opt(DISPLAY_OFFSET_SECONDS) else {
        return date.to_string();
    };
    parsed
        .with_timezone(&offset)
        .format("%b %d %I:%M %p")
        .to_string()
}

/// First 7 characters of a commit hash for display. Comparisons always use
/// the full hash; this is display-only.
pub fn short_sha(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}
