//! Timestamp parsing and human-relative formatting.
//!
//! Feed timestamps arrive in a handful of loosely followed formats. Parsing
//! goes through [`STRATEGIES`] in order and the first success wins, so the
//! formatter, the recency sort and the feed parser all agree on what a
//! given string means.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

/// Output length (in chars) before the raw fallback gets truncated
const MAX_RAW_LEN: usize = 20;

static ISO_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})(?:\.\d+)?(Z|[+-]\d{2}:?\d{2})?")
        .expect("valid ISO prefix pattern")
});

static BARE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date pattern"));

/// A parsed feed timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Carries its own UTC offset
    Zoned(DateTime<FixedOffset>),
    /// No zone information; interpreted in local time
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Resolve to an absolute instant. Naive values are read as local time.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Zoned(dt) => Some(dt.with_timezone(&Utc)),
            Timestamp::Naive(naive) => Local
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// Whole seconds elapsed between this timestamp and `now`
    /// (negative for future-dated values).
    pub fn seconds_before(&self, now: DateTime<Local>) -> i64 {
        match self {
            Timestamp::Zoned(dt) => (now.fixed_offset() - *dt).num_seconds(),
            Timestamp::Naive(naive) => (now.naive_local() - *naive).num_seconds(),
        }
    }
}

pub type ParseStrategy = fn(&str) -> Option<Timestamp>;

/// Parse strategies in priority order
pub const STRATEGIES: &[ParseStrategy] = &[parse_rfc2822, parse_rfc2822_lenient, parse_iso8601];

const WEEKDAY_NAMES: [&str; 7] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

const MONTH_NAMES: [(&str, &str); 12] = [
    ("january", "Jan"),
    ("february", "Feb"),
    ("march", "Mar"),
    ("april", "Apr"),
    ("may", "May"),
    ("june", "Jun"),
    ("july", "Jul"),
    ("august", "Aug"),
    ("september", "Sep"),
    ("october", "Oct"),
    ("november", "Nov"),
    ("december", "Dec"),
];

/// RFC 2822 style, e.g. `Tue, 10 Jun 2003 04:00:00 GMT`
pub fn parse_rfc2822(input: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc2822(input.trim())
        .ok()
        .map(Timestamp::Zoned)
}

/// RFC 2822 as feeds actually write it: full or missing weekday names,
/// full month names, single-digit hours, `UTC`/`Z` zones and `+08:00` offsets.
/// A missing zone is read as GMT.
pub fn parse_rfc2822_lenient(input: &str) -> Option<Timestamp> {
    let normalized = normalize_rfc2822(input)?;
    DateTime::parse_from_rfc2822(&normalized)
        .ok()
        .map(Timestamp::Zoned)
}

/// Rewrite a loose RFC 2822 date into `D Mon YYYY HH:MM:SS +ZZZZ`
fn normalize_rfc2822(input: &str) -> Option<String> {
    let cleaned = input.replace(',', " ");
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();

    // The weekday is redundant and chrono rejects a mismatched one
    if tokens.first().is_some_and(|t| is_weekday(t)) {
        tokens.remove(0);
    }
    if !(4..=5).contains(&tokens.len()) {
        return None;
    }

    let (day, month) = match (month_abbrev(tokens[0]), month_abbrev(tokens[1])) {
        (None, Some(month)) => (tokens[0], month),
        (Some(month), None) => (tokens[1], month),
        _ => return None,
    };
    let year = tokens[2];
    if !is_number(day, 1, 2) || !is_number(year, 2, 4) {
        return None;
    }

    let time = pad_time(tokens[3])?;
    let zone = match tokens.get(4) {
        Some(zone) => normalize_zone(zone)?,
        None => "+0000".to_string(),
    };

    Some(format!("{} {} {} {} {}", day, month, year, time, zone))
}

fn is_number(token: &str, min_len: usize, max_len: usize) -> bool {
    (min_len..=max_len).contains(&token.len()) && token.chars().all(|c| c.is_ascii_digit())
}

fn is_weekday(token: &str) -> bool {
    let token = token.trim_end_matches('.').to_ascii_lowercase();
    token.len() >= 3 && WEEKDAY_NAMES.iter().any(|name| name.starts_with(&token))
}

fn month_abbrev(token: &str) -> Option<&'static str> {
    let token = token.trim_end_matches('.').to_ascii_lowercase();
    if token.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .find(|(name, _)| name.starts_with(&token))
        .map(|(_, abbrev)| *abbrev)
}

/// `9:30` or `9:30:5` become `09:30:00` and `09:30:05`
fn pad_time(token: &str) -> Option<String> {
    let parts: Vec<&str> = token.split(':').collect();
    if !(2..=3).contains(&parts.len()) || !parts.iter().all(|p| is_number(p, 1, 2)) {
        return None;
    }
    let second = parts.get(2).copied().unwrap_or("0");
    Some(format!("{:0>2}:{:0>2}:{:0>2}", parts[0], parts[1], second))
}

fn normalize_zone(token: &str) -> Option<String> {
    let upper = token.to_ascii_uppercase();
    match upper.as_str() {
        "UTC" | "UT" | "GMT" | "Z" => return Some("+0000".to_string()),
        _ => {}
    }

    if let Some(sign) = upper.chars().next().filter(|c| *c == '+' || *c == '-') {
        let digits: String = upper[1..].chars().filter(|c| *c != ':').collect();
        return match digits.len() {
            4 if is_number(&digits, 4, 4) => Some(format!("{}{}", sign, digits)),
            2 if is_number(&digits, 2, 2) => Some(format!("{}{}00", sign, digits)),
            _ => None,
        };
    }

    // North American zone names such as EST or PDT are understood by chrono
    upper.chars().all(|c| c.is_ascii_alphabetic()).then_some(upper)
}

/// `YYYY-MM-DDTHH:MM:SS` prefix, with an optional fraction and zone suffix
pub fn parse_iso8601(input: &str) -> Option<Timestamp> {
    let caps = ISO_PREFIX.captures(input.trim())?;
    let naive = NaiveDateTime::parse_from_str(caps.get(1)?.as_str(), "%Y-%m-%dT%H:%M:%S").ok()?;

    match caps.get(2).map(|m| m.as_str()) {
        Some("Z") => Some(Timestamp::Zoned(naive.and_utc().fixed_offset())),
        Some(zone) => {
            let offset = parse_offset(zone)?;
            offset
                .from_local_datetime(&naive)
                .single()
                .map(Timestamp::Zoned)
        }
        None => Some(Timestamp::Naive(naive)),
    }
}

/// Parse `+HH:MM`, `+HHMM`, `-HH:MM` or `-HHMM`
fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let sign = if zone.starts_with('-') { -1 } else { 1 };
    let digits: String = zone[1..].chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 4 {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Try every strategy in order
pub fn parse_timestamp(input: &str) -> Option<Timestamp> {
    if input.trim().is_empty() {
        return None;
    }
    STRATEGIES.iter().find_map(|strategy| strategy(input))
}

/// Render a timestamp string relative to the current local time
pub fn format_relative(published: &str) -> String {
    format_relative_at(published, Local::now())
}

/// Render a timestamp string relative to `now`.
///
/// Falls back to a bare `YYYY-MM-DD` found in the input, then to the input
/// itself truncated to 20 chars.
pub fn format_relative_at(published: &str, now: DateTime<Local>) -> String {
    if published.is_empty() {
        return String::new();
    }

    match parse_timestamp(published) {
        Some(ts) => relative_label(ts.seconds_before(now)),
        None => fallback_label(published),
    }
}

/// Label for an elapsed duration. Future-dated values read as "just now".
pub fn relative_label(total_seconds: i64) -> String {
    if total_seconds <= 0 {
        return "刚刚".to_string();
    }

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;

    if days >= 7 {
        format!("{}周前", days / 7)
    } else if days > 0 {
        format!("{}天前", days)
    } else if hours > 0 {
        format!("{}小时前", hours)
    } else if minutes > 0 {
        format!("{}分钟前", minutes)
    } else {
        "刚刚".to_string()
    }
}

fn fallback_label(raw: &str) -> String {
    if let Some(date) = BARE_DATE.find(raw) {
        return date.as_str().to_string();
    }

    if raw.chars().count() > MAX_RAW_LEN {
        let truncated: String = raw.chars().take(MAX_RAW_LEN).collect();
        format!("{}...", truncated)
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn rfc2822_ago(delta: Duration) -> String {
        (now() - delta).to_rfc2822()
    }

    #[test]
    fn test_minutes_ago() {
        let ts = rfc2822_ago(Duration::seconds(90));
        assert_eq!(format_relative_at(&ts, now()), "1分钟前");
    }

    #[test]
    fn test_hours_and_days_ago() {
        assert_eq!(format_relative_at(&rfc2822_ago(Duration::hours(5)), now()), "5小时前");
        assert_eq!(format_relative_at(&rfc2822_ago(Duration::days(2)), now()), "2天前");
        assert_eq!(format_relative_at(&rfc2822_ago(Duration::days(10)), now()), "1周前");
        assert_eq!(format_relative_at(&rfc2822_ago(Duration::days(21)), now()), "3周前");
    }

    #[test]
    fn test_just_now() {
        assert_eq!(format_relative_at(&rfc2822_ago(Duration::seconds(30)), now()), "刚刚");
    }

    #[test]
    fn test_future_dates_clamp_to_just_now() {
        let ts = (now() + Duration::days(3)).to_rfc2822();
        assert_eq!(format_relative_at(&ts, now()), "刚刚");
        assert_eq!(relative_label(-1), "刚刚");
    }

    #[test]
    fn test_iso_with_zone() {
        let ts = (now() - Duration::hours(3)).with_timezone(&Utc).format("%Y-%m-%dT%H:%M:%SZ").to_string();
        assert_eq!(format_relative_at(&ts, now()), "3小时前");

        let ts = (now() - Duration::days(1))
            .with_timezone(&FixedOffset::east_opt(8 * 3600).unwrap())
            .format("%Y-%m-%dT%H:%M:%S%.3f+08:00")
            .to_string();
        assert_eq!(format_relative_at(&ts, now()), "1天前");
    }

    #[test]
    fn test_iso_naive_uses_local_time() {
        let ts = (now() - Duration::minutes(45)).naive_local().format("%Y-%m-%dT%H:%M:%S").to_string();
        assert_eq!(format_relative_at(&ts, now()), "45分钟前");
    }

    #[test]
    fn test_rfc2822_wins_over_iso() {
        let parsed = parse_timestamp("Fri, 15 Mar 2024 10:00:00 +0000").unwrap();
        assert!(matches!(parsed, Timestamp::Zoned(_)));
        assert_eq!(parse_rfc2822("2024-03-15T10:00:00Z"), None);
    }

    #[test]
    fn test_bare_date_fallback() {
        assert_eq!(format_relative_at("posted 2024-02-01 sometime", now()), "2024-02-01");
    }

    #[test]
    fn test_truncated_fallback() {
        let raw = "definitely not a timestamp at all";
        assert_eq!(format_relative_at(raw, now()), "definitely not a tim...");
        assert_eq!(format_relative_at("yesterday", now()), "yesterday");
        assert_eq!(format_relative_at("", now()), "");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let raw = "昨天下午三点左右发布的文章时间字段无法解析啊啊啊";
        let label = format_relative_at(raw, now());
        assert_eq!(label.chars().count(), MAX_RAW_LEN + 3);
        assert!(label.ends_with("..."));
    }

    #[test]
    fn test_lenient_rfc2822_variants() {
        let expected = DateTime::parse_from_rfc3339("2024-03-14T09:30:00Z").unwrap();
        let at_utc = |raw: &str| parse_timestamp(raw).and_then(|ts| ts.to_utc());

        for raw in [
            "Thu, 14 Mar 2024 09:30:00 UTC",
            "Thu, 14 Mar 2024 09:30:00 Z",
            "Thursday, 14 Mar 2024 09:30:00 GMT",
            "Thu, 14 March 2024 09:30:00 GMT",
            "Thu, 14 Mar 2024 9:30:00 +0000",
            "14 Mar 2024 09:30 GMT",
            "Thu, 14 Mar 2024 09:30:00",
            "Wed, 14 Mar 2024 09:30:00 GMT",
        ] {
            assert_eq!(at_utc(raw), Some(expected.with_timezone(&Utc)), "{}", raw);
        }

        assert_eq!(
            at_utc("Thu, 14 Mar 2024 17:30:00 +08:00"),
            Some(expected.with_timezone(&Utc))
        );
        assert_eq!(
            at_utc("Thu, 14 Mar 2024 9:30:00 +0800"),
            Some(expected.with_timezone(&Utc) - chrono::Duration::hours(8))
        );
    }

    #[test]
    fn test_lenient_rfc2822_rejects_garbage() {
        assert_eq!(parse_rfc2822_lenient("March 13th 2024"), None);
        assert_eq!(parse_rfc2822_lenient("14 Foo 2024 09:30:00 GMT"), None);
        assert_eq!(parse_rfc2822_lenient("14 Mar 2024 25h GMT"), None);
        assert_eq!(parse_rfc2822_lenient("2024-03-14T09:30:00Z"), None);
    }

    #[test]
    fn test_lenient_dates_get_relative_labels() {
        let ts = (now() - Duration::hours(5))
            .with_timezone(&Utc)
            .format("%A, %d %B %Y %H:%M:%S UTC")
            .to_string();
        assert_eq!(format_relative_at(&ts, now()), "5小时前");
    }

    #[test]
    fn test_offset_parsing() {
        assert_eq!(parse_offset("+0530"), FixedOffset::east_opt(5 * 3600 + 30 * 60));
        assert_eq!(parse_offset("-08:00"), FixedOffset::west_opt(8 * 3600));
        assert_eq!(parse_offset("+8"), None);
    }
}
