//! Start/end time parsing: RFC3339 or relative offsets such as `-15m`

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::error::TimeParseError;

static RELATIVE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-(\d+)([smhd])$").expect("valid regex"));

/// Parse a time argument relative to `now`.
///
/// Accepts RFC3339 timestamps, relative offsets (`-30s`, `-15m`, `-1h`, `-2d`)
/// and the literal `now`. An empty string means "not set".
pub fn parse_time(
    input: &str,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, TimeParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    if input.eq_ignore_ascii_case("now") {
        return Ok(Some(now));
    }
    if input.starts_with('-') {
        return parse_relative(input, now).map(Some);
    }

    DateTime::parse_from_rfc3339(input)
        .map(|t| Some(t.with_timezone(&Utc)))
        .map_err(|_| TimeParseError::InvalidFormat(input.to_string()))
}

fn parse_relative(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeParseError> {
    let invalid = || TimeParseError::InvalidRelative(input.to_string());

    let caps = RELATIVE_TIME.captures(input).ok_or_else(invalid)?;
    let value: i64 = caps[1].parse().map_err(|_| invalid())?;

    let offset = match &caps[2] {
        "s" => Duration::try_seconds(value),
        "m" => Duration::try_minutes(value),
        "h" => Duration::try_hours(value),
        "d" => Duration::try_days(value),
        _ => None,
    }
    .ok_or_else(invalid)?;

    now.checked_sub_signed(offset).ok_or_else(invalid)
}
