//! ISO-8601 date strings at the bridge boundary.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use daybook_core::error::{DaybookError, DaybookResult};

/// Parse a date-time sent by the bridge.
///
/// RFC 3339 with or without fractional seconds is accepted; a bare local
/// timestamp without offset is read as UTC. Anything else is rejected with
/// the name of the offending field.
pub fn parse_bridge_datetime(field: &str, value: &str) -> DaybookResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|_| DaybookError::MalformedDate {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// Optional fields: absent or empty strings are `None`.
pub fn parse_optional_datetime(
    field: &str,
    value: Option<&str>,
) -> DaybookResult<Option<DateTime<Utc>>> {
    match value {
        None | Some("") => Ok(None),
        Some(v) => parse_bridge_datetime(field, v).map(Some),
    }
}

/// Format an instant the way the bridge expects it, with milliseconds and
/// a `Z` suffix.
pub fn format_bridge_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
