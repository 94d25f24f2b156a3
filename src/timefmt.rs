use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Second-precision UTC format the incremental endpoint expects in its path.
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Formats `ts` as `YYYY-MM-DDTHH:mm:ssZ`. Sub-second precision is dropped.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(WIRE_FORMAT).to_string()
}

/// Parses the timestamp column of a reading line.
///
/// RFC 3339 with any offset is accepted and normalized to UTC. Date-times
/// without an offset, and bare dates, are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
