//! Parsing of filter date-times and their canonical UTC encoding.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};

/// Naive layouts accepted for local date-times, tried in order.
///
/// The first is what a browser `datetime-local` input produces.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses a filter date-time into an absolute instant.
///
/// Text carrying an explicit offset (RFC 3339) keeps that offset. Naive
/// text is read as wall-clock time in `tz`; a bare date means local
/// midnight. An ambiguous wall-clock time (DST fall-back) resolves to the
/// earlier instant, and a non-existent one (DST gap) yields `None`.
#[must_use]
pub fn parse_local<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Encodes an instant as `YYYY-MM-DDTHH:MM:SS.sssZ`.
#[must_use]
pub fn format_utc(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    fn parse_utc(raw: &str) -> Option<String> {
        parse_local(raw, &Utc).map(|dt| format_utc(&dt))
    }

    #[test]
    fn accepts_browser_and_iso_layouts() {
        assert_eq!(
            parse_utc("2024-01-01T08:15").as_deref(),
            Some("2024-01-01T08:15:00.000Z")
        );
        assert_eq!(
            parse_utc("2024-01-01T08:15:30").as_deref(),
            Some("2024-01-01T08:15:30.000Z")
        );
        assert_eq!(
            parse_utc("2024-01-01T08:15:30.250").as_deref(),
            Some("2024-01-01T08:15:30.250Z")
        );
        assert_eq!(
            parse_utc("2024-01-01 08:15").as_deref(),
            Some("2024-01-01T08:15:00.000Z")
        );
    }

    #[test]
    fn bare_date_is_local_midnight() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let instant = parse_local("2024-03-10", &tz).unwrap();
        assert_eq!(format_utc(&instant), "2024-03-10T05:00:00.000Z");
    }

    #[test]
    fn explicit_offset_wins_over_local_zone() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let instant = parse_local("2025-09-01T23:59:59+02:00", &tz).unwrap();
        assert_eq!(format_utc(&instant), "2025-09-01T21:59:59.000Z");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_utc("2024-13-01T00:00").is_none());
        assert!(parse_utc("01/02/2024").is_none());
        assert!(parse_utc("soon").is_none());
    }
}
