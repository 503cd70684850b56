use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

/// Coerce a raw timestamp token into a local instant.
///
/// Tries, in order: Unix epoch seconds for bare digit runs, a fixed ladder
/// of explicit formats, then a best-effort inference pass. Returns `None`
/// when nothing fits; never fails.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    // Bare digit runs are Unix epoch seconds (the value-sample format
    // carries those). Out-of-range values fall through to the ladder.
    if s.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(secs) = s.parse::<i64>() {
            if let Some(ts) = Local.timestamp_opt(secs, 0).single() {
                return Some(ts);
            }
        }
    }

    // ISO-ish, optional fractional seconds
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return naive.and_local_timezone(Local).single();
    }
    // Minutes precision
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return naive.and_local_timezone(Local).single();
    }
    // Apache/Nginx access-log style, timezone aware
    if let Ok(aware) = DateTime::parse_from_str(s, "%d/%b/%Y:%H:%M:%S %z") {
        return Some(aware.with_timezone(&Local));
    }
    // Syslog carries no year; strptime semantics resolve those against 1900
    if let Ok(naive) = NaiveDateTime::parse_from_str(&format!("1900 {s}"), "%Y %b %d %H:%M:%S") {
        return naive.and_local_timezone(Local).single();
    }
    // Date only, midnight
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return naive.and_local_timezone(Local).single();
        }
    }
    for fmt in ["%m/%d/%Y %H:%M:%S", "%m-%d-%Y %H:%M:%S", "%Y%m%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return naive.and_local_timezone(Local).single();
        }
    }
    // Java logging writes a comma before the milliseconds
    if s.contains(',') {
        let dotted = s.replace(',', ".");
        if let Ok(naive) = NaiveDateTime::parse_from_str(&dotted, "%Y-%m-%d %H:%M:%S%.f") {
            return naive.and_local_timezone(Local).single();
        }
    }

    infer(s)
}

/// Last-resort inference for tokens outside the explicit ladder.
fn infer(s: &str) -> Option<DateTime<Local>> {
    if let Ok(aware) = DateTime::parse_from_rfc3339(s) {
        return Some(aware.with_timezone(&Local));
    }
    if let Ok(aware) = DateTime::parse_from_rfc2822(s) {
        return Some(aware.with_timezone(&Local));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_local_timezone(Local).single();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> DateTime<Local> {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_milli_opt(h, mi, s, ms)
            .unwrap()
            .and_local_timezone(Local)
            .single()
            .unwrap()
    }

    #[test]
    fn test_unix_epoch_seconds() {
        let expected = Local.timestamp_opt(1_700_000_000, 0).single().unwrap();
        assert_eq!(parse_timestamp("1700000000"), Some(expected));
    }

    #[test]
    fn test_iso_with_fraction() {
        assert_eq!(
            parse_timestamp("2023-01-01 12:00:00.123"),
            Some(local(2023, 1, 1, 12, 0, 0, 123))
        );
    }

    #[test]
    fn test_iso_without_fraction() {
        assert_eq!(
            parse_timestamp("2023-01-01 12:00:00"),
            Some(local(2023, 1, 1, 12, 0, 0, 0))
        );
    }

    #[test]
    fn test_minutes_precision() {
        assert_eq!(
            parse_timestamp("2023-01-01 12:34"),
            Some(local(2023, 1, 1, 12, 34, 0, 0))
        );
    }

    #[test]
    fn test_apache_with_offset() {
        let expected = DateTime::parse_from_rfc3339("2023-01-01T12:00:00+00:00")
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(parse_timestamp("01/Jan/2023:12:00:00 +0000"), Some(expected));
    }

    #[test]
    fn test_syslog_resolves_to_1900() {
        let ts = parse_timestamp("Jan 15 08:30:00").unwrap();
        assert_eq!(ts.year(), 1900);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 15);
        assert_eq!(ts.hour(), 8);
    }

    #[test]
    fn test_date_only_is_midnight() {
        assert_eq!(
            parse_timestamp("2023-05-05"),
            Some(local(2023, 5, 5, 0, 0, 0, 0))
        );
    }

    #[test]
    fn test_slash_and_compact_variants() {
        assert_eq!(
            parse_timestamp("01/02/2023 03:04:05"),
            Some(local(2023, 1, 2, 3, 4, 5, 0))
        );
        assert_eq!(
            parse_timestamp("01-02-2023 03:04:05"),
            Some(local(2023, 1, 2, 3, 4, 5, 0))
        );
        assert_eq!(
            parse_timestamp("20230101 12:00:00"),
            Some(local(2023, 1, 1, 12, 0, 0, 0))
        );
    }

    #[test]
    fn test_java_comma_milliseconds() {
        assert_eq!(
            parse_timestamp("2023-01-01 12:00:00,123"),
            Some(local(2023, 1, 1, 12, 0, 0, 123))
        );
    }

    #[test]
    fn test_rfc3339_inferred() {
        assert!(parse_timestamp("2023-01-01T12:00:00Z").is_some());
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_timestamp("not-a-date"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
    }
}
