use chrono::{DateTime, SecondsFormat, Utc};

/// Current server wall-clock time as an RFC 3339 UTC string with
/// millisecond precision, e.g. `2026-01-01T00:00:00.000Z`.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Format an instant the same way [`now_timestamp`] does.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn formats_with_millis_and_z_suffix() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(at), "2026-01-01T00:00:00.000Z");
    }

    #[test]
    fn now_is_parseable_and_recent() {
        let before = Utc::now();
        let stamp = now_timestamp();
        let parsed = DateTime::parse_from_rfc3339(&stamp).unwrap();
        assert!(parsed.with_timezone(&Utc) >= before - chrono::Duration::milliseconds(1));
    }
}
