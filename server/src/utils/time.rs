//! Time utility functions

use chrono::{DateTime, Utc};

/// Current unix time in seconds
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// Convert unix seconds to DateTime<Utc>
pub fn secs_to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(|| {
        tracing::warn!(secs, "Invalid timestamp, using epoch");
        DateTime::UNIX_EPOCH
    })
}

/// Convert unix seconds to ISO 8601 string
pub fn secs_to_iso(secs: i64) -> String {
    secs_to_datetime(secs).to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_secs_to_datetime_epoch() {
        let dt = secs_to_datetime(0);
        assert_eq!(dt.year(), 1970);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 1);
    }

    #[test]
    fn test_secs_to_datetime_known_value() {
        // 2024-01-01 00:00:00 UTC
        let dt = secs_to_datetime(1704067200);
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 1);
    }

    #[test]
    fn test_secs_to_iso_uses_utc_suffix() {
        let iso = secs_to_iso(0);
        assert_eq!(iso, "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_now_secs_is_after_2024() {
        assert!(now_secs() > 1704067200);
    }
}
