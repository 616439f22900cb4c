//! Time utility functions

use chrono::{DateTime, Utc};

/// Convert unix seconds to DateTime<Utc>
pub fn secs_to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(|| {
        tracing::warn!(secs, "Invalid timestamp, using epoch");
        DateTime::UNIX_EPOCH
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_secs_to_datetime_known_value() {
        // 2024-01-01 00:00:00 UTC
        let dt = secs_to_datetime(1_704_067_200);
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 1, 1));
    }

    #[test]
    fn test_out_of_range_falls_back_to_epoch() {
        assert_eq!(secs_to_datetime(i64::MAX), DateTime::UNIX_EPOCH);
    }
}
