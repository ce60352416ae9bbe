// Работа со временем

use chrono::{DateTime, TimeZone, Utc};

/// Unix timestamp в миллисекундах
pub fn to_millis(time: DateTime<Utc>) -> u64 {
    time.timestamp_millis().max(0) as u64
}

pub fn from_millis(millis: u64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(i64::try_from(millis).ok()?).single()
}
