//! Epoch time and school-day helpers

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

pub fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Calendar date at `now_ms` in the school's timezone
pub fn school_date(tz: Tz, now_ms: u64) -> NaiveDate {
    DateTime::from_timestamp_millis(now_ms as i64)
        .unwrap_or_default()
        .with_timezone(&tz)
        .date_naive()
}

/// Half-open `[start, end)` epoch-ms range covering `date` in `tz`
pub fn day_window(date: NaiveDate, tz: Tz) -> (u64, u64) {
    let start = local_midnight_ms(date, tz);
    let end = date
        .succ_opt()
        .map(|next| local_midnight_ms(next, tz))
        .unwrap_or(u64::MAX);
    (start, end)
}

// Midnight can fall inside a DST gap; the first valid instant of the day is used then.
fn local_midnight_ms(date: NaiveDate, tz: Tz) -> u64 {
    let mut time = NaiveTime::MIN;
    for _ in 0..4 {
        if let Some(dt) = tz.from_local_datetime(&date.and_time(time)).earliest() {
            return dt.timestamp_millis().max(0) as u64;
        }
        time += chrono::Duration::minutes(30);
    }
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp_millis()
        .max(0) as u64
}
