//! Day-boundary arithmetic for the midnight tick

use chrono::{DateTime, Duration, LocalResult, NaiveTime, TimeZone};

/// One second past the next local midnight.
///
/// Always computed from the current wall clock, never by adding a fixed day
/// to the previous alarm, so missed or late firings do not drift.
pub fn next_midnight_after<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    let date = now.date_naive().succ_opt().unwrap_or(now.date_naive());

    // A DST jump can swallow midnight; the new day then starts after the gap
    for hour in 0..24 {
        let Some(fire_at) = NaiveTime::from_hms_opt(hour, 0, 1) else {
            continue;
        };
        match tz.from_local_datetime(&date.and_time(fire_at)) {
            LocalResult::Single(t) => return t,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => continue,
        }
    }

    now.clone() + Duration::days(1)
}

/// Time to sleep until [`next_midnight_after`]
pub fn until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> std::time::Duration {
    let delta: Duration = next_midnight_after(now) - now.clone();
    delta.to_std().unwrap_or(std::time::Duration::from_secs(1))
}
