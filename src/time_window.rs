// src/time_window.rs
//! Day and week boundaries in the user's local time.
//!
//! Every function is generic over the chrono time zone so the dashboard can
//! run against `Local` while tests pin a fixed offset.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone};

/// First instant of `date` in `tz`.
///
/// Midnight can be skipped (DST gap) or repeated (DST overlap); the first
/// existing instant of the day is used in both cases.
pub fn start_of_date<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(start) => start,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => (1..=24 * 60)
            .find_map(|minutes| {
                tz.from_local_datetime(&(midnight + Duration::minutes(minutes)))
                    .earliest()
            })
            .unwrap_or_else(|| tz.from_utc_datetime(&midnight)),
    }
}

/// Local midnight of the day containing `now`.
pub fn day_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    start_of_date(&now.timezone(), now.date_naive())
}

/// Local midnight of the Monday on or before `now`.
pub fn week_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    start_of_date(&now.timezone(), monday_of(now.date_naive()))
}

/// Last millisecond of the day that begins at `day_start`.
pub fn day_end<Tz: TimeZone>(day_start: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = day_start.timezone();
    let next_day = day_start.date_naive() + Duration::days(1);
    start_of_date(&tz, next_day) - Duration::milliseconds(1)
}

/// Monday..Sunday dates of the week that begins at `week_start`.
pub fn week_days<Tz: TimeZone>(week_start: &DateTime<Tz>) -> [NaiveDate; 7] {
    let monday = monday_of(week_start.date_naive());
    std::array::from_fn(|offset| monday + Duration::days(offset as i64))
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    let days_from_monday = i64::from(date.weekday().num_days_from_monday());
    date - Duration::days(days_from_monday)
}
