// src/aggregate.rs
use chrono::{Datelike, TimeZone, Weekday};

use crate::db::WorkoutSession;

/// Chart order of the weekday buckets.
pub const CHART_ORDER: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Sums over the completed sessions of a time window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActivityTotals {
    pub steps: i64,
    pub calories: i64,
    pub distance_km: f64,
    pub active_minutes: i64,
}

/// Step totals per weekday, Sunday..Saturday. Every weekday is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekdaySteps([i64; 7]);

impl WeekdaySteps {
    pub fn get(&self, day: Weekday) -> i64 {
        self.0[day.num_days_from_sunday() as usize]
    }

    /// `(weekday, steps)` pairs in chart order.
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, i64)> + '_ {
        CHART_ORDER.iter().map(move |&day| (day, self.get(day)))
    }

    pub fn total(&self) -> i64 {
        self.0.iter().sum()
    }

    fn add(&mut self, day: Weekday, steps: i64) {
        self.0[day.num_days_from_sunday() as usize] += steps;
    }
}

pub fn completed(sessions: &[WorkoutSession]) -> impl Iterator<Item = &WorkoutSession> {
    sessions.iter().filter(|s| s.is_completed())
}

/// Totals over the completed sessions only.
///
/// Active minutes are floored per session before summing: two 90 second
/// sessions count as 2 minutes, not 3.
pub fn aggregate(sessions: &[WorkoutSession]) -> ActivityTotals {
    completed(sessions).fold(ActivityTotals::default(), |mut totals, session| {
        totals.steps += session.steps;
        totals.calories += session.calories_burned;
        totals.distance_km += session.distance_km;
        totals.active_minutes += session.duration_seconds / 60;
        totals
    })
}

/// Buckets completed-session steps by the weekday of their start time in `tz`.
pub fn steps_by_weekday<Tz: TimeZone>(sessions: &[WorkoutSession], tz: &Tz) -> WeekdaySteps {
    let mut buckets = WeekdaySteps::default();
    for session in completed(sessions) {
        let weekday = session.start_time.with_timezone(tz).weekday();
        buckets.add(weekday, session.steps);
    }
    buckets
}
