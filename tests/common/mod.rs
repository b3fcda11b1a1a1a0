#![allow(dead_code)] // Not every test binary uses every helper

use anyhow::Result;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use fit_home_lib::presenter::{
    GoalList, Header, HomeView, ProgressRings, TodayActivity, WeekCheckmarks, WeeklyChart,
    WeeklyTarget,
};
use fit_home_lib::{NewSession, SessionStatus, Store, UserProfile, WorkoutSession};

pub const USER_ID: &str = "user-1";

/// UTC+2, so local and UTC calendar days differ around midnight.
pub fn tz() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap()
}

pub fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
    tz().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// Store with one signed-in profile.
pub fn store_with_user(user: UserProfile) -> Result<Store> {
    let store = Store::open_in_memory()?;
    store.save_user(&user)?;
    store.sign_in(&user.user_id)?;
    Ok(store)
}

pub fn profile(step_goal: Option<i64>, calorie_goal: Option<i64>) -> UserProfile {
    UserProfile {
        daily_step_goal: step_goal,
        daily_calorie_goal: calorie_goal,
        age: 30,
        weight_kg: 70.0,
        ..UserProfile::new(USER_ID, "Alex")
    }
}

pub fn add_session(
    store: &Store,
    start: DateTime<FixedOffset>,
    status: SessionStatus,
    steps: i64,
    calories: i64,
) -> Result<i64> {
    Ok(store.add_session(&NewSession {
        user_id: USER_ID,
        workout_name: "Walk",
        start_time: start.with_timezone(&Utc),
        duration_seconds: 600,
        status,
        steps,
        calories_burned: calories,
        distance_km: 1.0,
    })?)
}

/// In-memory session for the pure aggregation functions.
pub fn session(
    start: DateTime<FixedOffset>,
    status: SessionStatus,
    steps: i64,
    duration_seconds: i64,
) -> WorkoutSession {
    WorkoutSession {
        id: 0,
        user_id: USER_ID.to_string(),
        workout_name: "Walk".to_string(),
        start_time: start.with_timezone(&Utc),
        duration_seconds,
        status,
        steps,
        calories_burned: steps / 20,
        distance_km: steps as f64 * 0.0008,
    }
}

/// Keeps the last value pushed to each widget.
#[derive(Default)]
pub struct RecordingView {
    pub renders: usize,
    pub header: Option<Header>,
    pub today: Option<TodayActivity>,
    pub rings: Option<ProgressRings>,
    pub weekly_target: Option<WeeklyTarget>,
    pub checkmarks: Option<WeekCheckmarks>,
    pub goals: Option<GoalList>,
    pub chart: Option<WeeklyChart>,
}

impl HomeView for RecordingView {
    fn show_header(&mut self, header: &Header) {
        self.renders += 1;
        self.header = Some(header.clone());
    }
    fn show_today(&mut self, today: &TodayActivity) {
        self.today = Some(today.clone());
    }
    fn show_progress_rings(&mut self, rings: &ProgressRings) {
        self.rings = Some(rings.clone());
    }
    fn show_weekly_target(&mut self, target: &WeeklyTarget) {
        self.weekly_target = Some(target.clone());
    }
    fn show_checkmarks(&mut self, checkmarks: &WeekCheckmarks) {
        self.checkmarks = Some(checkmarks.clone());
    }
    fn show_goals(&mut self, goals: &GoalList) {
        self.goals = Some(goals.clone());
    }
    fn show_chart(&mut self, chart: &WeeklyChart) {
        self.chart = Some(chart.clone());
    }
}
