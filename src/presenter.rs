// src/presenter.rs
//! Builds the home dashboard from the store and pushes it into a [`HomeView`].
//!
//! A refresh pass reads the signed-in user and runs the independent loaders
//! (header, today's activity, progress rings, weekly target, weekly
//! checkmarks, today's goals, weekly chart). The weekly target and the chart
//! each read their own session range. If any loader fails the whole pass is
//! dropped and the view keeps what it showed before.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use tracing::{debug, error, warn};

use crate::aggregate::{self, ActivityTotals};
use crate::db::{DbError, Goal, UserProfile};
use crate::format;
use crate::goals::{self, GoalEntry, WeeklyProgress};
use crate::identity::{resolve_profile_image, IdentityProvider, ProfileImage};
use crate::store::Store;
use crate::time_window;

/// Widgets of the home screen. Each method replaces what the widget showed.
pub trait HomeView {
    fn show_header(&mut self, header: &Header);
    fn show_today(&mut self, today: &TodayActivity);
    fn show_progress_rings(&mut self, rings: &ProgressRings);
    fn show_weekly_target(&mut self, target: &WeeklyTarget);
    fn show_checkmarks(&mut self, checkmarks: &WeekCheckmarks);
    fn show_goals(&mut self, goals: &GoalList);
    fn show_chart(&mut self, chart: &WeeklyChart);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub greeting: String,
    pub image: ProfileImage,
    /// Profile is missing age or weight.
    pub show_badge: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TodayActivity {
    pub totals: ActivityTotals,
    pub steps_text: String,
    pub calories_text: String,
    pub active_minutes_text: String,
    pub distance_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub value_text: String,
    /// `"/10,000"`
    pub goal_text: String,
    /// Filled share of the ring, 0.0..=1.0.
    pub fraction: f64,
}

impl Ring {
    fn new(value: i64, goal: i64) -> Self {
        let fraction = if goal > 0 {
            (value as f64 / goal as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            value_text: format::thousands(value),
            goal_text: format!("/{}", format::thousands(goal)),
            fraction,
        }
    }
}

/// Rings exist only for the daily goals the user has set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressRings {
    pub steps: Option<Ring>,
    pub calories: Option<Ring>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyTarget {
    pub progress: WeeklyProgress,
    /// `"12,000 of 70,000 steps"`
    pub summary_text: String,
    pub percent_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCheck {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub complete: bool,
}

impl DayCheck {
    pub const fn symbol(&self) -> &'static str {
        if self.complete {
            "✓"
        } else {
            "○"
        }
    }
}

/// Monday..Sunday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekCheckmarks {
    pub days: [DayCheck; 7],
}

impl WeekCheckmarks {
    pub fn get(&self, weekday: Weekday) -> &DayCheck {
        &self.days[weekday.num_days_from_monday() as usize]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalList {
    pub date: NaiveDate,
    pub entries: Vec<GoalEntry>,
}

impl GoalList {
    /// The view shows its empty state instead of the list.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartBar {
    pub weekday: Weekday,
    pub label: String,
    pub steps: i64,
}

/// Sunday..Saturday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyChart {
    pub bars: Vec<ChartBar>,
}

/// Everything one refresh pass computed.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeSnapshot {
    pub user_id: String,
    pub header: Header,
    pub today: TodayActivity,
    pub rings: ProgressRings,
    pub weekly_target: WeeklyTarget,
    pub checkmarks: WeekCheckmarks,
    pub goals: GoalList,
    pub chart: WeeklyChart,
}

impl HomeSnapshot {
    pub fn apply<V: HomeView + ?Sized>(&self, view: &mut V) {
        view.show_header(&self.header);
        view.show_today(&self.today);
        view.show_progress_rings(&self.rings);
        view.show_weekly_target(&self.weekly_target);
        view.show_checkmarks(&self.checkmarks);
        view.show_goals(&self.goals);
        view.show_chart(&self.chart);
    }
}

pub struct HomePresenter<I: IdentityProvider> {
    store: Store,
    identity: I,
    default_step_goal: i64,
}

impl<I: IdentityProvider> HomePresenter<I> {
    pub fn new(store: Store, identity: I, default_step_goal: i64) -> Self {
        Self {
            store,
            identity,
            default_step_goal,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Runs one refresh pass. `Ok(None)` when nobody is signed in.
    pub fn snapshot<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Option<HomeSnapshot>> {
        let Some(user) = self
            .store
            .current_user()
            .context("Failed to load the current user")?
        else {
            return Ok(None);
        };
        debug!(
            user_id = %user.user_id,
            step_goal = ?user.daily_step_goal,
            calorie_goal = ?user.daily_calorie_goal,
            workout_goal = ?user.weekly_workout_goal,
            "Refreshing home dashboard"
        );

        let header = self.load_header(&user);
        let (today, rings) = self.load_today(&user, now)?;
        let weekly_target = self.load_weekly_target(&user, now)?;
        let checkmarks = self.load_checkmarks(&user, now)?;
        let goals = self.load_goal_list(&user, now)?;
        let chart = self.load_chart(&user, now)?;

        Ok(Some(HomeSnapshot {
            user_id: user.user_id,
            header,
            today,
            rings,
            weekly_target,
            checkmarks,
            goals,
            chart,
        }))
    }

    /// Refreshes `view`. Failures are logged and leave the view untouched.
    /// Returns whether the view was updated.
    pub fn render<V: HomeView + ?Sized, Tz: TimeZone>(
        &self,
        view: &mut V,
        now: &DateTime<Tz>,
    ) -> bool {
        match self.snapshot(now) {
            Ok(Some(snapshot)) => {
                snapshot.apply(view);
                true
            }
            Ok(None) => {
                warn!("No signed-in user, home dashboard not rendered");
                false
            }
            Err(e) => {
                error!("Home dashboard refresh failed: {e:#}");
                false
            }
        }
    }

    /// Persists a new completion state for a stored goal. Open screens pick
    /// the change up from the store's notification.
    pub fn toggle_goal(&self, goal_id: i64, completed: bool, now: DateTime<Utc>) -> Result<Goal> {
        if goal_id <= 0 {
            bail!("Goal {goal_id} is a daily target and cannot be toggled");
        }
        let mut goal = self
            .store
            .goal(goal_id)
            .with_context(|| format!("Failed to load goal {goal_id}"))?
            .ok_or(DbError::GoalNotFound(goal_id))?;
        goal.set_completed(completed, now);
        self.store
            .update_goal(&goal)
            .with_context(|| format!("Failed to update goal {goal_id}"))?;
        debug!(goal_id, completed, "Goal completion updated");
        Ok(goal)
    }

    /// Same as [`HomePresenter::toggle_goal`] for a list entry; target goals are refused.
    pub fn toggle_entry(&self, entry: &GoalEntry, completed: bool, now: DateTime<Utc>) -> Result<Goal> {
        match entry.stored_id() {
            Some(goal_id) => self.toggle_goal(goal_id, completed, now),
            None => bail!("'{}' is a daily target and cannot be toggled", entry.title()),
        }
    }

    fn load_header(&self, user: &UserProfile) -> Header {
        Header {
            greeting: user.display_name.clone(),
            image: resolve_profile_image(user, &self.identity),
            show_badge: user.is_incomplete(),
        }
    }

    fn load_today<Tz: TimeZone>(
        &self,
        user: &UserProfile,
        now: &DateTime<Tz>,
    ) -> Result<(TodayActivity, ProgressRings)> {
        let start = time_window::day_start(now);
        let sessions = self
            .store
            .sessions_in_range(&user.user_id, &start, now)
            .context("Failed to load today's sessions")?;
        let totals = aggregate::aggregate(&sessions);

        let today = TodayActivity {
            totals,
            steps_text: format::thousands(totals.steps),
            calories_text: format::thousands(totals.calories),
            active_minutes_text: totals.active_minutes.to_string(),
            distance_text: format::distance_km(totals.distance_km),
        };
        let rings = ProgressRings {
            steps: user.daily_step_goal.map(|goal| Ring::new(totals.steps, goal)),
            calories: user
                .daily_calorie_goal
                .map(|goal| Ring::new(totals.calories, goal)),
        };
        Ok((today, rings))
    }

    fn load_weekly_target<Tz: TimeZone>(
        &self,
        user: &UserProfile,
        now: &DateTime<Tz>,
    ) -> Result<WeeklyTarget> {
        let start = time_window::week_start(now);
        let sessions = self
            .store
            .sessions_in_range(&user.user_id, &start, now)
            .context("Failed to load this week's sessions for the weekly target")?;
        let weekly_steps = aggregate::aggregate(&sessions).steps;
        let progress = goals::weekly_progress(user, weekly_steps, self.default_step_goal);

        Ok(WeeklyTarget {
            progress,
            summary_text: format!(
                "{} of {} steps",
                format::thousands(progress.steps),
                format::thousands(progress.goal)
            ),
            percent_text: format::percent(progress.percent),
        })
    }

    fn load_checkmarks<Tz: TimeZone>(
        &self,
        user: &UserProfile,
        now: &DateTime<Tz>,
    ) -> Result<WeekCheckmarks> {
        let tz = now.timezone();
        let week_start = time_window::week_start(now);
        let dates = time_window::week_days(&week_start);
        debug!(week_start = %dates[0], "Evaluating weekly checkmarks");

        let mut days = dates.map(|date| DayCheck {
            date,
            weekday: date.weekday(),
            complete: false,
        });
        for day in &mut days {
            let start = time_window::start_of_date(&tz, day.date);
            let end = time_window::day_end(&start);
            let sessions = self
                .store
                .sessions_in_range(&user.user_id, &start, &end)
                .with_context(|| format!("Failed to load sessions for {}", day.date))?;
            let stored_goals = self
                .store
                .goals_for_date(&user.user_id, day.date)
                .with_context(|| format!("Failed to load goals for {}", day.date))?;

            let totals = aggregate::aggregate(&sessions);
            let evaluation = goals::evaluate_day(user, &stored_goals, &totals);
            day.complete = evaluation.is_complete();
            debug!(
                date = %day.date,
                steps = totals.steps,
                calories = totals.calories,
                goals = stored_goals.len(),
                goals_done = stored_goals.iter().filter(|g| g.is_completed).count(),
                all_completed = evaluation.all_completed,
                "Day evaluated"
            );
        }
        Ok(WeekCheckmarks { days })
    }

    fn load_goal_list<Tz: TimeZone>(
        &self,
        user: &UserProfile,
        now: &DateTime<Tz>,
    ) -> Result<GoalList> {
        let today = now.date_naive();
        let stored_goals = self
            .store
            .goals_for_date(&user.user_id, today)
            .context("Failed to load today's goals")?;
        let start = time_window::day_start(now);
        let sessions = self
            .store
            .sessions_in_range(&user.user_id, &start, now)
            .context("Failed to load today's sessions for the goal list")?;
        let totals = aggregate::aggregate(&sessions);
        debug!(date = %today, stored = stored_goals.len(), "Loaded goals for today");

        Ok(GoalList {
            date: today,
            entries: goals::todays_goals(user, stored_goals, &totals),
        })
    }

    fn load_chart<Tz: TimeZone>(&self, user: &UserProfile, now: &DateTime<Tz>) -> Result<WeeklyChart> {
        let start = time_window::week_start(now);
        let sessions = self
            .store
            .sessions_in_range(&user.user_id, &start, now)
            .context("Failed to load this week's sessions for the chart")?;
        let buckets = aggregate::steps_by_weekday(&sessions, &now.timezone());
        debug!(sessions = sessions.len(), total = buckets.total(), "Chart data loaded");

        let bars = buckets
            .iter()
            .map(|(weekday, steps)| ChartBar {
                weekday,
                label: weekday.to_string(),
                steps,
            })
            .collect();
        Ok(WeeklyChart { bars })
    }
}
