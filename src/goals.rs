// src/goals.rs
//! Goal completion: the daily checkmark, the weekly target and today's goal list.

use chrono::{DateTime, Utc};

use crate::aggregate::ActivityTotals;
use crate::db::{Goal, UserProfile};
use crate::format;

/// Step goal assumed for the weekly target when the profile has none.
pub const DEFAULT_DAILY_STEP_GOAL: i64 = 10_000;

/// Display identifiers of the target goals. Stored goal IDs are always positive.
pub const STEP_TARGET_ID: i64 = -1;
pub const CALORIE_TARGET_ID: i64 = -2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Steps,
    Calories,
}

impl TargetKind {
    pub const fn display_id(self) -> i64 {
        match self {
            TargetKind::Steps => STEP_TARGET_ID,
            TargetKind::Calories => CALORIE_TARGET_ID,
        }
    }

    const fn unit(self) -> &'static str {
        match self {
            TargetKind::Steps => "steps",
            TargetKind::Calories => "calories",
        }
    }
}

/// A goal derived from the profile's daily targets. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetGoal {
    pub kind: TargetKind,
    pub target: i64,
    pub achieved: i64,
}

impl TargetGoal {
    pub fn is_completed(&self) -> bool {
        self.achieved >= self.target
    }

    pub fn title(&self) -> String {
        format!("Reach {} {}", format::thousands(self.target), self.kind.unit())
    }

    pub fn description(&self) -> String {
        format::progress(self.achieved, self.target)
    }
}

/// One row of today's goal list.
///
/// Only `Stored` entries carry a database ID, so a toggle can never be
/// written against a target goal.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalEntry {
    Target(TargetGoal),
    Stored(Goal),
}

impl GoalEntry {
    pub fn display_id(&self) -> i64 {
        match self {
            GoalEntry::Target(target) => target.kind.display_id(),
            GoalEntry::Stored(goal) => goal.goal_id,
        }
    }

    pub fn stored_id(&self) -> Option<i64> {
        match self {
            GoalEntry::Target(_) => None,
            GoalEntry::Stored(goal) => Some(goal.goal_id),
        }
    }

    pub fn title(&self) -> String {
        match self {
            GoalEntry::Target(target) => target.title(),
            GoalEntry::Stored(goal) => goal.title.clone(),
        }
    }

    pub fn description(&self) -> String {
        match self {
            GoalEntry::Target(target) => target.description(),
            GoalEntry::Stored(goal) => goal.description.clone(),
        }
    }

    pub fn is_completed(&self) -> bool {
        match self {
            GoalEntry::Target(target) => target.is_completed(),
            GoalEntry::Stored(goal) => goal.is_completed,
        }
    }
}

impl Goal {
    /// Sets the completion flag; `completed_at` follows it.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        self.is_completed = completed;
        self.completed_at = if completed { Some(now) } else { None };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayEvaluation {
    pub has_goals: bool,
    pub all_completed: bool,
}

impl DayEvaluation {
    /// A day without goals is never complete.
    pub const fn is_complete(&self) -> bool {
        self.has_goals && self.all_completed
    }
}

/// Evaluates one day's targets and stored goals against that day's totals.
pub fn evaluate_day(
    profile: &UserProfile,
    stored_goals: &[Goal],
    totals: &ActivityTotals,
) -> DayEvaluation {
    let has_goals = profile.daily_step_goal.is_some()
        || profile.daily_calorie_goal.is_some()
        || !stored_goals.is_empty();

    let steps_met = profile
        .daily_step_goal
        .map_or(true, |goal| totals.steps >= goal);
    let calories_met = profile
        .daily_calorie_goal
        .map_or(true, |goal| totals.calories >= goal);
    let stored_met = stored_goals.iter().all(|goal| goal.is_completed);

    DayEvaluation {
        has_goals,
        all_completed: steps_met && calories_met && stored_met,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyProgress {
    pub steps: i64,
    pub goal: i64,
    /// 0..=100
    pub percent: u8,
}

/// Weekly step total against seven times the daily step goal.
pub fn weekly_progress(
    profile: &UserProfile,
    weekly_steps: i64,
    default_step_goal: i64,
) -> WeeklyProgress {
    let goal = profile
        .daily_step_goal
        .unwrap_or(default_step_goal)
        .saturating_mul(7);
    let percent = if goal > 0 {
        let ratio = weekly_steps as f64 / goal as f64 * 100.0;
        ratio.round().clamp(0.0, 100.0) as u8
    } else {
        0
    };
    WeeklyProgress {
        steps: weekly_steps,
        goal,
        percent,
    }
}

/// Target goals first (steps, then calories), then the stored goals in order.
pub fn todays_goals(
    profile: &UserProfile,
    stored_goals: Vec<Goal>,
    totals: &ActivityTotals,
) -> Vec<GoalEntry> {
    let targets = [
        profile.daily_step_goal.map(|target| TargetGoal {
            kind: TargetKind::Steps,
            target,
            achieved: totals.steps,
        }),
        profile.daily_calorie_goal.map(|target| TargetGoal {
            kind: TargetKind::Calories,
            target,
            achieved: totals.calories,
        }),
    ];

    targets
        .into_iter()
        .flatten()
        .map(GoalEntry::Target)
        .chain(stored_goals.into_iter().map(GoalEntry::Stored))
        .collect()
}
