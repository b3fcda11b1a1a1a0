// src/lib.rs
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};

// --- Declare modules ---
pub mod aggregate;
mod config;
pub mod db;
pub mod feed;
pub mod format;
pub mod goals;
pub mod identity;
pub mod presenter;
pub mod screen;
pub mod store;
pub mod time_window;

// --- Expose public types ---
pub use config::{
    get_config_path as get_config_path_util,
    load as load_config_util,
    parse_color,
    save as save_config_util,
    Config,
    ConfigError,
    StandardColor,
    ThemeConfig,
};

pub use db::{
    get_db_path as get_db_path_util,
    DbError,
    Goal,
    NewSession,
    SessionStatus,
    UserProfile,
    WorkoutSession,
};

pub use aggregate::{ActivityTotals, WeekdaySteps};
pub use goals::{DayEvaluation, GoalEntry, TargetGoal, TargetKind, WeeklyProgress};
pub use identity::{IdentityProvider, NoIdentity, ProfileImage, StaticIdentity};
pub use presenter::{HomePresenter, HomeSnapshot, HomeView};
pub use screen::{Clock, FixedClock, HomeScreen, ScreenState, SystemClock};
pub use store::Store;

/// Changes to the signed-in profile. `None` leaves a field alone; for the
/// optional fields `Some(None)` clears it.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    /// Profile to create or edit. Defaults to the signed-in one.
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub profile_image_url: Option<Option<String>>,
    pub daily_step_goal: Option<Option<i64>>,
    pub daily_calorie_goal: Option<Option<i64>>,
    pub weekly_workout_goal: Option<Option<i64>>,
    pub age: Option<i64>,
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct AddSessionParams {
    pub workout_name: String,
    pub start_time: DateTime<Utc>,
    pub duration_seconds: i64,
    pub status: SessionStatus,
    pub steps: i64,
    pub calories_burned: i64,
    pub distance_km: f64,
}

pub struct AppService {
    pub config: Config,
    pub store: Store,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppService {
    /// Initializes the application service.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;

        let db_path = db::get_db_path().context("Failed to determine database path")?;
        let conn = db::open_db(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;
        db::init_db(&conn).context("Failed to initialize database schema")?;

        Ok(Self {
            config,
            store: Store::new(conn),
            db_path,
            config_path,
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    /// Sets the step goal assumed by the weekly target for profiles without one.
    /// # Errors
    /// - `ConfigError::InvalidStepGoal` if `steps` is negative.
    /// - `ConfigError` variants if saving fails.
    pub fn set_default_daily_step_goal(&mut self, steps: i64) -> Result<(), ConfigError> {
        self.config.set_default_daily_step_goal(steps)?;
        self.save_config()
    }

    /// Builds a presenter over this service's store and config.
    pub fn presenter(&self) -> HomePresenter<StaticIdentity> {
        HomePresenter::new(
            self.store.clone(),
            StaticIdentity::new(self.config.fallback_profile_image.clone()),
            self.config.default_daily_step_goal,
        )
    }

    /// The signed-in profile.
    /// # Errors
    /// Fails if nobody is signed in or the query fails.
    pub fn current_user(&self) -> Result<UserProfile> {
        self.store
            .current_user()
            .context("Failed to load the current user")?
            .context("No profile signed in. Create one with 'profile --id <ID> --name <NAME>'.")
    }

    /// Creates or edits a profile and signs it in.
    /// # Errors
    /// Returns `anyhow::Error` if no profile can be resolved or the DB write fails.
    pub fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile> {
        let existing = match update.user_id.as_deref().map(str::trim) {
            Some("") => bail!("Profile ID cannot be empty."),
            Some(id) => self
                .store
                .user(id)
                .with_context(|| format!("Failed to look up profile '{id}'"))?,
            None => self.store.current_user().context("Failed to load the current user")?,
        };

        let mut user = match (existing, update.user_id.as_deref()) {
            (Some(user), _) => user,
            (None, Some(id)) => {
                let id = id.trim();
                UserProfile::new(id, update.display_name.as_deref().unwrap_or(id))
            }
            (None, None) => bail!("No profile signed in. Pass --id to create one."),
        };

        if let Some(name) = update.display_name {
            let name = name.trim();
            if name.is_empty() {
                bail!("Display name cannot be empty.");
            }
            user.display_name = name.to_string();
        }
        if let Some(url) = update.profile_image_url {
            user.profile_image_url = url;
        }
        if let Some(goal) = update.daily_step_goal {
            user.daily_step_goal = goal;
        }
        if let Some(goal) = update.daily_calorie_goal {
            user.daily_calorie_goal = goal;
        }
        if let Some(goal) = update.weekly_workout_goal {
            user.weekly_workout_goal = goal;
        }
        if let Some(age) = update.age {
            user.age = age;
        }
        if let Some(weight) = update.weight_kg {
            user.weight_kg = weight;
        }

        self.store
            .save_user(&user)
            .with_context(|| format!("Failed to save profile '{}'", user.user_id))?;
        self.store
            .sign_in(&user.user_id)
            .with_context(|| format!("Failed to sign in '{}'", user.user_id))?;
        Ok(user)
    }

    /// Records a workout session for the signed-in user.
    /// # Errors
    /// Returns `anyhow::Error` if no user is signed in, the name is empty, or the insert fails.
    pub fn add_session(&self, params: AddSessionParams) -> Result<i64> {
        let user = self.current_user()?;
        let name = params.workout_name.trim();
        if name.is_empty() {
            bail!("Workout name cannot be empty.");
        }
        self.store
            .add_session(&NewSession {
                user_id: &user.user_id,
                workout_name: name,
                start_time: params.start_time,
                duration_seconds: params.duration_seconds,
                status: params.status,
                steps: params.steps,
                calories_burned: params.calories_burned,
                distance_km: params.distance_km,
            })
            .context("Failed to add workout session")
    }

    /// Adds an open goal for `date` to the signed-in user's list.
    /// # Errors
    /// Returns `anyhow::Error` if no user is signed in, the title is empty, or the insert fails.
    pub fn add_goal(&self, date: NaiveDate, title: &str, description: &str) -> Result<i64> {
        let user = self.current_user()?;
        let title = title.trim();
        if title.is_empty() {
            bail!("Goal title cannot be empty.");
        }
        self.store
            .add_goal(&user.user_id, date, title, description.trim())
            .with_context(|| format!("Failed to add goal '{title}'"))
    }

    /// Stored goals of the signed-in user for `date`.
    /// # Errors
    /// Returns `anyhow::Error` if no user is signed in or the query fails.
    pub fn list_goals(&self, date: NaiveDate) -> Result<Vec<Goal>> {
        let user = self.current_user()?;
        self.store
            .goals_for_date(&user.user_id, date)
            .with_context(|| format!("Failed to list goals for {date}"))
    }

    /// Marks a stored goal done or open.
    /// # Errors
    /// Returns `anyhow::Error` if the goal does not exist or the update fails.
    pub fn toggle_goal(&self, goal_id: i64, completed: bool) -> Result<Goal> {
        self.presenter().toggle_goal(goal_id, completed, Utc::now())
    }
}
