// src/db.rs
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Calendar-day key used by the goals table.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DB_FILE_NAME: &str = "fit-home.sqlite";
const APP_DATA_DIR: &str = "fit-home"; // Same dir name as config for consistency

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
    pub daily_step_goal: Option<i64>, // Use i64 for SQLite INTEGER compatibility
    pub daily_calorie_goal: Option<i64>,
    pub weekly_workout_goal: Option<i64>,
    pub age: i64,
    pub weight_kg: f64,
}

impl UserProfile {
    pub fn new(user_id: &str, display_name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            profile_image_url: None,
            daily_step_goal: None,
            daily_calorie_goal: None,
            weekly_workout_goal: None,
            age: 0,
            weight_kg: 0.0,
        }
    }

    /// Age or weight never filled in.
    pub fn is_incomplete(&self) -> bool {
        self.age == 0 || self.weight_kg == 0.0
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum SessionStatus {
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSession {
    pub id: i64,
    pub user_id: String,
    pub workout_name: String,
    pub start_time: DateTime<Utc>,
    pub duration_seconds: i64,
    pub status: SessionStatus,
    pub steps: i64,
    pub calories_burned: i64,
    pub distance_km: f64,
}

impl WorkoutSession {
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

/// Data needed to insert a session row.
#[derive(Debug, Clone)]
pub struct NewSession<'a> {
    pub user_id: &'a str,
    pub workout_name: &'a str,
    pub start_time: DateTime<Utc>,
    pub duration_seconds: i64,
    pub status: SessionStatus,
    pub steps: i64,
    pub calories_burned: i64,
    pub distance_km: f64,
}

/// A user-created checklist item for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub goal_id: i64,
    pub user_id: String,
    pub date: String,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection failed")]
    Connection(#[from] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing database file")]
    Io(#[from] std::io::Error),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Goal not found: ID {0}")]
    GoalNotFound(i64),
    #[error("Database query failed: {0}")]
    QueryFailed(rusqlite::Error),
    #[error("Database update failed: {0}")]
    UpdateFailed(rusqlite::Error),
    #[error("Database insert failed: {0}")]
    InsertFailed(rusqlite::Error),
}

/// Gets the path to the SQLite database file within the app's data directory.
/// Creates the directory if it doesn't exist.
pub fn get_db_path() -> Result<PathBuf, DbError> {
    let data_dir = dirs::data_dir().ok_or(DbError::DataDir)?;
    let app_dir = data_dir.join(APP_DATA_DIR);
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(DB_FILE_NAME))
}

/// Opens a connection to the SQLite database.
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Connection, DbError> {
    Connection::open(path).map_err(DbError::Connection)
}

/// Initializes the database tables if they don't exist.
pub fn init_db(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY NOT NULL,
            display_name TEXT NOT NULL,
            profile_image_url TEXT,
            daily_step_goal INTEGER,
            daily_calorie_goal INTEGER,
            weekly_workout_goal INTEGER,
            age INTEGER NOT NULL DEFAULT 0,
            weight_kg REAL NOT NULL DEFAULT 0,
            signed_in INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS workout_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            workout_name TEXT NOT NULL,
            start_time TEXT NOT NULL,          -- RFC3339, UTC, fixed millisecond width
            duration_seconds INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL CHECK(status IN ('in-progress', 'completed', 'cancelled')),
            steps INTEGER NOT NULL DEFAULT 0,
            calories_burned INTEGER NOT NULL DEFAULT 0,
            distance_km REAL NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_user_start
            ON workout_sessions (user_id, start_time);
        CREATE TABLE IF NOT EXISTS goals (
            goal_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,                -- YYYY-MM-DD
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            is_completed INTEGER NOT NULL DEFAULT 0,
            completed_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_goals_user_date ON goals (user_id, date);",
    )
    .map_err(DbError::Connection)?;
    Ok(())
}

/// Formats a date the way the goals table keys it.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// Fixed width keeps lexical order equal to time order for range queries.
fn to_db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_db_timestamp(value: &str, column: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

// ---- Users ----

fn map_row_to_user(row: &Row) -> Result<UserProfile, rusqlite::Error> {
    Ok(UserProfile {
        user_id: row.get(0)?,
        display_name: row.get(1)?,
        profile_image_url: row.get(2)?,
        daily_step_goal: row.get(3)?,
        daily_calorie_goal: row.get(4)?,
        weekly_workout_goal: row.get(5)?,
        age: row.get(6)?,
        weight_kg: row.get(7)?,
    })
}

const USER_COLUMNS: &str = "user_id, display_name, profile_image_url, daily_step_goal, \
     daily_calorie_goal, weekly_workout_goal, age, weight_kg";

/// Inserts the profile or replaces every field of an existing one.
pub fn save_user(conn: &Connection, user: &UserProfile) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO users (user_id, display_name, profile_image_url, daily_step_goal,
                            daily_calorie_goal, weekly_workout_goal, age, weight_kg)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(user_id) DO UPDATE SET
            display_name = excluded.display_name,
            profile_image_url = excluded.profile_image_url,
            daily_step_goal = excluded.daily_step_goal,
            daily_calorie_goal = excluded.daily_calorie_goal,
            weekly_workout_goal = excluded.weekly_workout_goal,
            age = excluded.age,
            weight_kg = excluded.weight_kg",
        params![
            user.user_id,
            user.display_name,
            user.profile_image_url,
            user.daily_step_goal,
            user.daily_calorie_goal,
            user.weekly_workout_goal,
            user.age,
            user.weight_kg,
        ],
    )
    .map_err(DbError::InsertFailed)?;
    Ok(())
}

/// Marks one user as the signed-in user, signing everyone else out.
pub fn sign_in(conn: &mut Connection, user_id: &str) -> Result<(), DbError> {
    let tx = conn.transaction()?;
    tx.execute("UPDATE users SET signed_in = 0", [])
        .map_err(DbError::UpdateFailed)?;
    let rows = tx
        .execute(
            "UPDATE users SET signed_in = 1 WHERE user_id = ?1",
            params![user_id],
        )
        .map_err(DbError::UpdateFailed)?;
    if rows == 0 {
        // Dropping the transaction rolls back the sign-out above.
        return Err(DbError::UserNotFound(user_id.to_string()));
    }
    tx.commit()?;
    Ok(())
}

pub fn get_user(conn: &Connection, user_id: &str) -> Result<Option<UserProfile>, DbError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1");
    let mut stmt = conn.prepare(&sql).map_err(DbError::QueryFailed)?;
    stmt.query_row(params![user_id], map_row_to_user)
        .optional()
        .map_err(DbError::QueryFailed)
}

/// The signed-in user, if any.
pub fn get_current_user(conn: &Connection) -> Result<Option<UserProfile>, DbError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE signed_in = 1 LIMIT 1");
    let mut stmt = conn.prepare(&sql).map_err(DbError::QueryFailed)?;
    stmt.query_row([], map_row_to_user)
        .optional()
        .map_err(DbError::QueryFailed)
}

// ---- Workout sessions ----

fn map_row_to_session(row: &Row) -> Result<WorkoutSession, rusqlite::Error> {
    let start_str: String = row.get(3)?;
    let status_str: String = row.get(5)?;
    let status = SessionStatus::from_str(&status_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(WorkoutSession {
        id: row.get(0)?,
        user_id: row.get(1)?,
        workout_name: row.get(2)?,
        start_time: parse_db_timestamp(&start_str, 3)?,
        duration_seconds: row.get(4)?,
        status,
        steps: row.get(6)?,
        calories_burned: row.get(7)?,
        distance_km: row.get(8)?,
    })
}

/// Adds a new workout session. Returns the new row ID.
pub fn add_session(conn: &Connection, session: &NewSession) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO workout_sessions
            (user_id, workout_name, start_time, duration_seconds, status, steps, calories_burned, distance_km)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            session.user_id,
            session.workout_name,
            to_db_timestamp(&session.start_time),
            session.duration_seconds,
            session.status.to_string(),
            session.steps,
            session.calories_burned,
            session.distance_km,
        ],
    )
    .map_err(DbError::InsertFailed)?;

    Ok(conn.last_insert_rowid())
}

/// Sessions of one user whose start time lies in `[start, end]`, oldest first.
/// Every status is returned; callers filter on completion.
pub fn list_sessions_in_range(
    conn: &Connection,
    user_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<WorkoutSession>, DbError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, user_id, workout_name, start_time, duration_seconds, status,
                    steps, calories_burned, distance_km
             FROM workout_sessions
             WHERE user_id = ?1 AND start_time >= ?2 AND start_time <= ?3
             ORDER BY start_time ASC, id ASC",
        )
        .map_err(DbError::QueryFailed)?;
    let session_iter = stmt
        .query_map(
            params![user_id, to_db_timestamp(&start), to_db_timestamp(&end)],
            map_row_to_session,
        )
        .map_err(DbError::QueryFailed)?;

    let mut sessions = Vec::new();
    for session_result in session_iter {
        sessions.push(session_result.map_err(DbError::QueryFailed)?);
    }
    Ok(sessions)
}

// ---- Goals ----

fn map_row_to_goal(row: &Row) -> Result<Goal, rusqlite::Error> {
    let completed_str: Option<String> = row.get(6)?;
    let completed_at = match completed_str {
        Some(s) => Some(parse_db_timestamp(&s, 6)?),
        None => None,
    };
    Ok(Goal {
        goal_id: row.get(0)?,
        user_id: row.get(1)?,
        date: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        is_completed: row.get(5)?,
        completed_at,
    })
}

const GOAL_COLUMNS: &str =
    "goal_id, user_id, date, title, description, is_completed, completed_at";

/// Creates an open goal for the given day. Returns the new goal ID.
pub fn add_goal(
    conn: &Connection,
    user_id: &str,
    date: NaiveDate,
    title: &str,
    description: &str,
) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO goals (user_id, date, title, description, is_completed, completed_at)
         VALUES (?1, ?2, ?3, ?4, 0, NULL)",
        params![user_id, date_key(date), title, description],
    )
    .map_err(DbError::InsertFailed)?;
    Ok(conn.last_insert_rowid())
}

/// Goals of one user for one `YYYY-MM-DD` day, in creation order.
pub fn list_goals_for_date(
    conn: &Connection,
    user_id: &str,
    date: &str,
) -> Result<Vec<Goal>, DbError> {
    let sql = format!(
        "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ?1 AND date = ?2 ORDER BY goal_id ASC"
    );
    let mut stmt = conn.prepare(&sql).map_err(DbError::QueryFailed)?;
    let goal_iter = stmt
        .query_map(params![user_id, date], map_row_to_goal)
        .map_err(DbError::QueryFailed)?;

    let mut goals = Vec::new();
    for goal_result in goal_iter {
        goals.push(goal_result.map_err(DbError::QueryFailed)?);
    }
    Ok(goals)
}

pub fn get_goal(conn: &Connection, goal_id: i64) -> Result<Option<Goal>, DbError> {
    let sql = format!("SELECT {GOAL_COLUMNS} FROM goals WHERE goal_id = ?1");
    let mut stmt = conn.prepare(&sql).map_err(DbError::QueryFailed)?;
    stmt.query_row(params![goal_id], map_row_to_goal)
        .optional()
        .map_err(DbError::QueryFailed)
}

/// Writes every mutable field of a goal back by its ID.
pub fn update_goal(conn: &Connection, goal: &Goal) -> Result<(), DbError> {
    let rows_affected = conn
        .execute(
            "UPDATE goals SET title = ?1, description = ?2, is_completed = ?3, completed_at = ?4
             WHERE goal_id = ?5",
            params![
                goal.title,
                goal.description,
                goal.is_completed,
                goal.completed_at.as_ref().map(to_db_timestamp),
                goal.goal_id,
            ],
        )
        .map_err(DbError::UpdateFailed)?;

    if rows_affected == 0 {
        Err(DbError::GoalNotFound(goal.goal_id))
    } else {
        Ok(())
    }
}
