// src/store.rs
//! Thread-safe handle over the database that announces its own writes.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};

use crate::db::{self, DbError, Goal, NewSession, UserProfile, WorkoutSession};
use crate::feed::{Change, ChangeFeed, Subscription};

/// Cloning shares the connection and the change feed.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    feed: ChangeFeed,
}

impl Store {
    /// Wraps an already initialized connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            feed: ChangeFeed::new(),
        }
    }

    /// Fresh in-memory database with the schema applied.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        db::init_db(&conn)?;
        Ok(Self::new(conn))
    }

    pub fn subscribe(&self) -> Subscription {
        self.feed.subscribe()
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut conn)
    }

    fn write<T>(
        &self,
        change: Change,
        f: impl FnOnce(&mut Connection) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let result = self.with_conn(f)?;
        // Lock released before listeners run their queries.
        self.feed.publish(change);
        Ok(result)
    }

    // ---- Reads ----

    pub fn current_user(&self) -> Result<Option<UserProfile>, DbError> {
        self.with_conn(|conn| db::get_current_user(conn))
    }

    pub fn user(&self, user_id: &str) -> Result<Option<UserProfile>, DbError> {
        self.with_conn(|conn| db::get_user(conn, user_id))
    }

    /// Sessions starting in `[start, end]`, both ends inclusive.
    pub fn sessions_in_range<Tz: TimeZone>(
        &self,
        user_id: &str,
        start: &DateTime<Tz>,
        end: &DateTime<Tz>,
    ) -> Result<Vec<WorkoutSession>, DbError> {
        let start = start.with_timezone(&Utc);
        let end = end.with_timezone(&Utc);
        self.with_conn(|conn| db::list_sessions_in_range(conn, user_id, start, end))
    }

    pub fn goals_for_date(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Goal>, DbError> {
        let key = db::date_key(date);
        self.with_conn(|conn| db::list_goals_for_date(conn, user_id, &key))
    }

    pub fn goal(&self, goal_id: i64) -> Result<Option<Goal>, DbError> {
        self.with_conn(|conn| db::get_goal(conn, goal_id))
    }

    // ---- Writes ----

    pub fn save_user(&self, user: &UserProfile) -> Result<(), DbError> {
        self.write(Change::Users, |conn| db::save_user(conn, user))
    }

    pub fn sign_in(&self, user_id: &str) -> Result<(), DbError> {
        self.write(Change::Users, |conn| db::sign_in(conn, user_id))
    }

    pub fn add_session(&self, session: &NewSession) -> Result<i64, DbError> {
        self.write(Change::Sessions, |conn| db::add_session(conn, session))
    }

    pub fn add_goal(
        &self,
        user_id: &str,
        date: NaiveDate,
        title: &str,
        description: &str,
    ) -> Result<i64, DbError> {
        self.write(Change::Goals, |conn| {
            db::add_goal(conn, user_id, date, title, description)
        })
    }

    pub fn update_goal(&self, goal: &Goal) -> Result<(), DbError> {
        self.write(Change::Goals, |conn| db::update_goal(conn, goal))
    }
}
