//! Data access layer: read-only views of users, challenges and submissions.
//!
//! The metric computers only see the [`DataAccess`] trait. [`SqliteStore`] is
//! the concrete rusqlite implementation; it also carries the write helpers
//! used to seed a database.

pub mod challenges;
pub mod schema;
pub mod submissions;
pub mod users;

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models;

pub type DBResult<T> = rusqlite::Result<T>;

/////*============== QUERY SHAPES ==============*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserFilter {
    All,
    CreatedSince(DateTime<Utc>),
    Blocked(bool),
}

impl UserFilter {
    /// SQL predicate over `Users` and its single bound parameter, if any.
    fn clause(&self) -> (&'static str, Option<i64>) {
        match self {
            UserFilter::All => ("1 = 1", None),
            UserFilter::CreatedSince(since) => ("created_at >= ?1", Some(since.timestamp_millis())),
            UserFilter::Blocked(blocked) => ("is_blocked = ?1", Some(*blocked as i64)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserSort {
    Unsorted,
    CreatedDesc,
    PointsDesc,
}

impl UserSort {
    // Ties always fall back to insertion order.
    fn order_by(&self) -> &'static str {
        match self {
            UserSort::Unsorted => "ORDER BY id ASC",
            UserSort::CreatedDesc => "ORDER BY created_at DESC, id ASC",
            UserSort::PointsDesc => "ORDER BY points DESC, id ASC",
        }
    }
}

/// Which users to fetch and how much of each to resolve.
///
/// Solved challenge ids are always loaded. `resolve_solved` additionally
/// attaches each solved challenge's title, category, difficulty and points.
#[derive(Debug, Clone, PartialEq)]
pub struct UserQuery {
    pub filter: UserFilter,
    pub sort: UserSort,
    pub limit: Option<usize>,
    pub resolve_solved: bool,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            filter: UserFilter::All,
            sort: UserSort::Unsorted,
            limit: None,
            resolve_solved: false,
        }
    }
}

impl UserQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: UserFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn sort(mut self, sort: UserSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn resolve_solved(mut self) -> Self {
        self.resolve_solved = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChallengeFilter {
    All,
    Visible(bool),
}

impl ChallengeFilter {
    fn clause(&self) -> (&'static str, Option<i64>) {
        match self {
            ChallengeFilter::All => ("1 = 1", None),
            ChallengeFilter::Visible(visible) => ("is_visible = ?1", Some(*visible as i64)),
        }
    }
}

/// Which challenges to fetch. Solver ids are always loaded; `with_solvers`
/// attaches each solver's username, email and points.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeQuery {
    pub filter: ChallengeFilter,
    pub with_solvers: bool,
}

impl ChallengeQuery {
    pub fn all() -> Self {
        Self { filter: ChallengeFilter::All, with_solvers: false }
    }

    pub fn with_solvers(mut self) -> Self {
        self.with_solvers = true;
        self
    }
}

/////*============== CONTRACT ==============*/
/// Read-only view over the platform's records.
///
/// Each call is its own snapshot; nothing is consistent across two calls.
pub trait DataAccess: Send + Sync {
    fn fetch_users(&self, query: &UserQuery) -> AnalyticsResult<Vec<models::User>>;
    fn fetch_challenges(&self, query: &ChallengeQuery) -> AnalyticsResult<Vec<models::Challenge>>;
    fn count_users(&self, filter: &UserFilter) -> AnalyticsResult<usize>;
    fn count_challenges(&self, filter: &ChallengeFilter) -> AnalyticsResult<usize>;
    fn fetch_submissions(&self) -> AnalyticsResult<Vec<models::Submission>>;
}

/////*============== SQLITE STORE ==============*/
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and makes sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> AnalyticsResult<Self> {
        log::info!("Opening SQLite database at {:?}", path.as_ref());
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> AnalyticsResult<Self> {
        log::debug!("Opening in-memory SQLite database");
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> AnalyticsResult<Self> {
        schema::initialize(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> DBResult<T>) -> AnalyticsResult<T> {
        let conn = self.conn
            .lock()
            .map_err(|err| AnalyticsError::StoreUnavailable(format!("lock poisoned: {err}")))?;
        Ok(f(&conn)?)
    }

    /// Inserts a user, ignoring `user.id` and `user.solved_challenges`.
    /// Returns the new user's id.
    pub fn insert_user(&self, user: &models::User) -> AnalyticsResult<models::UserId> {
        self.with_conn(|conn| users::insert_user(conn, user))
    }

    /// Inserts a challenge, ignoring `challenge.id` and `challenge.solved_by`.
    /// Returns the new challenge's id.
    pub fn insert_challenge(&self, challenge: &models::Challenge) -> AnalyticsResult<models::ChallengeId> {
        self.with_conn(|conn| challenges::insert_challenge(conn, challenge))
    }

    /// Marks `challenge` as solved by `user`.
    /// Returns `true` if it was newly added, false otherwise.
    pub fn record_solve(&self, user: models::UserId, challenge: models::ChallengeId) -> AnalyticsResult<bool> {
        self.with_conn(|conn| challenges::insert_solve(conn, user, challenge))
    }

    /// Records a submission attempt, ignoring `submission.id`.
    pub fn insert_submission(&self, submission: &models::Submission) -> AnalyticsResult<i64> {
        self.with_conn(|conn| submissions::insert_submission(conn, submission))
    }
}

impl DataAccess for SqliteStore {
    fn fetch_users(&self, query: &UserQuery) -> AnalyticsResult<Vec<models::User>> {
        self.with_conn(|conn| users::query_users(conn, query))
    }

    fn fetch_challenges(&self, query: &ChallengeQuery) -> AnalyticsResult<Vec<models::Challenge>> {
        self.with_conn(|conn| challenges::query_challenges(conn, query))
    }

    fn count_users(&self, filter: &UserFilter) -> AnalyticsResult<usize> {
        self.with_conn(|conn| users::count_users(conn, filter))
    }

    fn count_challenges(&self, filter: &ChallengeFilter) -> AnalyticsResult<usize> {
        self.with_conn(|conn| challenges::count_challenges(conn, filter))
    }

    fn fetch_submissions(&self) -> AnalyticsResult<Vec<models::Submission>> {
        self.with_conn(submissions::query_submissions)
    }
}

/// Turns a "UNIQUE constraint failed" error into `Ok(false)`. Other
/// constraint failures (foreign keys, NOT NULL) are still errors.
pub(crate) fn swallow_constraint_violation(err: rusqlite::Error) -> DBResult<bool> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => {
            log::trace!("[swallow_constraint_violation] Row already present, skipping.");
            Ok(false)
        }
        err => Err(err),
    }
}

/// Timestamps are stored as integer unix milliseconds.
pub(crate) struct Millis(pub DateTime<Utc>);

impl FromSql for Millis {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let millis = value.as_i64()?;
        DateTime::from_timestamp_millis(millis)
            .map(Millis)
            .ok_or(FromSqlError::OutOfRange(millis))
    }
}

impl ToSql for Millis {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.timestamp_millis()))
    }
}

impl FromSql for models::Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|err: String| FromSqlError::Other(err.into()))
    }
}

impl ToSql for models::Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}
