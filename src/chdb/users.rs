use std::collections::HashMap;

use itertools::Itertools;
use rusqlite::{Connection, params_from_iter};

use crate::chdb::{DBResult, Millis, UserFilter, UserQuery};
use crate::models::{self, ChallengeSummary, SolvedRef};

/////*============== USER QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::User {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            email: row.get("email")?,
            points: row.get("points")?,

            solved_challenges: Vec::new(),

            created_at: row.get::<_, Millis>("created_at")?.0,
            is_blocked: row.get("is_blocked")?,
            role: row.get("role")?,
        })
    }
}

/// Gathers the users matching `query`, with their solved challenges attached.
pub fn query_users(conn: &Connection, query: &UserQuery) -> DBResult<Vec<models::User>> {
    log::trace!("[query_users] Querying users: {query:?}");

    let (predicate, arg) = query.filter.clause();
    // A negative LIMIT means "no limit" to SQLite.
    let limit = query.limit.map_or(-1, |n| n as i64);

    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, email, points, created_at, is_blocked, role
         FROM Users
         WHERE {predicate}
         {}
         LIMIT {limit}",
        query.sort.order_by()
    ))?;

    let mut users = stmt
        .query_map(params_from_iter(arg), |row| models::User::try_from(row))?
        .collect::<DBResult<Vec<models::User>>>()?;

    let mut solved = query_solved_by_user(conn, query.resolve_solved)?;
    for user in &mut users {
        user.solved_challenges = solved.remove(&user.id).unwrap_or_default();
    }

    Ok(users)
}

/// Every solve, grouped by the solving user, in the order they were recorded.
fn query_solved_by_user(
    conn: &Connection,
    resolve: bool,
) -> DBResult<HashMap<models::UserId, Vec<SolvedRef>>> {
    let mut stmt = conn.prepare(
        "SELECT s.user_id      AS user_id,
                s.challenge_id AS challenge_id,
                c.title        AS title,
                c.category     AS category,
                c.difficulty   AS difficulty,
                c.points       AS points
         FROM Solves s
         JOIN Challenges c ON c.id = s.challenge_id
         ORDER BY s.rowid",
    )?;

    let solves = stmt
        .query_map([], |row| {
            let detail = if resolve {
                Some(ChallengeSummary {
                    title: row.get("title")?,
                    category: row.get("category")?,
                    difficulty: row.get("difficulty")?,
                    points: row.get("points")?,
                })
            } else {
                None
            };

            Ok((row.get::<_, models::UserId>("user_id")?, SolvedRef { id: row.get("challenge_id")?, detail }))
        })?
        .collect::<DBResult<Vec<_>>>()?;

    Ok(solves.into_iter().into_group_map())
}

pub fn count_users(conn: &Connection, filter: &UserFilter) -> DBResult<usize> {
    let (predicate, arg) = filter.clause();
    conn.query_row(
        &format!("SELECT COUNT(*) FROM Users WHERE {predicate}"),
        params_from_iter(arg),
        |row| row.get(0),
    )
}

/// Inserts a user and returns its id.
pub fn insert_user(conn: &Connection, user: &models::User) -> DBResult<models::UserId> {
    log::trace!("[insert_user] Inserting user {} into Users...", user.username);

    let query_params = rusqlite::named_params! {
            ":username":   user.username,
            ":email":      user.email,
            ":points":     user.points,
            ":created_at": Millis(user.created_at),
            ":is_blocked": user.is_blocked,
            ":role":       user.role,
    };

    conn.prepare(
        "INSERT INTO Users ( username,  email,  points,  created_at,  is_blocked,  role)
         VALUES            (:username, :email, :points, :created_at, :is_blocked, :role)"
    )?.execute(query_params)
      .inspect_err(|err| log::error!("[insert_user] Could not insert {}: {err}", user.username))?;

    Ok(conn.last_insert_rowid())
}
