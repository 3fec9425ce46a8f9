use std::collections::HashMap;

use itertools::Itertools;
use rusqlite::{Connection, params_from_iter};

use crate::chdb::{ChallengeFilter, ChallengeQuery, DBResult};
use crate::models::{self, SolverProfile, SolverRef};

/////*============== CHALLENGE QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::Challenge {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            category: row.get("category")?,
            difficulty: row.get("difficulty")?,
            points: row.get("points")?,
            is_visible: row.get("is_visible")?,

            solved_by: Vec::new(),
        })
    }
}

/// Gathers the challenges matching `query`, with their solvers attached.
pub fn query_challenges(conn: &Connection, query: &ChallengeQuery) -> DBResult<Vec<models::Challenge>> {
    log::trace!("[query_challenges] Querying challenges: {query:?}");

    let (predicate, arg) = query.filter.clause();
    let mut stmt = conn.prepare(&format!(
        "SELECT id, title, category, difficulty, points, is_visible
         FROM Challenges
         WHERE {predicate}
         ORDER BY id ASC"
    ))?;

    let mut challenges = stmt
        .query_map(params_from_iter(arg), |row| models::Challenge::try_from(row))?
        .collect::<DBResult<Vec<models::Challenge>>>()?;

    let mut solvers = query_solvers_by_challenge(conn, query.with_solvers)?;
    for challenge in &mut challenges {
        challenge.solved_by = solvers.remove(&challenge.id).unwrap_or_default();
    }

    Ok(challenges)
}

/// Every solve, grouped by challenge, in the order they were recorded.
fn query_solvers_by_challenge(
    conn: &Connection,
    resolve: bool,
) -> DBResult<HashMap<models::ChallengeId, Vec<SolverRef>>> {
    let mut stmt = conn.prepare(
        "SELECT s.challenge_id AS challenge_id,
                s.user_id      AS user_id,
                u.username     AS username,
                u.email        AS email,
                u.points       AS points
         FROM Solves s
         JOIN Users u ON u.id = s.user_id
         ORDER BY s.rowid",
    )?;

    let solves = stmt
        .query_map([], |row| {
            let profile = if resolve {
                Some(SolverProfile {
                    username: row.get("username")?,
                    email: row.get("email")?,
                    points: row.get("points")?,
                })
            } else {
                None
            };

            Ok((row.get::<_, models::ChallengeId>("challenge_id")?, SolverRef { id: row.get("user_id")?, profile }))
        })?
        .collect::<DBResult<Vec<_>>>()?;

    Ok(solves.into_iter().into_group_map())
}

pub fn count_challenges(conn: &Connection, filter: &ChallengeFilter) -> DBResult<usize> {
    let (predicate, arg) = filter.clause();
    conn.query_row(
        &format!("SELECT COUNT(*) FROM Challenges WHERE {predicate}"),
        params_from_iter(arg),
        |row| row.get(0),
    )
}

/// Inserts a challenge and returns its id.
pub fn insert_challenge(conn: &Connection, challenge: &models::Challenge) -> DBResult<models::ChallengeId> {
    log::trace!("[insert_challenge] Inserting challenge {} into Challenges...", challenge.title);

    let query_params = rusqlite::named_params! {
            ":title":      challenge.title,
            ":category":   challenge.category,
            ":difficulty": challenge.difficulty,
            ":points":     challenge.points,
            ":is_visible": challenge.is_visible,
    };

    conn.prepare(
        "INSERT INTO Challenges ( title,  category,  difficulty,  points,  is_visible)
         VALUES                 (:title, :category, :difficulty, :points, :is_visible)"
    )?.execute(query_params)?;

    Ok(conn.last_insert_rowid())
}

/// Records that `user` solved `challenge`, doing nothing if it already is there.
/// Returns `true` if it was newly added, false otherwise.
pub fn insert_solve(conn: &Connection, user: models::UserId, challenge: models::ChallengeId) -> DBResult<bool> {
    log::trace!("[insert_solve] Recording solve of challenge {challenge} by user {user}...");

    conn.prepare("INSERT INTO Solves (user_id, challenge_id) VALUES (:user_id, :challenge_id)")?
        .execute(rusqlite::named_params! { ":user_id": user, ":challenge_id": challenge })
        .map_or_else(crate::chdb::swallow_constraint_violation, |_| Ok(true))
}
