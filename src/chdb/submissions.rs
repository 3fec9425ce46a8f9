use rusqlite::Connection;

use crate::chdb::{DBResult, Millis};
use crate::models;

/////*============== SUBMISSION QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::Submission {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            challenge_id: row.get("challenge_id")?,

            flag: row.get("flag")?,
            is_correct: row.get("is_correct")?,
            points_awarded: row.get("points_awarded")?,
            submitted_at: row.get::<_, Millis>("submitted_at")?.0,

            ip_address: row.get("ip_address")?,
            user_agent: row.get("user_agent")?,
        })
    }
}

/// Gathers every recorded submission attempt, oldest first.
pub fn query_submissions(conn: &Connection) -> DBResult<Vec<models::Submission>> {
    log::trace!("[query_submissions] Querying all submissions.");

    let mut stmt = conn.prepare(
        "SELECT id, user_id, challenge_id, flag, is_correct, points_awarded,
                submitted_at, ip_address, user_agent
         FROM Submissions
         ORDER BY submitted_at ASC, id ASC",
    )?;

    let submissions = stmt
        .query_map([], |row| {
            models::Submission::try_from(row)
                .inspect_err(|err|
                    log::error!("[query_submissions] Could not convert row into submission: {err}"))
        })?
        .collect::<DBResult<Vec<models::Submission>>>()?;

    Ok(submissions)
}

/// Inserts a submission attempt and returns its id.
pub fn insert_submission(conn: &Connection, submission: &models::Submission) -> DBResult<i64> {
    log::trace!("[insert_submission] Inserting {submission}...");

    let query_params = rusqlite::named_params! {
            ":user_id":        submission.user_id,
            ":challenge_id":   submission.challenge_id,
            ":flag":           submission.flag,
            ":is_correct":     submission.is_correct,
            ":points_awarded": submission.points_awarded,
            ":submitted_at":   Millis(submission.submitted_at),
            ":ip_address":     submission.ip_address,
            ":user_agent":     submission.user_agent,
    };

    conn.prepare(
        "INSERT INTO Submissions
            ( user_id,  challenge_id,  flag,  is_correct,  points_awarded,  submitted_at,  ip_address,  user_agent)
         VALUES
            (:user_id, :challenge_id, :flag, :is_correct, :points_awarded, :submitted_at, :ip_address, :user_agent)"
    )?.execute(query_params)?;

    Ok(conn.last_insert_rowid())
}
