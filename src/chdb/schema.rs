use rusqlite::Connection;

use crate::chdb::DBResult;

pub const USERS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Users (
        id             INTEGER     PRIMARY KEY,
        username       TEXT        NOT NULL    UNIQUE,
        email          TEXT        NOT NULL,
        points         INTEGER     NOT NULL    DEFAULT 0,

        created_at     INTEGER     NOT NULL,
        is_blocked     BOOLEAN     NOT NULL    DEFAULT 0,
        role           TEXT        NOT NULL    DEFAULT 'user'
    )";

pub const CHALLENGES_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Challenges (
        id             INTEGER     PRIMARY KEY,
        title          TEXT        NOT NULL,
        category       TEXT        NOT NULL,
        difficulty     TEXT        NOT NULL,
        points         INTEGER     NOT NULL,
        is_visible     BOOLEAN     NOT NULL    DEFAULT 1
    )";

// Both directions of the user <-> challenge relation are read from here.
pub const SOLVES_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Solves (
        user_id        INTEGER     NOT NULL    REFERENCES Users(id),
        challenge_id   INTEGER     NOT NULL    REFERENCES Challenges(id),

        UNIQUE(user_id, challenge_id)
    )";

pub const SUBMISSIONS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Submissions (
        id             INTEGER     PRIMARY KEY,
        user_id        INTEGER     NOT NULL    REFERENCES Users(id),
        challenge_id   INTEGER     NOT NULL    REFERENCES Challenges(id),

        flag           TEXT        NOT NULL,
        is_correct     BOOLEAN     NOT NULL,
        points_awarded INTEGER     NOT NULL    DEFAULT 0,
        submitted_at   INTEGER     NOT NULL,

        ip_address     TEXT,
        user_agent     TEXT
    )";

/// Creates every table that doesn't exist yet.
pub fn initialize(conn: &Connection) -> DBResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    for (name, schema) in [
        ("Users", USERS_SCHEMA),
        ("Challenges", CHALLENGES_SCHEMA),
        ("Solves", SOLVES_SCHEMA),
        ("Submissions", SUBMISSIONS_SCHEMA),
    ] {
        log::debug!("[initialize] creating {name} table...");
        conn.execute(schema, [])?;
    }

    Ok(())
}
