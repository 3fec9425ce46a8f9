use chrono::{DateTime, Utc};
use serde::Serialize;

pub type UserId = i64;
pub type ChallengeId = i64;

/// Account role. Only `Admin` and `Superadmin` may read the analytics routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Superadmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::Superadmin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub points: i64,

    pub solved_challenges: Vec<SolvedRef>,

    pub created_at: DateTime<Utc>,
    pub is_blocked: bool,
    pub role: Role,
}

/// A challenge in a user's solved set. `detail` is only filled when the
/// data access layer was asked to resolve it.
#[derive(Debug, Clone)]
pub struct SolvedRef {
    pub id: ChallengeId,
    pub detail: Option<ChallengeSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeSummary {
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub points: i64,
}

#[derive(Debug, Clone)]
pub struct Challenge {
    pub id: ChallengeId,
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub points: i64,
    pub is_visible: bool,

    pub solved_by: Vec<SolverRef>,
}

impl Challenge {
    pub fn summary(&self) -> ChallengeSummary {
        ChallengeSummary {
            title: self.title.clone(),
            category: self.category.clone(),
            difficulty: self.difficulty.clone(),
            points: self.points,
        }
    }
}

/// A user in a challenge's solver set, with an optional resolved profile.
#[derive(Debug, Clone)]
pub struct SolverRef {
    pub id: UserId,
    pub profile: Option<SolverProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolverProfile {
    pub username: String,
    pub email: String,
    pub points: i64,
}

/// One flag submission attempt. Immutable once recorded.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: i64,
    pub user_id: UserId,
    pub challenge_id: ChallengeId,

    pub flag: String,
    pub is_correct: bool,
    pub points_awarded: i64,
    pub submitted_at: DateTime<Utc>,

    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl std::fmt::Display for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Submission #{} (user {}, challenge {}, {}) at {}",
            self.id,
            self.user_id,
            self.challenge_id,
            if self.is_correct { "correct" } else { "incorrect" },
            self.submitted_at
        )
    }
}
