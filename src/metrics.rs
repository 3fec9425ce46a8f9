//! Metric computers.
//!
//! Each computer is a pure function of already-fetched records and an explicit
//! reference time. None of them reads the clock, touches the store or depends
//! on another computer's output.

pub mod challenges;
pub mod consistency;
pub mod engagement;
pub mod leaderboard;
pub mod overview;
pub mod submissions;
pub mod traffic;

pub use challenges::{ChallengeStats, challenge_stats};
pub use engagement::{UserEngagement, user_engagement};
pub use leaderboard::{LeaderboardStats, leaderboard_stats};
pub use overview::{Overview, overview};
pub use submissions::{SubmissionAnalytics, submission_analytics};
pub use traffic::{Traffic, traffic};

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};

/// The instant a computation is anchored at, in the offset in effect at that
/// instant. Calendar days go through [`DayBoundary`](crate::config::DayBoundary)
/// instead, since a local offset can change inside a window.
pub type ReferenceTime = DateTime<FixedOffset>;

/// Users created within this many days of the reference time count as new.
pub const RECENT_WINDOW_DAYS: i64 = 30;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Start of the trailing `days`-long window ending at `now`.
pub fn window_start(now: &ReferenceTime, days: i64) -> DateTime<Utc> {
    now.with_timezone(&Utc) - TimeDelta::days(days)
}

/// Rounds to 2 decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::HashMap;

    use chrono::{DateTime, TimeDelta, Utc};

    use super::ReferenceTime;
    use crate::models::{
        Challenge, ChallengeId, Role, SolvedRef, SolverProfile, SolverRef, User, UserId,
    };

    /// Saturday 2024-06-15, noon UTC.
    pub fn now() -> ReferenceTime {
        DateTime::parse_from_rfc3339("2024-06-15T12:00:00+00:00").unwrap()
    }

    pub fn days_ago(days: i64) -> DateTime<Utc> {
        now().with_timezone(&Utc) - TimeDelta::days(days)
    }

    pub fn user(id: UserId, username: &str, points: i64, solved: &[ChallengeId]) -> User {
        User {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            points,
            solved_challenges: solved.iter().map(|&id| SolvedRef { id, detail: None }).collect(),
            created_at: days_ago(100),
            is_blocked: false,
            role: Role::User,
        }
    }

    pub fn challenge(id: ChallengeId, title: &str, category: &str, difficulty: &str, points: i64) -> Challenge {
        Challenge {
            id,
            title: title.to_string(),
            category: category.to_string(),
            difficulty: difficulty.to_string(),
            points,
            is_visible: true,
            solved_by: Vec::new(),
        }
    }

    /// Fills `solved_by` from the users' solved sets and resolves both sides'
    /// projections, the way the store does with resolution turned on.
    pub fn link(users: &mut [User], challenges: &mut [Challenge]) {
        let by_id: HashMap<ChallengeId, usize> =
            challenges.iter().enumerate().map(|(i, c)| (c.id, i)).collect();

        for challenge in challenges.iter_mut() {
            challenge.solved_by.clear();
        }

        for user in users.iter_mut() {
            for solved in &mut user.solved_challenges {
                let challenge = &mut challenges[by_id[&solved.id]];
                solved.detail = Some(challenge.summary());
                challenge.solved_by.push(SolverRef {
                    id: user.id,
                    profile: Some(SolverProfile {
                        username: user.username.clone(),
                        email: user.email.clone(),
                        points: user.points,
                    }),
                });
            }
        }
    }
}
