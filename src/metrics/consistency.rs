//! Cross-checks the two directions of the solve relation.
//!
//! A solve should show up both in the user's solved set and in the
//! challenge's solver set. Users and challenges are fetched separately, with no
//! shared snapshot, so a solve recorded between the two reads (or a store that
//! keeps both sides by hand) can leave them disagreeing.

use std::collections::BTreeSet;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::{Challenge, ChallengeId, User, UserId};

/// What to do when the two sides disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsistencyPolicy {
    /// Skip the check.
    Trust,
    /// Log each divergence and compute from the data as fetched.
    #[default]
    Warn,
    /// Fail the request.
    Strict,
}

impl std::str::FromStr for ConsistencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trust" => Ok(Self::Trust),
            "warn" => Ok(Self::Warn),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown consistency policy '{other}' (expected trust, warn or strict)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    /// The user lists the challenge, the challenge doesn't list the user.
    MissingSolver { user: UserId, challenge: ChallengeId },
    /// The challenge lists the user, the user doesn't list the challenge.
    MissingSolve { user: UserId, challenge: ChallengeId },
}

impl std::fmt::Display for Divergence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Divergence::MissingSolver { user, challenge } => {
                write!(f, "user {user} solved challenge {challenge}, but the challenge doesn't list them")
            }
            Divergence::MissingSolve { user, challenge } => {
                write!(f, "challenge {challenge} lists user {user} as a solver, but the user doesn't list it")
            }
        }
    }
}

pub fn find_divergences(users: &[User], challenges: &[Challenge]) -> Vec<Divergence> {
    let from_users: BTreeSet<(UserId, ChallengeId)> = users
        .iter()
        .flat_map(|u| u.solved_challenges.iter().map(move |s| (u.id, s.id)))
        .collect();

    let from_challenges: BTreeSet<(UserId, ChallengeId)> = challenges
        .iter()
        .flat_map(|c| c.solved_by.iter().map(move |s| (s.id, c.id)))
        .collect();

    let missing_solvers = from_users
        .difference(&from_challenges)
        .map(|&(user, challenge)| Divergence::MissingSolver { user, challenge });
    let missing_solves = from_challenges
        .difference(&from_users)
        .map(|&(user, challenge)| Divergence::MissingSolve { user, challenge });

    missing_solvers.chain(missing_solves).collect()
}

/// Applies `policy` to the fetched records.
pub fn enforce(policy: ConsistencyPolicy, users: &[User], challenges: &[Challenge]) -> AnalyticsResult<()> {
    if policy == ConsistencyPolicy::Trust {
        return Ok(());
    }

    let divergences = find_divergences(users, challenges);
    if divergences.is_empty() {
        return Ok(());
    }

    for divergence in &divergences {
        log::warn!("[consistency] {divergence}");
    }

    match policy {
        ConsistencyPolicy::Strict => Err(AnalyticsError::Computation(format!(
            "{} solve(s) disagree between users and challenges; first: {}",
            divergences.len(),
            divergences[0]
        ))),
        _ => Ok(()),
    }
}
