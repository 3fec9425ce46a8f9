use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::{Challenge, SolverProfile};

/// Length of the most-solved and least-solved lists.
pub const RANKED_CHALLENGES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    pub count: usize,
    /// Solves across every challenge in the category.
    pub solved: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyStats {
    pub count: usize,
    /// Running SUM of the point values in this difficulty. Dashboards read
    /// this key as-is, so it keeps its name even though nothing is averaged.
    pub avg_points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeSolves {
    pub title: String,
    pub solves: usize,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedChallenge {
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub points: i64,
    pub solved_by: Vec<SolverProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeStats {
    pub by_category: BTreeMap<String, CategoryStats>,
    pub by_difficulty: BTreeMap<String, DifficultyStats>,
    pub top_challenges: Vec<ChallengeSolves>,
    pub least_solved: Vec<ChallengeSolves>,
    pub solved_challenges: Vec<SolvedChallenge>,
}

impl From<&Challenge> for ChallengeSolves {
    fn from(challenge: &Challenge) -> Self {
        Self {
            title: challenge.title.clone(),
            solves: challenge.solved_by.len(),
            points: challenge.points,
        }
    }
}

/// Groups challenges by category and difficulty and ranks them by solves.
///
/// Solver profiles must be resolved for every challenge that has solvers;
/// an unresolved one is a [`AnalyticsError::Computation`].
pub fn challenge_stats(challenges: &[Challenge]) -> AnalyticsResult<ChallengeStats> {
    let mut by_category: BTreeMap<String, CategoryStats> = BTreeMap::new();
    let mut by_difficulty: BTreeMap<String, DifficultyStats> = BTreeMap::new();

    for challenge in challenges {
        let category = by_category.entry(challenge.category.clone()).or_default();
        category.count += 1;
        category.solved += challenge.solved_by.len();

        let difficulty = by_difficulty.entry(challenge.difficulty.clone()).or_default();
        difficulty.count += 1;
        difficulty.avg_points += challenge.points;
    }

    // Stable sorts: equal solve counts keep their fetch order.
    let top_challenges = challenges
        .iter()
        .sorted_by(|a, b| b.solved_by.len().cmp(&a.solved_by.len()))
        .take(RANKED_CHALLENGES)
        .map(ChallengeSolves::from)
        .collect();

    let least_solved = challenges
        .iter()
        .sorted_by_key(|c| c.solved_by.len())
        .take(RANKED_CHALLENGES)
        .map(ChallengeSolves::from)
        .collect();

    let solved_challenges = challenges
        .iter()
        .filter(|c| !c.solved_by.is_empty())
        .map(|challenge| {
            let solved_by = challenge
                .solved_by
                .iter()
                .map(|solver| {
                    solver.profile.clone().ok_or_else(|| {
                        AnalyticsError::Computation(format!(
                            "solver {} of challenge '{}' was not resolved",
                            solver.id, challenge.title
                        ))
                    })
                })
                .collect::<AnalyticsResult<Vec<_>>>()?;

            Ok(SolvedChallenge {
                title: challenge.title.clone(),
                category: challenge.category.clone(),
                difficulty: challenge.difficulty.clone(),
                points: challenge.points,
                solved_by,
            })
        })
        .collect::<AnalyticsResult<Vec<_>>>()?;

    Ok(ChallengeStats { by_category, by_difficulty, top_challenges, least_solved, solved_challenges })
}
