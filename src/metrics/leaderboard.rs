use itertools::Itertools;
use serde::Serialize;

use crate::models::User;

pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub username: String,
    pub points: i64,
    pub challenges_solved: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardStats {
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Top [`LEADERBOARD_SIZE`] users by points. Equal scores keep input order.
pub fn leaderboard_stats(users: &[User]) -> LeaderboardStats {
    let leaderboard = users
        .iter()
        .sorted_by(|a, b| b.points.cmp(&a.points))
        .take(LEADERBOARD_SIZE)
        .enumerate()
        .map(|(i, user)| LeaderboardEntry {
            rank: i + 1,
            username: user.username.clone(),
            points: user.points,
            challenges_solved: user.solved_challenges.len(),
        })
        .collect();

    LeaderboardStats { leaderboard }
}
