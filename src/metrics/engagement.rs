use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::{MILLIS_PER_DAY, ReferenceTime};
use crate::models::User;

pub const HIGH_ENGAGEMENT_SOLVES: usize = 5;
pub const MEDIUM_ENGAGEMENT_SOLVES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementTier {
    High,
    Medium,
    Low,
    /// Blocked, whatever the solve count.
    Inactive,
}

impl EngagementTier {
    pub fn classify(is_active: bool, challenges_solved: usize) -> Self {
        match challenges_solved {
            _ if !is_active => EngagementTier::Inactive,
            n if n >= HIGH_ENGAGEMENT_SOLVES => EngagementTier::High,
            n if n >= MEDIUM_ENGAGEMENT_SOLVES => EngagementTier::Medium,
            _ => EngagementTier::Low,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementSummary {
    pub total_users: usize,
    pub high_engagement: usize,
    pub medium_engagement: usize,
    pub low_engagement: usize,
    pub inactive: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub username: String,
    pub email: String,
    pub points: i64,
    pub challenges_solved: usize,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    /// Whole days since the account was created.
    pub days_active: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserEngagement {
    pub summary: EngagementSummary,
    pub users: Vec<UserActivity>,
}

/// Buckets users into engagement tiers by solve count.
///
/// The per-user list keeps the order of `users`.
pub fn user_engagement(users: &[User], now: &ReferenceTime) -> UserEngagement {
    let now_millis = now.timestamp_millis();
    let mut summary = EngagementSummary { total_users: users.len(), ..Default::default() };

    let activity = users
        .iter()
        .map(|user| {
            let challenges_solved = user.solved_challenges.len();
            let is_active = !user.is_blocked;

            match EngagementTier::classify(is_active, challenges_solved) {
                EngagementTier::High => summary.high_engagement += 1,
                EngagementTier::Medium => summary.medium_engagement += 1,
                EngagementTier::Low => summary.low_engagement += 1,
                EngagementTier::Inactive => summary.inactive += 1,
            }

            UserActivity {
                username: user.username.clone(),
                email: user.email.clone(),
                points: user.points,
                challenges_solved,
                created_at: user.created_at,
                is_active,
                // Floors towards negative infinity for accounts stamped in the future.
                days_active: (now_millis - user.created_at.timestamp_millis()).div_euclid(MILLIS_PER_DAY),
            }
        })
        .collect();

    UserEngagement { summary, users: activity }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::fixtures::{self, days_ago, user};
    use chrono::TimeDelta;

    #[test]
    fn tiers_follow_solve_thresholds() {
        assert_eq!(EngagementTier::classify(true, 0), EngagementTier::Low);
        assert_eq!(EngagementTier::classify(true, 1), EngagementTier::Low);
        assert_eq!(EngagementTier::classify(true, 2), EngagementTier::Medium);
        assert_eq!(EngagementTier::classify(true, 4), EngagementTier::Medium);
        assert_eq!(EngagementTier::classify(true, 5), EngagementTier::High);
        assert_eq!(EngagementTier::classify(false, 9), EngagementTier::Inactive);
    }

    #[test]
    fn blocked_users_only_count_as_inactive() {
        let mut blocked = user(4, "dave", 500, &[1, 2, 3, 4, 5, 6]);
        blocked.is_blocked = true;
        let users = [
            user(1, "alice", 100, &[1, 2]),
            user(2, "bob", 50, &[]),
            user(3, "carol", 200, &[1, 2, 3, 4, 5]),
            blocked,
        ];

        let result = user_engagement(&users, &fixtures::now());
        let summary = &result.summary;

        assert_eq!(summary.total_users, 4);
        assert_eq!(summary.high_engagement, 1);
        assert_eq!(summary.medium_engagement, 1);
        assert_eq!(summary.low_engagement, 1);
        assert_eq!(summary.inactive, 1);
        assert_eq!(
            summary.high_engagement + summary.medium_engagement + summary.low_engagement + summary.inactive,
            summary.total_users
        );
    }

    #[test]
    fn per_user_rows_keep_input_order_and_derive_fields() {
        let mut newest = user(1, "newest", 0, &[7]);
        newest.created_at = days_ago(0) - TimeDelta::hours(23);
        let mut older = user(2, "older", 10, &[]);
        older.created_at = days_ago(12) - TimeDelta::minutes(1);
        older.is_blocked = true;

        let result = user_engagement(&[newest, older], &fixtures::now());
        let rows = &result.users;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].username, "newest");
        assert_eq!(rows[0].challenges_solved, 1);
        assert_eq!(rows[0].days_active, 0);
        assert!(rows[0].is_active);

        assert_eq!(rows[1].username, "older");
        assert_eq!(rows[1].days_active, 12);
        assert!(!rows[1].is_active);
    }

    #[test]
    fn future_accounts_floor_to_negative_days() {
        let mut early = user(1, "early", 0, &[]);
        early.created_at = days_ago(0) + TimeDelta::hours(1);

        let result = user_engagement(&[early], &fixtures::now());
        assert_eq!(result.users[0].days_active, -1);
    }

    #[test]
    fn serializes_summary_with_camel_case_keys() {
        let value = serde_json::to_value(user_engagement(&[], &fixtures::now())).unwrap();
        assert_eq!(value["summary"]["highEngagement"], 0);
        assert_eq!(value["summary"]["totalUsers"], 0);
        assert!(value["users"].as_array().unwrap().is_empty());
    }
}
