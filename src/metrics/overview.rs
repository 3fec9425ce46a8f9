use serde::Serialize;

use crate::metrics::{RECENT_WINDOW_DAYS, ReferenceTime, round2, window_start};
use crate::models::{Challenge, User};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub users: UserCounts,
    pub challenges: ChallengeCounts,
    pub submissions: SubmissionTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserCounts {
    pub total: usize,
    /// Created within the last [`RECENT_WINDOW_DAYS`] days.
    pub active: usize,
    pub admins: usize,
    pub blocked: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeCounts {
    pub total: usize,
    pub visible: usize,
    pub hidden: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionTotals {
    /// Sum of solved-set sizes: successful solves, not attempts.
    pub total: usize,
    /// `total_points / users.total`, 0 when there are no users.
    pub avg_per_user: f64,
    pub total_points: i64,
}

/// Headline counts for users, challenges and solves.
pub fn overview(users: &[User], challenges: &[Challenge], now: &ReferenceTime) -> Overview {
    let active_since = window_start(now, RECENT_WINDOW_DAYS);

    let total_users = users.len();
    let total_points: i64 = users.iter().map(|u| u.points).sum();
    let visible = challenges.iter().filter(|c| c.is_visible).count();

    let avg_per_user = if total_users == 0 {
        0.0
    } else {
        round2(total_points as f64 / total_users as f64)
    };

    Overview {
        users: UserCounts {
            total: total_users,
            active: users.iter().filter(|u| u.created_at >= active_since).count(),
            admins: users.iter().filter(|u| u.role.is_admin()).count(),
            blocked: users.iter().filter(|u| u.is_blocked).count(),
        },
        challenges: ChallengeCounts {
            total: challenges.len(),
            visible,
            hidden: challenges.len() - visible,
        },
        submissions: SubmissionTotals {
            total: users.iter().map(|u| u.solved_challenges.len()).sum(),
            avg_per_user,
            total_points,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::fixtures::{self, challenge, days_ago, user};
    use crate::models::Role;

    #[test]
    fn empty_platform_is_all_zeroes() {
        let result = overview(&[], &[], &fixtures::now());

        assert_eq!(result.users, UserCounts { total: 0, active: 0, admins: 0, blocked: 0 });
        assert_eq!(result.challenges, ChallengeCounts { total: 0, visible: 0, hidden: 0 });
        assert_eq!(result.submissions.total, 0);
        assert_eq!(result.submissions.avg_per_user, 0.0);
        assert_eq!(result.submissions.total_points, 0);
    }

    #[test]
    fn counts_users_by_role_block_and_recency() {
        let mut admin = user(1, "alice", 100, &[1, 2]);
        admin.role = Role::Admin;
        let mut root = user(2, "bob", 50, &[1]);
        root.role = Role::Superadmin;
        root.created_at = days_ago(3);
        let mut blocked = user(3, "carol", 0, &[]);
        blocked.is_blocked = true;
        blocked.created_at = days_ago(29);

        let mut hidden = challenge(2, "Hidden", "web", "hard", 300);
        hidden.is_visible = false;
        let challenges = [challenge(1, "Warmup", "misc", "easy", 50), hidden];

        let result = overview(&[admin, root, blocked], &challenges, &fixtures::now());

        assert_eq!(result.users, UserCounts { total: 3, active: 2, admins: 2, blocked: 1 });
        assert_eq!(result.challenges, ChallengeCounts { total: 2, visible: 1, hidden: 1 });
        assert_eq!(result.submissions.total, 3);
        assert_eq!(result.submissions.total_points, 150);
        assert_eq!(result.submissions.avg_per_user, 50.0);
    }

    #[test]
    fn average_is_rounded_to_two_places() {
        let users = [user(1, "a", 10, &[]), user(2, "b", 10, &[]), user(3, "c", 0, &[])];
        let result = overview(&users, &[], &fixtures::now());
        assert_eq!(result.submissions.avg_per_user, 6.67);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let value = serde_json::to_value(overview(&[], &[], &fixtures::now())).unwrap();
        assert_eq!(value["submissions"]["avgPerUser"], 0.0);
        assert_eq!(value["submissions"]["totalPoints"], 0);
        assert_eq!(value["users"]["admins"], 0);
    }
}
