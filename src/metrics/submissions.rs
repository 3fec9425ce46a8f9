//! Solve counts per user and per challenge, plus a success/failure summary.
//!
//! The summary is an ESTIMATE: solves are the only thing counted, and failed
//! attempts are assumed to be [`ESTIMATED_FAILURE_RATIO`] of them. When
//! measured attempts are requested, a second summary built from the recorded
//! submissions is attached next to it; the estimate itself never changes.

use itertools::Itertools;
use serde::Serialize;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::metrics::round2;
use crate::models::{Challenge, ChallengeSummary, Submission, User};

/// Assumed failed attempts per successful one.
pub const ESTIMATED_FAILURE_RATIO: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub total_successful: usize,
    pub estimated_failed: usize,
    pub estimated_total_attempts: usize,
    pub success_rate: f64,
    pub failure_rate: f64,
}

impl SubmissionSummary {
    pub fn estimate(total_successful: usize) -> Self {
        let estimated_failed = (total_successful as f64 * ESTIMATED_FAILURE_RATIO).floor() as usize;
        let estimated_total_attempts = total_successful + estimated_failed;

        let success_rate = if estimated_total_attempts == 0 {
            0.0
        } else {
            round2(total_successful as f64 / estimated_total_attempts as f64 * 100.0)
        };

        Self {
            total_successful,
            estimated_failed,
            estimated_total_attempts,
            success_rate,
            failure_rate: round2(100.0 - success_rate),
        }
    }
}

/// Attempt totals taken from the recorded submissions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasuredAttempts {
    pub total_attempts: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub success_rate: f64,
    pub failure_rate: f64,
}

impl MeasuredAttempts {
    /// Both rates are 0 when nothing was submitted.
    pub fn from_submissions(submissions: &[Submission]) -> Self {
        let total_attempts = submissions.len();
        let correct = submissions.iter().filter(|s| s.is_correct).count();

        let (success_rate, failure_rate) = if total_attempts == 0 {
            (0.0, 0.0)
        } else {
            let success = round2(correct as f64 / total_attempts as f64 * 100.0);
            (success, round2(100.0 - success))
        };

        Self { total_attempts, correct, incorrect: total_attempts - correct, success_rate, failure_rate }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSubmissions {
    pub username: String,
    pub email: String,
    pub points: i64,
    pub submissions: usize,
    pub challenges: Vec<ChallengeSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeSubmissions {
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub points: i64,
    pub submissions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAnalytics {
    pub summary: SubmissionSummary,
    pub user_submissions: Vec<UserSubmissions>,
    pub challenge_submissions: Vec<ChallengeSubmissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured: Option<MeasuredAttempts>,
}

impl SubmissionAnalytics {
    pub fn with_measured(mut self, submissions: &[Submission]) -> Self {
        self.measured = Some(MeasuredAttempts::from_submissions(submissions));
        self
    }
}

/// Per-user and per-challenge solve counts, busiest first.
///
/// Users need their solved challenges resolved; an unresolved one is a
/// [`AnalyticsError::Computation`].
pub fn submission_analytics(users: &[User], challenges: &[Challenge]) -> AnalyticsResult<SubmissionAnalytics> {
    let user_submissions = users
        .iter()
        .filter(|u| !u.solved_challenges.is_empty())
        .map(|user| {
            let solved = user
                .solved_challenges
                .iter()
                .map(|solved| {
                    solved.detail.clone().ok_or_else(|| {
                        AnalyticsError::Computation(format!(
                            "challenge {} solved by '{}' was not resolved",
                            solved.id, user.username
                        ))
                    })
                })
                .collect::<AnalyticsResult<Vec<_>>>()?;

            Ok(UserSubmissions {
                username: user.username.clone(),
                email: user.email.clone(),
                points: user.points,
                submissions: solved.len(),
                challenges: solved,
            })
        })
        .collect::<AnalyticsResult<Vec<_>>>()?
        .into_iter()
        .sorted_by(|a, b| b.submissions.cmp(&a.submissions))
        .collect_vec();

    let challenge_submissions = challenges
        .iter()
        .filter(|c| !c.solved_by.is_empty())
        .map(|challenge| ChallengeSubmissions {
            title: challenge.title.clone(),
            category: challenge.category.clone(),
            difficulty: challenge.difficulty.clone(),
            points: challenge.points,
            submissions: challenge.solved_by.len(),
        })
        .sorted_by(|a, b| b.submissions.cmp(&a.submissions))
        .collect_vec();

    let total_successful = users.iter().map(|u| u.solved_challenges.len()).sum();

    Ok(SubmissionAnalytics {
        summary: SubmissionSummary::estimate(total_successful),
        user_submissions,
        challenge_submissions,
        measured: None,
    })
}
