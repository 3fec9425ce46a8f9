use axum::Json;
use axum::extract::State;
use axum::response::Response;
use serde_json::{Value, json};

use crate::chdb::{ChallengeQuery, UserFilter, UserQuery, UserSort};
use crate::envelope::{self, Envelope};
use crate::error::AnalyticsResult;
use crate::metrics::{self, RECENT_WINDOW_DAYS, consistency, leaderboard::LEADERBOARD_SIZE};
use crate::server::AppState;

/// GET /health
pub async fn health() -> Json<Envelope<Value>> {
    Json(Envelope::ok(json!({ "status": "ok" })))
}

/// GET /overview
pub async fn overview(State(state): State<AppState>) -> Response {
    let now = state.reference_time();
    let result = state
        .blocking(move |store| {
            let users = store.fetch_users(&UserQuery::all())?;
            let challenges = store.fetch_challenges(&ChallengeQuery::all())?;
            Ok(metrics::overview(&users, &challenges, &now))
        })
        .await;

    envelope::assemble("overview", result)
}

/// GET /user-engagement
pub async fn user_engagement(State(state): State<AppState>) -> Response {
    let now = state.reference_time();
    let result = state
        .blocking(move |store| {
            let users = store.fetch_users(&UserQuery::all().sort(UserSort::CreatedDesc))?;
            Ok(metrics::user_engagement(&users, &now))
        })
        .await;

    envelope::assemble("user engagement", result)
}

/// GET /challenge-stats
pub async fn challenge_stats(State(state): State<AppState>) -> Response {
    let result = state
        .blocking(|store| {
            let challenges = store.fetch_challenges(&ChallengeQuery::all().with_solvers())?;
            metrics::challenge_stats(&challenges)
        })
        .await;

    envelope::assemble("challenge stats", result)
}

/// GET /traffic
pub async fn traffic(State(state): State<AppState>) -> Response {
    let now = state.reference_time();
    let since = metrics::window_start(&now, RECENT_WINDOW_DAYS);
    let boundary = state.day_boundary;
    let result = state
        .blocking(move |store| {
            let users = store.fetch_users(&UserQuery::all().filter(UserFilter::CreatedSince(since)))?;
            Ok(metrics::traffic(&users, &now, boundary))
        })
        .await;

    envelope::assemble("traffic", result)
}

/// GET /leaderboard-stats
pub async fn leaderboard_stats(State(state): State<AppState>) -> Response {
    let result = state
        .blocking(|store| {
            let query = UserQuery::all().sort(UserSort::PointsDesc).limit(LEADERBOARD_SIZE);
            Ok(metrics::leaderboard_stats(&store.fetch_users(&query)?))
        })
        .await;

    envelope::assemble("leaderboard stats", result)
}

/// GET /submissions
pub async fn submissions(State(state): State<AppState>) -> Response {
    envelope::assemble("submission analytics", submission_analytics(&state).await)
}

async fn submission_analytics(state: &AppState) -> AnalyticsResult<metrics::SubmissionAnalytics> {
    // Neither fetch depends on the other.
    let (users, challenges) = tokio::try_join!(
        state.blocking(|store| store.fetch_users(&UserQuery::all().resolve_solved())),
        state.blocking(|store| store.fetch_challenges(&ChallengeQuery::all())),
    )?;

    consistency::enforce(state.consistency, &users, &challenges)?;
    let analytics = metrics::submission_analytics(&users, &challenges)?;

    if state.measured_attempts {
        let submissions = state.blocking(|store| store.fetch_submissions()).await?;
        return Ok(analytics.with_measured(&submissions));
    }

    Ok(analytics)
}
