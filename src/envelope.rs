//! The uniform JSON envelope every route answers with.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::AnalyticsResult;

/// `{success, data?, message?, error?}`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), message: None, error: None }
    }
}

impl Envelope<()> {
    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self { success: false, data: None, message: Some(message.into()), error: Some(error.into()) }
    }
}

/// Wraps a computer's result for the wire.
///
/// Any error becomes a 500 with a generic message and the raw detail; it is
/// logged here, where it is caught. There are no partial results.
pub fn assemble<T: Serialize>(metric: &str, result: AnalyticsResult<T>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(Envelope::ok(data))).into_response(),
        Err(err) => {
            log::error!("[{metric}] Request failed ({}): {err}",
                if err.is_data_access() { "data access" } else { "computation" });

            let body = Envelope::failure(format!("Error fetching {metric}"), err.to_string());
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use serde_json::{Value, json};

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_carries_only_data() {
        let response = assemble("overview", Ok(json!({ "total": 3 })));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "success": true, "data": { "total": 3 } }));
    }

    #[tokio::test]
    async fn failure_is_a_server_error_with_detail() {
        let result: AnalyticsResult<Value> = Err(AnalyticsError::StoreUnavailable("lock poisoned".into()));
        let response = assemble("traffic", result);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({
                "success": false,
                "message": "Error fetching traffic",
                "error": "data store unavailable: lock poisoned",
            })
        );
    }

    #[test]
    fn computation_faults_are_not_data_access() {
        assert!(!AnalyticsError::Computation("x".into()).is_data_access());
        assert!(AnalyticsError::StoreUnavailable("x".into()).is_data_access());
    }
}
