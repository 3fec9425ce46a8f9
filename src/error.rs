use thiserror::Error;

/// Failures that abort an analytics request.
///
/// `DataAccess` and `StoreUnavailable` mean the store could not answer;
/// `Computation` means an internal invariant broke and is a defect, not a
/// caller error.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("data access failure: {0}")]
    DataAccess(#[from] rusqlite::Error),

    #[error("data store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("computation fault: {0}")]
    Computation(String),
}

impl AnalyticsError {
    pub fn is_data_access(&self) -> bool {
        matches!(self, Self::DataAccess(_) | Self::StoreUnavailable(_))
    }
}

impl From<tokio::task::JoinError> for AnalyticsError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Computation(format!("blocking task did not complete: {err}"))
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
