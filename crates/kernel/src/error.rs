//! Report error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors surfaced by the reporting subsystem.
///
/// Collaborator failures during the warm-up scan and missing optional tables
/// never reach this type; they are absorbed where they happen.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("items per page must be positive, got {0}")]
    InvalidPageSize(i64),

    #[error("order by '{0}' is not an allowed sort column")]
    UnsafeOrderBy(String),

    /// The store could not be reached or did not answer in time.
    #[error("backend unavailable")]
    BackendUnavailable(#[source] sqlx::Error),

    #[error("failed to map report row")]
    RowMapping(#[from] serde_json::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ReportError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ReportError::InvalidPageSize(_) | ReportError::UnsafeOrderBy(_) => {
                StatusCode::BAD_REQUEST
            }
            ReportError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ReportError::RowMapping(_) | ReportError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for ReportError {
    fn from(e: sqlx::Error) -> Self {
        if is_unavailable(&e) {
            ReportError::BackendUnavailable(e)
        } else {
            ReportError::Internal(anyhow::Error::new(e).context("report query failed"))
        }
    }
}

/// Connection, pool and timeout failures. Everything else (missing columns,
/// type mismatches, protocol errors) is a fault in the query or the schema.
fn is_unavailable(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        // 08: connection exception, 53: insufficient resources,
        // 57: operator intervention (statement timeout, shutdown)
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| ["08", "53", "57"].iter().any(|class| code.starts_with(*class))),
        _ => false,
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Input errors are echoed back; store details stay in the log
        let body = match &self {
            ReportError::BackendUnavailable(e) => {
                tracing::error!(error = %e, "report store unavailable");
                self.to_string()
            }
            ReportError::RowMapping(e) => {
                tracing::error!(error = %e, "report row did not match its record shape");
                "internal server error".to_string()
            }
            ReportError::Internal(e) => {
                tracing::error!(error = %e, "internal report error");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, axum::Json(serde_json::json!({ "error": body }))).into_response()
    }
}

/// Result type alias using ReportError.
pub type ReportResult<T> = Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_bad_requests() {
        assert_eq!(
            ReportError::InvalidPageSize(0).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ReportError::UnsafeOrderBy("1; DROP TABLE x".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn store_failures_are_distinct() {
        let err = ReportError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, ReportError::BackendUnavailable(_)));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "backend unavailable");

        let err = ReportError::from(sqlx::Error::PoolClosed);
        assert!(matches!(err, ReportError::BackendUnavailable(_)));
    }

    #[test]
    fn schema_faults_are_internal() {
        let err = ReportError::from(sqlx::Error::ColumnNotFound("nodeObjectType".into()));
        assert!(matches!(err, ReportError::Internal(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ReportError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ReportError::Internal(_)));
    }
}
