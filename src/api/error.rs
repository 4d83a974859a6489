//! Mapping of gateway errors onto HTTP responses

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::Error;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Error returned by API handlers
#[derive(Debug)]
pub struct ApiError(Error);

impl ApiError {
    /// Status code and machine-readable code for the wrapped error
    #[must_use]
    pub const fn status(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            Error::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Config(_)
            | Error::Database(_)
            | Error::Sqlite(_)
            | Error::Io(_)
            | Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();

        if self.0.is_client_error() {
            tracing::debug!(status = status.as_u16(), error = %self.0, "request rejected");
        } else {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code,
                message: self.0.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Run a blocking registry call off the async executor
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError(Error::Internal(format!("registry task failed: {e}"))))?
        .map_err(ApiError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::InvalidInput("mac".into()), StatusCode::BAD_REQUEST),
            (Error::Conflict("name".into()), StatusCode::CONFLICT),
            (Error::NotFound("device".into()), StatusCode::NOT_FOUND),
            (
                Error::Database("pool exhausted".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Error::Internal("join failed".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_blocking_propagates_errors() {
        let ok = blocking(|| Ok(7)).await.unwrap();
        assert_eq!(ok, 7);

        let err = blocking::<(), _>(|| Err(Error::NotFound("policy 3".into())))
            .await
            .unwrap_err();
        assert_eq!(err.status().0, StatusCode::NOT_FOUND);
    }
}
