use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Every failure a handler can surface. All variants are recovered at
/// the boundary into a structured JSON body; none abort the process.
#[derive(Debug, Display)]
pub enum ApiError {
    /// Unknown id, or an id outside the caller's visibility scope. The
    /// two are deliberately indistinguishable so out-of-scope record
    /// existence does not leak.
    #[display(fmt = "leave request not found")]
    NotFound,

    #[display(fmt = "permission denied")]
    Forbidden,

    /// The requested operation is not legal from the record's current
    /// status.
    #[display(fmt = "operation not allowed from the current status")]
    InvalidTransition,

    #[display(fmt = "{}", _0)]
    Validation(String),

    /// A concurrent transition won the conditional update race.
    #[display(fmt = "leave request was modified concurrently, retry")]
    Conflict,

    #[display(fmt = "internal server error")]
    Internal,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::InvalidTransition | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "database error");
        ApiError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_error_kind() {
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::InvalidTransition.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Validation("reason is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_message_reaches_the_body() {
        let err = ApiError::Validation("start_date cannot be after end_date".into());
        assert_eq!(err.to_string(), "start_date cannot be after end_date");
    }
}
