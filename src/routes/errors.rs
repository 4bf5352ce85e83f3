use crate::core::ToggleError;
use crate::models::ErrorResponse;
use crate::services::SourceError;
use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse};
use thiserror::Error;

/// Failures a handler answers with
///
/// Every variant renders as an `ErrorResponse` whose `error` field is a
/// snake_case code clients can match on.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("{0}")]
    InvalidFilter(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidKind(String),

    #[error("City {0} not found")]
    CityNotFound(String),

    #[error("City data unavailable: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Toggle(#[from] ToggleError),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidJson(_) => "invalid_json",
            ApiError::InvalidQuery(_) => "invalid_query",
            ApiError::InvalidFilter(_) => "invalid_filter",
            ApiError::Validation(_) => "validation_failed",
            ApiError::InvalidKind(_) => "invalid_kind",
            ApiError::CityNotFound(_) => "city_not_found",
            ApiError::Source(_) => "data_source_error",
            ApiError::Toggle(err) => err.code(),
        }
    }

    // Server-side details stay in the log
    fn public_message(&self) -> String {
        match self {
            ApiError::Source(_) => "City data could not be loaded.".to_string(),
            ApiError::Toggle(err) => err.user_message().to_string(),
            other => other.to_string(),
        }
    }
}

impl error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_)
            | ApiError::InvalidQuery(_)
            | ApiError::InvalidFilter(_)
            | ApiError::Validation(_)
            | ApiError::InvalidKind(_) => StatusCode::BAD_REQUEST,
            ApiError::CityNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Toggle(ToggleError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            ApiError::Source(_) | ApiError::Toggle(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request refused ({}): {}", self.code(), self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message: self.public_message(),
            status_code: status.as_u16(),
        })
    }
}

/// Error handler for `web::JsonConfig`
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Rejected JSON body on {}", req.path());
    ApiError::InvalidJson(err.to_string()).into()
}

/// Error handler for `web::QueryConfig`
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Rejected query string on {}", req.path());
    ApiError::InvalidQuery(err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StoreError;
    use crate::services::PostgresError;
    use actix_web::ResponseError;
    use serde_json::Value;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_client_errors_render_with_codes() {
        let (status, body) = render(ApiError::CityNotFound("99".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "city_not_found");
        assert_eq!(body["message"], "City 99 not found");
        assert_eq!(body["statusCode"], 404);

        let (status, body) = render(ApiError::Validation("limit: range".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
    }

    #[actix_web::test]
    async fn test_source_errors_hide_details() {
        let err = SourceError::Database(PostgresError::SqlxError(sqlx::Error::PoolClosed));
        let (status, body) = render(err.into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "data_source_error");
        assert_eq!(body["message"], "City data could not be loaded.");
    }

    #[test]
    fn test_toggle_errors_keep_their_codes() {
        let unauthenticated = ApiError::from(ToggleError::Unauthenticated);
        assert_eq!(unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(unauthenticated.code(), "unauthenticated");

        let failed = ApiError::from(ToggleError::InsertFailed(StoreError::Conflict {
            user_id: "u".to_string(),
            city_id: "1".to_string(),
        }));
        assert_eq!(failed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failed.code(), "insert_failed");
    }

    #[test]
    fn test_every_code_is_snake_case() {
        let errors = [
            ApiError::InvalidJson(String::new()),
            ApiError::InvalidQuery(String::new()),
            ApiError::InvalidFilter(String::new()),
            ApiError::Validation(String::new()),
            ApiError::InvalidKind(String::new()),
            ApiError::CityNotFound(String::new()),
            ApiError::Toggle(ToggleError::Unauthenticated),
        ];

        for err in errors {
            let code = err.code();
            assert!(code.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{}", code);
        }
    }
}
