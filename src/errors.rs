// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("Missing merchant transaction id")]
    MissingTransactionId,

    #[error("Route not found")]
    RouteNotFound,

    #[error("PhonePe error: {0}")]
    PhonePeError(String),

    #[error("Authentication error")]
    AuthError,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MongoDB(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MissingTransactionId => StatusCode::BAD_REQUEST,
            AppError::RouteNotFound => StatusCode::NOT_FOUND,
            AppError::PhonePeError(_) => StatusCode::BAD_GATEWAY,
            AppError::AuthError => StatusCode::UNAUTHORIZED,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
            AppError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to the caller. Internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::MongoDB(_) => "Database error".to_string(),
            AppError::MissingTransactionId => "Missing merchant transaction id".to_string(),
            AppError::RouteNotFound => "Route not found".to_string(),
            AppError::PhonePeError(_) => "Payment provider error".to_string(),
            AppError::AuthError => "Authentication failed".to_string(),
            AppError::ValidationError(msg) => msg.clone(),
            AppError::ExternalApi(_) => "External API error".to_string(),
            AppError::ConfigurationError(_) => "Configuration error".to_string(),
            AppError::StoreError(_) => "Storage error".to_string(),
            AppError::Internal(_) => "Something went wrong!".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let body = Json(json!({
            "success": false,
            "status": status.as_u16(),
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.public_message(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(format!("JSON parsing error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalApi(format!("HTTP request failed: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AppError::AuthError
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

// Helper conversion functions
impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn phonepe(msg: impl Into<String>) -> Self {
        AppError::PhonePeError(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        AppError::StoreError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_status_codes() {
        assert_eq!(AppError::MissingTransactionId.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::AuthError.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::phonepe("down").status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::store("x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::RouteNotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn public_message_hides_internal_detail() {
        let err = AppError::store("connection reset by 10.0.0.7:27017");
        assert_eq!(err.public_message(), "Storage error");

        let err = AppError::Internal("thread 'main' panicked at src/main.rs:1".into());
        assert!(!err.public_message().contains("src/main.rs"));
    }

    #[tokio::test]
    async fn response_body_has_no_stack_field() {
        let response = AppError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["status"], 500);
        assert!(json.get("stack").is_none());
        assert!(!json["message"].as_str().unwrap().contains("boom"));
    }
}
