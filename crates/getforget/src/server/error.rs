//! JSON error responses for the HTTP adapter

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ForgetError;

/// Errors a handler can return, rendered as `{"error": {"type", "message"}}`
#[derive(Debug)]
pub enum ApiError {
    /// Malformed body or missing parameter
    BadRequest { error_type: &'static str, message: String },
    NotFound(String),
    Forget(ForgetError),
}

impl ApiError {
    pub fn bad_request(error_type: &'static str, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            error_type,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forget(ForgetError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Forget(ForgetError::NoKeywords) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Forget(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest { error_type, .. } => error_type,
            ApiError::NotFound(_) => "not_found",
            ApiError::Forget(ForgetError::InvalidInput(_)) => "invalid_request",
            ApiError::Forget(ForgetError::NoKeywords) => "no_keywords",
            ApiError::Forget(ForgetError::Tokenizer(_)) => "tokenizer_error",
            ApiError::Forget(_) => "internal_error",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest { message, .. } => message.clone(),
            ApiError::NotFound(key) => format!("No memory for '{key}'"),
            ApiError::Forget(e) => e.to_string(),
        }
    }
}

impl From<ForgetError> for ApiError {
    fn from(e: ForgetError) -> Self {
        ApiError::Forget(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_client_error() {
            tracing::debug!(status = status.as_u16(), "Rejected request: {message}");
        } else {
            tracing::error!(status = status.as_u16(), "Request failed: {message}");
        }
        create_error_response(status, self.error_type(), &message)
    }
}

/// Create a JSON error response
pub fn create_error_response(status: StatusCode, error_type: &str, message: &str) -> Response {
    let body = serde_json::json!({
        "error": {
            "type": error_type,
            "message": message,
        }
    });
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(ForgetError::InvalidInput("empty".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ForgetError::NoKeywords).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(ForgetError::Tokenizer("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            ApiError::from(ForgetError::Tokenizer("down".into())).error_type(),
            "tokenizer_error"
        );
        assert_eq!(
            ApiError::bad_request("missing_parameter", "q is required").error_type(),
            "missing_parameter"
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::NotFound("weather".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["type"], "not_found");
        assert_eq!(json["error"]["message"], "No memory for 'weather'");
    }
}
