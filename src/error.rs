// Error handling module
// Client error taxonomy and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Invalid client configuration, detected before any network call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A required setting is missing or empty
    #[error("invalid watsonx.ai configuration: {0} must be set")]
    Missing(&'static str),

    /// The API endpoint is not an absolute http(s) URL
    #[error("invalid watsonx.ai configuration: endpoint {url:?} is not a valid URL: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The underlying HTTP transport could not be built
    #[error("failed to create HTTP client: {0}")]
    Transport(String),
}

/// IAM token exchange failures
#[derive(Error, Debug)]
pub enum AuthError {
    /// Transport failure talking to the token endpoint
    #[error("token exchange network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Token endpoint answered with a non-success status
    #[error("token exchange rejected: status {status} - {body}")]
    Rejected { status: u16, body: String },

    /// Token endpoint answered 200 with an unusable body
    #[error("failed to decode token response: {0}")]
    Decode(String),
}

impl AuthError {
    /// HTTP status returned by the token endpoint, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Generation request failures
#[derive(Error, Debug)]
pub enum RequestError {
    /// Request rejected locally before being sent
    #[error("invalid generation request: {0}")]
    Invalid(String),

    /// Transport failure sending the request or reading the response
    #[error("error making request: {0}")]
    Transport(#[source] reqwest::Error),

    /// Non-success status from the generation endpoint
    #[error("request failed, status code: {status}, response: {body}")]
    Status { status: u16, body: String },

    /// Success status with a body that is not a result envelope
    #[error("error decoding response: {0}")]
    Decode(String),

    /// Result envelope without any entries
    #[error("no generated text found in response")]
    Empty,
}

impl RequestError {
    /// HTTP status returned by the generation endpoint, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Mid-stream failure; chunks already yielded stand
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("error reading stream: {0}")]
    Read(#[source] reqwest::Error),
}

/// Any failure surfaced by the generation client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// API errors returned by the HTTP boundary
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation error
    #[error("{0}")]
    ValidationError(String),

    /// Upstream generation failed
    #[error("Failed to generate text: {0}")]
    GenerationError(#[from] ClientError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::GenerationError(ClientError::Request(RequestError::Invalid(_))) => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            ApiError::GenerationError(err) => {
                tracing::error!(error = %err, "Generation failed");
                let error_type = match err {
                    ClientError::Config(_) => "config_error",
                    ClientError::Auth(_) => "auth_error",
                    ClientError::Request(_) => "request_error",
                    ClientError::Stream(_) => "stream_error",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, error_type)
            }
        };

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": error_type,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::Missing("api_key");
        assert_eq!(
            err.to_string(),
            "invalid watsonx.ai configuration: api_key must be set"
        );
    }

    #[test]
    fn test_request_error_status() {
        let err = RequestError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.status(), Some(500));
        assert_eq!(
            err.to_string(),
            "request failed, status code: 500, response: boom"
        );
        assert_eq!(RequestError::Empty.status(), None);
    }

    #[test]
    fn test_auth_error_status() {
        let err = AuthError::Rejected {
            status: 401,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(401));
        assert_eq!(AuthError::Decode("eof".to_string()).status(), None);
    }

    #[test]
    fn test_client_error_wraps_auth() {
        let err: ClientError = AuthError::Rejected {
            status: 401,
            body: "bad key".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "authentication failed: token exchange rejected: status 401 - bad key"
        );
    }

    #[tokio::test]
    async fn test_validation_error_response() {
        let err = ApiError::ValidationError("Missing field".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generation_error_response() {
        let err = ApiError::GenerationError(RequestError::Empty.into());
        assert_eq!(
            err.to_string(),
            "Failed to generate text: no generated text found in response"
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_upstream_status_maps_to_server_error() {
        // Upstream 401 is still an internal failure from the caller's view
        let err = ApiError::GenerationError(
            RequestError::Status {
                status: 401,
                body: "expired".to_string(),
            }
            .into(),
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_invalid_request_maps_to_bad_request() {
        let err = ApiError::GenerationError(
            RequestError::Invalid("model_id must not be empty".to_string()).into(),
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
