use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::RelayError;

/// `/info` error body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Error rendered as a JSON body, used by `/info`
#[derive(Debug)]
pub struct JsonError(pub RelayError);

/// Error rendered as plain text, used by `/download`
#[derive(Debug)]
pub struct PlainError(pub RelayError);

impl From<RelayError> for JsonError {
    fn from(e: RelayError) -> Self {
        Self(e)
    }
}

impl From<RelayError> for PlainError {
    fn from(e: RelayError) -> Self {
        Self(e)
    }
}

/// Underlying text for operators: the tool's own message when there is one
fn details(e: &RelayError) -> String {
    match e {
        RelayError::ExtractionFailed(msg)
        | RelayError::ProcessStartFailed(msg)
        | RelayError::PipeCreationFailed(msg) => msg.clone(),
        other => other.to_string(),
    }
}

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            RelayError::InvalidInput(_) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Please provide the url parameter".to_string(),
                    details: None,
                },
            ),
            e => {
                tracing::error!("Metadata extraction error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Unable to parse link".to_string(),
                        details: Some(details(e)),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for PlainError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            RelayError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Missing URL".to_string()),
            RelayError::PipeCreationFailed(msg) => {
                tracing::error!("Pipe creation failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "System Error: Pipe creation failed".to_string(),
                )
            }
            e => {
                tracing::error!("Download error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Download Error: {}", details(e)),
                )
            }
        };

        (status, message).into_response()
    }
}
