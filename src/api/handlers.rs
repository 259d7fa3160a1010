use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use crate::error::RelayError;
use crate::models::{ExtractionRequest, MediaInfo, MediaKind};

use super::error::{JsonError, PlainError};
use super::state::AppState;

pub const LIVENESS_MESSAGE: &str = "Service is running";

/// First value of `key` in a raw query string; repeated keys never reject the request
fn first_param(query: Option<&str>, key: &str) -> Option<String> {
    form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Query parameters for `/info`
#[derive(Debug)]
pub struct InfoQuery {
    /// Resource locator
    pub url: Option<String>,
}

impl InfoQuery {
    pub fn from_raw(query: Option<&str>) -> Self {
        Self {
            url: first_param(query, "url"),
        }
    }
}

/// Query parameters for `/download`
#[derive(Debug)]
pub struct DownloadQuery {
    /// Resource locator
    pub url: Option<String>,
    /// `audio` for MP3, anything else for video
    pub kind: Option<String>,
}

impl DownloadQuery {
    pub fn from_raw(query: Option<&str>) -> Self {
        Self {
            url: first_param(query, "url"),
            kind: first_param(query, "type"),
        }
    }
}

pub async fn health() -> &'static str {
    LIVENESS_MESSAGE
}

pub async fn get_info(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<MediaInfo>, JsonError> {
    let query = InfoQuery::from_raw(raw.as_deref());
    let request = ExtractionRequest::new(query.url.as_deref(), MediaKind::default())?;
    let info = state.metadata.fetch_metadata(&request.url).await?;
    Ok(Json(info))
}

pub async fn download(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Response, PlainError> {
    let query = DownloadQuery::from_raw(raw.as_deref());
    let kind = MediaKind::from_param(query.kind.as_deref());
    let request = ExtractionRequest::new(query.url.as_deref(), kind)?;

    let media = state.relay.relay_stream(&request).await?;

    let disposition = HeaderValue::from_str(&media.content_disposition())
        .map_err(|e| RelayError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    tracing::info!("Streaming {} as {}", request.url, media.filename);

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(media.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(media.body),
    )
        .into_response())
}
