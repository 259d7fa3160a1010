use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RelayError};

/// Media selected for a streaming download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaKind {
    /// Best available combined quality
    #[default]
    Video,
    /// Audio only, transcoded to MP3
    Audio,
}

impl MediaKind {
    /// Map the `type` query value; only "audio" selects audio, anything else is video
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("audio") => MediaKind::Audio,
            _ => MediaKind::Video,
        }
    }

    /// Declared content type of the relayed body.
    ///
    /// Video is always reported as MP4 even when the tool streams another
    /// container such as WebM or MKV.
    pub fn content_type(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio/mpeg",
            MediaKind::Video => "video/mp4",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Audio => "mp3",
            MediaKind::Video => "mp4",
        }
    }
}

/// A validated download or metadata request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub url: String,
    pub kind: MediaKind,
}

impl ExtractionRequest {
    /// Build a request, rejecting an absent or empty locator before any process work
    pub fn new(url: Option<&str>, kind: MediaKind) -> Result<Self> {
        match url {
            Some(url) if !url.is_empty() => Ok(Self {
                url: url.to_string(),
                kind,
            }),
            _ => Err(RelayError::InvalidInput("url parameter is required".to_string())),
        }
    }
}

/// Projection of the tool's metadata document returned by `/info`.
///
/// Values are passed through untyped; fields the tool omits stay `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: Value,
    pub thumbnail: Value,
    pub duration: Value,
    pub platform: Value,
}

impl MediaInfo {
    /// Pick the exposed fields out of a `--dump-json` document
    pub fn from_document(document: &Value) -> Self {
        let field = |key: &str| document.get(key).cloned().unwrap_or(Value::Null);

        Self {
            title: field("title"),
            thumbnail: field("thumbnail"),
            duration: field("duration_string"),
            platform: field("extractor_key"),
        }
    }
}
