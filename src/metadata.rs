use std::sync::Arc;
use std::time::Duration;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Result, RelayError};
use crate::extractor::{ExtractorCommandBuilder, ExtractorTrait};
use crate::models::MediaInfo;

/// Resolves a locator into the `/info` projection of the tool's JSON dump
pub struct MetadataFetcher {
    extractor: Arc<dyn ExtractorTrait>,
    command_builder: ExtractorCommandBuilder,
    timeout: Option<Duration>,
}

impl MetadataFetcher {
    pub fn new(
        extractor: Arc<dyn ExtractorTrait>,
        command_builder: ExtractorCommandBuilder,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            extractor,
            command_builder,
            timeout,
        }
    }

    pub async fn fetch_metadata(&self, url: &str) -> Result<MediaInfo> {
        if url.is_empty() {
            return Err(RelayError::InvalidInput("url parameter is required".to_string()));
        }

        info!("Fetching metadata for {}", url);
        let command = self.command_builder.metadata(url);

        // On timeout the capture future is dropped, which kills the tool
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.extractor.run_capture(&command))
                .await
                .map_err(|_| {
                    RelayError::ExtractionFailed(format!(
                        "Extraction tool timed out after {}s",
                        limit.as_secs()
                    ))
                })??,
            None => self.extractor.run_capture(&command).await?,
        };

        // Unparseable output degrades to an all-null projection
        let document = serde_json::from_slice::<Value>(&output).unwrap_or_else(|e| {
            warn!("Failed to parse metadata for {}: {}", url, e);
            Value::Null
        });

        Ok(MediaInfo::from_document(&document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::MockExtractorTrait;
    use serde_json::json;

    fn fetcher(mock: MockExtractorTrait, timeout: Option<Duration>) -> MetadataFetcher {
        MetadataFetcher::new(Arc::new(mock), ExtractorCommandBuilder::default(), timeout)
    }

    #[tokio::test]
    async fn test_empty_url_spawns_nothing() {
        let mut mock = MockExtractorTrait::new();
        mock.expect_run_capture().times(0);

        let result = fetcher(mock, None).fetch_metadata("").await;
        assert!(matches!(result, Err(RelayError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_projects_fields() {
        let mut mock = MockExtractorTrait::new();
        mock.expect_run_capture()
            .withf(|cmd| cmd.args.contains(&"--dump-json".to_string())
                && cmd.args.last().map(String::as_str) == Some("https://example.com/v"))
            .times(1)
            .returning(|_| {
                Ok(br#"{"title":"Song","thumbnail":"https://i/1.jpg","duration_string":"3:20","extractor_key":"Youtube","id":"x"}"#.to_vec())
            });

        let info = fetcher(mock, None).fetch_metadata("https://example.com/v").await.unwrap();
        assert_eq!(info.title, json!("Song"));
        assert_eq!(info.thumbnail, json!("https://i/1.jpg"));
        assert_eq!(info.duration, json!("3:20"));
        assert_eq!(info.platform, json!("Youtube"));
    }

    #[tokio::test]
    async fn test_malformed_output_yields_nulls() {
        let mut mock = MockExtractorTrait::new();
        mock.expect_run_capture()
            .times(1)
            .returning(|_| Ok(b"not json at all".to_vec()));

        let info = fetcher(mock, None).fetch_metadata("https://example.com/v").await.unwrap();
        assert_eq!(info, MediaInfo::default());
    }

    #[tokio::test]
    async fn test_extraction_failure_propagates() {
        let mut mock = MockExtractorTrait::new();
        mock.expect_run_capture()
            .times(1)
            .returning(|_| Err(RelayError::ExtractionFailed("ERROR: Unsupported URL".to_string())));

        match fetcher(mock, None).fetch_metadata("https://example.com/v").await {
            Err(RelayError::ExtractionFailed(details)) => assert_eq!(details, "ERROR: Unsupported URL"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
