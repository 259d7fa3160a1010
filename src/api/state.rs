use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::extractor::{ExtractorCommandBuilder, ExtractorTrait};
use crate::metadata::MetadataFetcher;
use crate::relay::StreamRelay;

/// Shared, read-only handler state
#[derive(Clone)]
pub struct AppState {
    pub metadata: Arc<MetadataFetcher>,
    pub relay: Arc<StreamRelay>,
}

impl AppState {
    pub fn new(config: &Config, extractor: Arc<dyn ExtractorTrait>) -> Self {
        let command_builder = ExtractorCommandBuilder::new(config.extractor.extra_args.clone());
        let timeout = config.extractor.metadata_timeout_secs.map(Duration::from_secs);

        Self {
            metadata: Arc::new(MetadataFetcher::new(
                extractor.clone(),
                command_builder.clone(),
                timeout,
            )),
            relay: Arc::new(StreamRelay::new(
                extractor,
                command_builder,
                config.extractor.stream_buffer_size,
            )),
        }
    }
}
