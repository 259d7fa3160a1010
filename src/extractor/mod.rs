// Extraction tool abstraction
//
// The relay never talks to yt-dlp directly; it goes through ExtractorTrait:
// - Commands: argument construction for each invocation mode
// - Processor: tokio::process backed implementation
//
// Tests substitute the trait with mocks or point the processor at fake scripts.

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio::io::AsyncRead;

pub use commands::*;
pub use processor::*;

use crate::config::ExtractorConfig;
use crate::error::Result;

/// Main trait for extraction tool invocations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtractorTrait: Send + Sync {
    /// Run to completion and return the captured stdout
    async fn run_capture(&self, command: &ExtractorCommand) -> Result<Vec<u8>>;

    /// Start the tool and hand back its stdout while it is still running
    async fn run_streaming(&self, command: &ExtractorCommand) -> Result<MediaStream>;

    /// Get extraction tool version information
    async fn get_version_info(&self) -> Result<String>;
}

/// How a tool invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    pub success: bool,
    pub code: Option<i32>,
    /// Tail of the tool's stderr
    pub stderr: String,
}

impl ProcessExit {
    pub fn success() -> Self {
        Self {
            success: true,
            code: Some(0),
            stderr: String::new(),
        }
    }

    pub fn failure<S: Into<String>>(code: Option<i32>, stderr: S) -> Self {
        Self {
            success: false,
            code,
            stderr: stderr.into(),
        }
    }

    /// Diagnostic text: stderr when the tool wrote any, the exit status otherwise
    pub fn describe(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.code {
            Some(code) => format!("exit status: {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Output of a running tool invocation.
///
/// `exit` owns the process; dropping it before completion kills the tool.
pub struct MediaStream {
    stdout: Box<dyn AsyncRead + Send + Unpin>,
    exit: BoxFuture<'static, ProcessExit>,
}

impl MediaStream {
    pub fn new<R, F>(stdout: R, exit: F) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        F: Future<Output = ProcessExit> + Send + 'static,
    {
        Self {
            stdout: Box::new(stdout),
            exit: Box::pin(exit),
        }
    }

    pub fn into_parts(self) -> (Box<dyn AsyncRead + Send + Unpin>, BoxFuture<'static, ProcessExit>) {
        (self.stdout, self.exit)
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream").finish_non_exhaustive()
    }
}

/// Factory for creating extractor instances
pub struct ExtractorFactory;

impl ExtractorFactory {
    /// Create the default extractor implementation (yt-dlp subprocess)
    pub fn create_extractor(config: ExtractorConfig) -> Arc<dyn ExtractorTrait> {
        Arc::new(processor::YtDlpExtractor::new(config))
    }
}
