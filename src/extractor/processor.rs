use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ExtractorConfig;
use crate::error::{Result, RelayError};
use super::{ExtractorCommand, ExtractorCommandBuilder, ExtractorTrait, MediaStream, ProcessExit};

/// Bytes of stderr kept from a streaming invocation
const STDERR_TAIL_LIMIT: usize = 8 * 1024;

/// Concrete implementation of the extractor (yt-dlp subprocess)
pub struct YtDlpExtractor {
    config: ExtractorConfig,
    command_builder: ExtractorCommandBuilder,
}

impl YtDlpExtractor {
    /// Create a new extractor implementation
    pub fn new(config: ExtractorConfig) -> Self {
        let command_builder = ExtractorCommandBuilder::new(config.extra_args.clone());

        Self {
            config,
            command_builder,
        }
    }

    fn command(&self, command: &ExtractorCommand) -> Command {
        debug!("Executing extraction command: {} {:?}", self.config.binary_path, command.args);
        debug!("Description: {}", command.description);

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ExtractorTrait for YtDlpExtractor {
    async fn run_capture(&self, command: &ExtractorCommand) -> Result<Vec<u8>> {
        let output = self.command(command).output().await
            .map_err(|e| RelayError::ExtractionFailed(format!("Failed to execute extraction tool: {}", e)))?;

        if !output.status.success() {
            let exit = ProcessExit::failure(
                output.status.code(),
                String::from_utf8_lossy(&output.stderr),
            );
            return Err(RelayError::ExtractionFailed(exit.describe()));
        }

        Ok(output.stdout)
    }

    async fn run_streaming(&self, command: &ExtractorCommand) -> Result<MediaStream> {
        let mut child = self.command(command).spawn()
            .map_err(|e| RelayError::ProcessStartFailed(e.to_string()))?;

        // Dropping the child here kills the process before the error is reported
        let stdout = child.stdout.take()
            .ok_or_else(|| RelayError::PipeCreationFailed("stdout was not captured".to_string()))?;
        let stderr = child.stderr.take().map(drain_stderr);

        info!("Started {} (pid {:?})", command.description, child.id());

        let exit = async move {
            let status = child.wait().await;
            let stderr = collect_stderr(stderr).await;

            match status {
                Ok(status) if status.success() => ProcessExit {
                    success: true,
                    code: status.code(),
                    stderr,
                },
                Ok(status) => ProcessExit::failure(status.code(), stderr),
                Err(e) => ProcessExit::failure(None, format!("Failed to wait for extraction tool: {}", e)),
            }
        };

        Ok(MediaStream::new(stdout, exit))
    }

    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting extraction tool version information");

        let output = self.command(&self.command_builder.version_check()).output().await
            .map_err(|e| RelayError::ProcessStartFailed(format!("Extraction tool not found: {}", e)))?;

        if output.status.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            Ok(first_line.trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(RelayError::ExtractionFailed(format!("Extraction tool version check failed: {}", stderr)))
        }
    }
}

/// Read stderr concurrently so the tool never blocks on a full pipe; keeps the tail
fn drain_stderr<R>(mut stderr: R) -> JoinHandle<String>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut tail: Vec<u8> = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            match stderr.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    tail.extend_from_slice(&chunk[..n]);
                    if tail.len() > STDERR_TAIL_LIMIT {
                        let excess = tail.len() - STDERR_TAIL_LIMIT;
                        tail.drain(..excess);
                    }
                }
                Err(e) => {
                    warn!("Failed to read extraction tool stderr: {}", e);
                    break;
                }
            }
        }

        String::from_utf8_lossy(&tail).into_owned()
    })
}

/// A failed drain task is logged and treated as empty stderr
async fn collect_stderr(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(handle) => handle.await.unwrap_or_else(|e| {
            warn!("Extraction tool stderr reader did not finish: {}", e);
            String::new()
        }),
        None => String::new(),
    }
}
