use bytes::{Bytes, BytesMut};
use futures_util::future::{self, BoxFuture};
use futures_util::stream::{self, BoxStream, StreamExt};
use std::io;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::error::{Result, RelayError};
use crate::extractor::{ExtractorCommandBuilder, ExtractorTrait, ProcessExit};
use crate::models::{ExtractionRequest, MediaKind};

/// A download whose headers are fixed and whose body is still being produced
pub struct RelayedMedia {
    pub content_type: &'static str,
    pub filename: String,
    /// Owns the tool process; dropping it before the end kills the tool
    pub body: BoxStream<'static, io::Result<Bytes>>,
}

impl RelayedMedia {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }
}

impl std::fmt::Debug for RelayedMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayedMedia")
            .field("content_type", &self.content_type)
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

/// Suggested filename, stamped with the request time
pub fn download_filename(kind: MediaKind) -> String {
    format!("download_{}.{}", chrono::Utc::now().timestamp(), kind.extension())
}

/// Copies the tool's stdout to a response body as it is produced
pub struct StreamRelay {
    extractor: Arc<dyn ExtractorTrait>,
    command_builder: ExtractorCommandBuilder,
    buffer_size: usize,
}

impl StreamRelay {
    pub fn new(
        extractor: Arc<dyn ExtractorTrait>,
        command_builder: ExtractorCommandBuilder,
        buffer_size: usize,
    ) -> Self {
        Self {
            extractor,
            command_builder,
            buffer_size: buffer_size.max(1),
        }
    }

    /// Start the tool and wait for its first output chunk.
    ///
    /// Every failure detectable before the first byte is returned as an error,
    /// so headers are only ever produced for a stream that has started.
    pub async fn relay_stream(&self, request: &ExtractionRequest) -> Result<RelayedMedia> {
        if request.url.is_empty() {
            return Err(RelayError::InvalidInput("url parameter is required".to_string()));
        }

        let command = self.command_builder.stream(&request.url, request.kind);
        let (mut stdout, exit) = self.extractor.run_streaming(&command).await?.into_parts();

        let mut first = BytesMut::with_capacity(self.buffer_size);
        let read = stdout.read_buf(&mut first).await?;

        let body = if read == 0 {
            let exit = exit.await;
            if !exit.success {
                warn!("{} for {} exited before producing output: {}", command.description, request.url, exit.describe());
                return Err(RelayError::ExtractionFailed(exit.describe()));
            }
            info!("{} for {} completed with no output", command.description, request.url);
            stream::empty().boxed()
        } else {
            debug!("First {} bytes received for {}", read, request.url);
            let head = stream::once(future::ready(Ok(first.freeze())));
            let rest = ReaderStream::with_capacity(stdout, self.buffer_size);
            head.chain(rest)
                .chain(report_exit(exit, command.description.clone(), request.url.clone()))
                .boxed()
        };

        Ok(RelayedMedia {
            content_type: request.kind.content_type(),
            filename: download_filename(request.kind),
            body,
        })
    }
}

/// Empty stream that awaits the process once stdout has closed.
///
/// A failure at this point only gets logged: the client already has a
/// 200 response and the body simply ends.
fn report_exit(
    exit: BoxFuture<'static, ProcessExit>,
    description: String,
    url: String,
) -> impl futures_util::Stream<Item = io::Result<Bytes>> {
    stream::once(async move {
        let exit = exit.await;
        if exit.success {
            info!("{} for {} completed", description, url);
        } else {
            warn!("{} for {} failed mid-stream: {}", description, url, exit.describe());
        }
    })
    .filter_map(|()| future::ready(None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{MediaStream, MockExtractorTrait};
    use futures_util::TryStreamExt;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn relay(mock: MockExtractorTrait) -> StreamRelay {
        StreamRelay::new(Arc::new(mock), ExtractorCommandBuilder::default(), 4)
    }

    fn request(kind: MediaKind) -> ExtractionRequest {
        ExtractionRequest::new(Some("https://example.com/v"), kind).unwrap()
    }

    async fn collect(media: RelayedMedia) -> Vec<u8> {
        media.body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_audio_headers_and_body() {
        let mut mock = MockExtractorTrait::new();
        mock.expect_run_streaming()
            .withf(|cmd| cmd.args.contains(&"-x".to_string()))
            .times(1)
            .returning(|_| {
                let reader = tokio_test::io::Builder::new()
                    .read(b"ID3")
                    .read(b"-frames")
                    .build();
                Ok(MediaStream::new(reader, future::ready(ProcessExit::success())))
            });

        let media = relay(mock).relay_stream(&request(MediaKind::Audio)).await.unwrap();
        assert_eq!(media.content_type, "audio/mpeg");
        assert!(media.filename.starts_with("download_"));
        assert!(media.filename.ends_with(".mp3"));
        assert_eq!(media.content_disposition(), format!("attachment; filename={}", media.filename));
        assert_eq!(collect(media).await, b"ID3-frames");
    }

    #[tokio::test]
    async fn test_video_defaults() {
        let mut mock = MockExtractorTrait::new();
        mock.expect_run_streaming()
            .withf(|cmd| cmd.args.contains(&"best".to_string()))
            .times(1)
            .returning(|_| {
                let reader = tokio_test::io::Builder::new().read(b"\x00\x00\x00\x18ftyp").build();
                Ok(MediaStream::new(reader, future::ready(ProcessExit::success())))
            });

        let media = relay(mock).relay_stream(&request(MediaKind::Video)).await.unwrap();
        assert_eq!(media.content_type, "video/mp4");
        assert!(media.filename.ends_with(".mp4"));
        assert_eq!(collect(media).await, b"\x00\x00\x00\x18ftyp");
    }

    #[tokio::test]
    async fn test_mid_stream_failure_keeps_partial_body() {
        let mut mock = MockExtractorTrait::new();
        mock.expect_run_streaming().times(1).returning(|_| {
            let reader = tokio_test::io::Builder::new().read(b"partial-bytes").build();
            Ok(MediaStream::new(reader, future::ready(ProcessExit::failure(Some(1), "ERROR: connection reset"))))
        });

        let media = relay(mock).relay_stream(&request(MediaKind::Video)).await.unwrap();
        assert_eq!(collect(media).await, b"partial-bytes");
    }

    #[tokio::test]
    async fn test_failure_before_output_is_an_error() {
        let mut mock = MockExtractorTrait::new();
        mock.expect_run_streaming().times(1).returning(|_| {
            let reader = tokio_test::io::Builder::new().build();
            Ok(MediaStream::new(reader, future::ready(ProcessExit::failure(Some(1), "ERROR: Unsupported URL"))))
        });

        match relay(mock).relay_stream(&request(MediaKind::Audio)).await {
            Err(RelayError::ExtractionFailed(details)) => assert_eq!(details, "ERROR: Unsupported URL"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_clean_exit_without_output_is_empty_body() {
        let mut mock = MockExtractorTrait::new();
        mock.expect_run_streaming().times(1).returning(|_| {
            let reader = tokio_test::io::Builder::new().build();
            Ok(MediaStream::new(reader, future::ready(ProcessExit::success())))
        });

        let media = relay(mock).relay_stream(&request(MediaKind::Video)).await.unwrap();
        assert!(collect(media).await.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_errors_propagate() {
        let mut mock = MockExtractorTrait::new();
        mock.expect_run_streaming()
            .times(1)
            .returning(|_| Err(RelayError::ProcessStartFailed("No such file or directory".to_string())));

        assert!(matches!(
            relay(mock).relay_stream(&request(MediaKind::Video)).await,
            Err(RelayError::ProcessStartFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_dropping_body_drops_process() {
        struct Guard(Arc<AtomicBool>);
        impl Drop for Guard {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicBool::new(false));
        let flag = dropped.clone();

        let mut mock = MockExtractorTrait::new();
        mock.expect_run_streaming().times(1).returning(move |_| {
            let guard = Guard(flag.clone());
            let reader = tokio_test::io::Builder::new().read(b"first").build();
            Ok(MediaStream::new(reader, async move {
                let _guard = guard;
                future::pending::<()>().await;
                ProcessExit::success()
            }))
        });

        let relay = StreamRelay::new(Arc::new(mock), ExtractorCommandBuilder::default(), 64);
        let mut media = relay.relay_stream(&request(MediaKind::Video)).await.unwrap();
        assert_eq!(media.body.next().await.unwrap().unwrap(), Bytes::from_static(b"first"));
        assert!(!dropped.load(Ordering::SeqCst));

        drop(media);
        assert!(dropped.load(Ordering::SeqCst));
    }
}
