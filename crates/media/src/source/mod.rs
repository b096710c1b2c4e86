//! Media source adapters.
//!
//! A [`MediaSource`] turns a remote identifier (a video URL) into metadata
//! and a byte stream. The pipeline only sees this trait; [`ytdlp::YtDlpSource`]
//! is the production implementation.

pub mod youtube;
pub mod ytdlp;

use std::time::Duration;

use {
    async_trait::async_trait,
    tokio::{io::AsyncRead, process::Child},
};

use crate::error::{SourceError, stderr_tail};

/// Title and downloadable formats of one remote video.
#[derive(Debug, Clone, Default)]
pub struct MediaMetadata {
    pub title: String,
    /// In the order the source returned them.
    pub formats: Vec<FormatDescriptor>,
}

/// One downloadable rendition as reported by the source.
///
/// Codec fields hold `"none"` when the source states the stream is absent;
/// `None` means unknown and is treated as present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatDescriptor {
    pub id: String,
    /// Container / file extension (`mp4`, `webm`, `m4a`, ...).
    pub container: Option<String>,
    /// Human label such as `"720p"` or `"high"`.
    pub quality_label: Option<String>,
    /// Explicit rank supplied by the source; higher is better.
    pub rank: Option<f64>,
    pub height: Option<u32>,
    /// Total bitrate in kbit/s.
    pub total_bitrate: Option<f64>,
    /// Audio bitrate in kbit/s.
    pub audio_bitrate: Option<f64>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub filesize: Option<u64>,
}

impl FormatDescriptor {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn has_video(&self) -> bool {
        self.video_codec.as_deref() != Some("none")
    }

    #[must_use]
    pub fn has_audio(&self) -> bool {
        self.audio_codec.as_deref() != Some("none")
    }

    /// Audio stream explicitly present and video explicitly absent.
    #[must_use]
    pub fn is_audio_only(&self) -> bool {
        !self.has_video() && self.has_audio() && self.audio_codec.is_some()
    }
}

/// Resolve remote identifiers into metadata and byte streams.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Syntactic check only; never touches the network.
    fn validate(&self, identifier: &str) -> bool;

    async fn fetch_metadata(&self, identifier: &str) -> Result<MediaMetadata, SourceError>;

    async fn open_stream(
        &self,
        identifier: &str,
        format: &FormatDescriptor,
    ) -> Result<MediaStream, SourceError>;
}

/// A readable media stream, optionally backed by a child process whose exit
/// status decides whether the bytes read were complete.
pub struct MediaStream {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    process: Option<(&'static str, Child)>,
}

impl MediaStream {
    /// Wrap an in-memory or network reader; `finish` always succeeds.
    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            process: None,
        }
    }

    /// Wrap a child process whose stdout carries the media bytes.
    ///
    /// The child must have been spawned with piped stdout and stderr.
    pub(crate) fn from_process(tool: &'static str, mut child: Child) -> Result<Self, SourceError> {
        let stdout = child.stdout.take().ok_or_else(|| SourceError::ProcessFailed {
            tool,
            status: "spawned without stdout".into(),
            stderr: String::new(),
        })?;
        Ok(Self {
            reader: Box::new(stdout),
            process: Some((tool, child)),
        })
    }

    pub fn reader(&mut self) -> &mut (dyn AsyncRead + Send + Unpin) {
        self.reader.as_mut()
    }

    /// Wait for the backing process (if any) and report whether it succeeded.
    ///
    /// Bounded by `grace` since stdout is already drained.
    pub async fn finish(self, grace: Duration) -> Result<(), SourceError> {
        let Some((tool, child)) = self.process else {
            return Ok(());
        };
        drop(self.reader);

        let output = tokio::time::timeout(grace, child.wait_with_output())
            .await
            .map_err(|_| SourceError::Timeout(grace))?
            .map_err(|e| SourceError::external(format!("waiting for {tool}"), e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(SourceError::ProcessFailed {
                tool,
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr, 400),
            })
        }
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("process", &self.process.as_ref().map(|(tool, _)| *tool))
            .finish_non_exhaustive()
    }
}
