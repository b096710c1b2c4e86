//! yt-dlp media source.
//!
//! Metadata comes from `yt-dlp --dump-single-json`; streams are read from
//! `yt-dlp -f <format> -o -` stdout so nothing touches disk before the
//! stager writes it.
//!
//! Installation:
//! - `pipx install yt-dlp` or the distribution package
//! - https://github.com/yt-dlp/yt-dlp

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use {
    async_trait::async_trait,
    serde::Deserialize,
    tokio::process::Command,
    tracing::debug,
};

use {
    super::{FormatDescriptor, MediaMetadata, MediaSource, MediaStream, youtube},
    crate::{
        error::{SourceError, stderr_tail},
        tools,
    },
};

/// Binary name for yt-dlp.
const BINARY_NAME: &str = "yt-dlp";

/// yt-dlp backed [`MediaSource`] for YouTube links.
#[derive(Clone, Debug, Default)]
pub struct YtDlpSource {
    binary: Option<PathBuf>,
}

impl YtDlpSource {
    #[must_use]
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self { binary }
    }

    /// Resolve the binary from an explicit path or PATH.
    #[must_use]
    pub fn detect(config_path: Option<&str>) -> Self {
        Self::new(tools::find_binary(BINARY_NAME, config_path))
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    #[must_use]
    pub fn binary_path(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    fn binary(&self) -> Result<&PathBuf, SourceError> {
        self.binary
            .as_ref()
            .ok_or(SourceError::ToolMissing { tool: BINARY_NAME })
    }

    fn ensure_valid(&self, identifier: &str) -> Result<(), SourceError> {
        if self.validate(identifier) {
            Ok(())
        } else {
            Err(SourceError::invalid_identifier(identifier))
        }
    }
}

#[async_trait]
impl MediaSource for YtDlpSource {
    fn validate(&self, identifier: &str) -> bool {
        youtube::is_video_url(identifier)
    }

    async fn fetch_metadata(&self, identifier: &str) -> Result<MediaMetadata, SourceError> {
        self.ensure_valid(identifier)?;
        let binary = self.binary()?;

        let output = Command::new(binary)
            .args([
                "--dump-single-json",
                "--no-playlist",
                "--no-warnings",
                "--skip-download",
            ])
            .arg(identifier.trim())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SourceError::external("failed to execute yt-dlp", e))?;

        if !output.status.success() {
            return Err(SourceError::ProcessFailed {
                tool: BINARY_NAME,
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr, 400),
            });
        }

        let metadata = parse_info_json(&output.stdout)?;
        debug!(
            title = %metadata.title,
            formats = metadata.formats.len(),
            "yt-dlp metadata fetched"
        );
        Ok(metadata)
    }

    async fn open_stream(
        &self,
        identifier: &str,
        format: &FormatDescriptor,
    ) -> Result<MediaStream, SourceError> {
        self.ensure_valid(identifier)?;
        let binary = self.binary()?;

        let child = Command::new(binary)
            .arg("--format")
            .arg(&format.id)
            .args([
                "--output",
                "-",
                "--no-playlist",
                "--no-part",
                "--quiet",
                "--no-warnings",
                "--no-progress",
            ])
            .arg(identifier.trim())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SourceError::external("failed to start yt-dlp", e))?;

        debug!(format_id = %format.id, "yt-dlp stream opened");
        MediaStream::from_process(BINARY_NAME, child)
    }
}

// ── yt-dlp JSON output ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct InfoJson {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    formats: Vec<FormatJson>,
}

#[derive(Debug, Deserialize)]
struct FormatJson {
    format_id: String,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    format_note: Option<String>,
    #[serde(default)]
    quality: Option<f64>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    tbr: Option<f64>,
    #[serde(default)]
    abr: Option<f64>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    filesize: Option<u64>,
    #[serde(default)]
    filesize_approx: Option<u64>,
    #[serde(default)]
    protocol: Option<String>,
}

impl From<FormatJson> for FormatDescriptor {
    fn from(f: FormatJson) -> Self {
        Self {
            id: f.format_id,
            container: f.ext,
            quality_label: f.format_note,
            rank: f.quality,
            height: f.height,
            total_bitrate: f.tbr,
            audio_bitrate: f.abr,
            video_codec: f.vcodec,
            audio_codec: f.acodec,
            filesize: f.filesize.or(f.filesize_approx),
        }
    }
}

/// Parse `--dump-single-json` output.
///
/// Storyboards (no audio and no video) and manifest-only formats that cannot
/// be piped to stdout are dropped; the remaining order is preserved.
fn parse_info_json(raw: &[u8]) -> Result<MediaMetadata, SourceError> {
    let info: InfoJson = serde_json::from_slice(raw)
        .map_err(|e| SourceError::external("failed to parse yt-dlp JSON output", e))?;

    let formats = info
        .formats
        .into_iter()
        .filter(|f| !matches!(f.protocol.as_deref(), Some("mhtml")))
        .map(FormatDescriptor::from)
        .filter(|f| f.has_video() || f.has_audio())
        .collect();

    Ok(MediaMetadata {
        title: info
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string()),
        formats,
    })
}
