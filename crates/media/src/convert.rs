//! Out-of-process audio extraction via ffmpeg.
//!
//! Installation:
//! - macOS: `brew install ffmpeg`
//! - Debian/Ubuntu: `apt install ffmpeg`

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use {async_trait::async_trait, tokio::process::Command, tracing::debug};

use crate::{
    error::{ConvertError, stderr_tail},
    tools,
};

/// Binary name for ffmpeg.
const BINARY_NAME: &str = "ffmpeg";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Audio extraction delegate.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Whether the delegate was found at startup.
    fn is_available(&self) -> bool;

    /// Container the converter writes (`mp3`, `m4a`, ...).
    fn target_container(&self) -> &str;

    /// Extract the audio track of `input` into `output`.
    ///
    /// Succeeds only when the delegate exits cleanly and `output` is non-empty.
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError>;
}

/// ffmpeg-backed [`Converter`].
#[derive(Clone, Debug)]
pub struct FfmpegConverter {
    binary: Option<PathBuf>,
    audio_container: String,
    audio_bitrate: String,
    timeout: Duration,
}

impl FfmpegConverter {
    #[must_use]
    pub fn new(
        binary: Option<PathBuf>,
        audio_container: impl Into<String>,
        audio_bitrate: impl Into<String>,
    ) -> Self {
        Self {
            binary,
            audio_container: audio_container.into(),
            audio_bitrate: audio_bitrate.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Resolve ffmpeg from an explicit path or PATH.
    #[must_use]
    pub fn detect(
        config_path: Option<&str>,
        audio_container: impl Into<String>,
        audio_bitrate: impl Into<String>,
    ) -> Self {
        Self::new(
            tools::find_binary(BINARY_NAME, config_path),
            audio_container,
            audio_bitrate,
        )
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    /// Encoder matching the target container; `None` lets ffmpeg choose.
    fn audio_codec(&self) -> Option<&'static str> {
        match self.audio_container.as_str() {
            "mp3" => Some("libmp3lame"),
            "m4a" | "aac" => Some("aac"),
            "ogg" | "opus" => Some("libopus"),
            _ => None,
        }
    }

    fn args(&self, input: &Path, output: &Path) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-nostdin",
            "-y",
            "-i",
        ]
        .into_iter()
        .map(Into::into)
        .collect();
        args.push(input.into());
        args.push("-vn".into());
        if let Some(codec) = self.audio_codec() {
            args.push("-c:a".into());
            args.push(codec.into());
        }
        if !self.audio_bitrate.is_empty() {
            args.push("-b:a".into());
            args.push(self.audio_bitrate.as_str().into());
        }
        args.push(output.into());
        args
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    fn target_container(&self) -> &str {
        &self.audio_container
    }

    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let binary = self.binary.as_ref().ok_or(ConvertError::Unavailable)?;

        let mut cmd = Command::new(binary);
        cmd.args(self.args(input, output));
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        debug!(input = %input.display(), output = %output.display(), "running ffmpeg");
        let result = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ConvertError::Timeout(self.timeout))?
            .map_err(ConvertError::Spawn)?;

        if !result.status.success() {
            return Err(ConvertError::ProcessFailed {
                status: result.status.to_string(),
                stderr: stderr_tail(&result.stderr, 400),
            });
        }

        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(ConvertError::EmptyOutput(output.to_path_buf())),
        }
    }
}
