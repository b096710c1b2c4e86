//! Local staging of downloaded media.
//!
//! Every staged file gets a collision-free name inside the staging directory
//! and is removed either explicitly via [`StagedFile::remove`] or, as a last
//! resort, when the handle is dropped.

use std::{
    io,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use {
    reelbot_common::types::MediaKind,
    tokio::{
        fs::OpenOptions,
        io::{AsyncReadExt, AsyncWriteExt},
    },
    tracing::{debug, warn},
};

use crate::{
    error::{SourceError, StageError},
    source::MediaStream,
};

const COPY_BUF_SIZE: usize = 64 * 1024;
const MAX_EXTENSION_LEN: usize = 8;
const DEFAULT_FINISH_GRACE: Duration = Duration::from_secs(30);

/// Owner of the staging directory.
#[derive(Debug, Clone)]
pub struct Stager {
    dir: PathBuf,
    finish_grace: Duration,
}

impl Stager {
    /// Ensure the staging directory exists. Safe to call on an existing one.
    pub async fn init(dir: impl Into<PathBuf>) -> Result<Self, StageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StageError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        debug!(dir = %dir.display(), "staging directory ready");
        Ok(Self {
            dir,
            finish_grace: DEFAULT_FINISH_GRACE,
        })
    }

    /// How long to wait for a source process after its stdout hits EOF.
    #[must_use]
    pub fn with_finish_grace(mut self, grace: Duration) -> Self {
        self.finish_grace = grace;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserve a unique path without creating the file.
    ///
    /// `extension` is sanitized; anything unusable falls back to the kind's
    /// default container.
    #[must_use]
    pub fn allocate(&self, kind: MediaKind, extension: Option<&str>) -> StagedFile {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let ext = extension
            .and_then(sanitize_extension)
            .unwrap_or_else(|| kind.default_extension().to_string());
        let name = format!("{millis}-{}.{ext}", uuid::Uuid::new_v4().simple());
        StagedFile {
            path: self.dir.join(name),
            kind,
            removed: false,
        }
    }

    /// Write `stream` to a fresh staged file.
    ///
    /// The partial file is removed on any failure. Read-side failures are
    /// reported as [`StageError::Source`], disk failures as
    /// [`StageError::Write`].
    pub async fn stage(
        &self,
        stream: MediaStream,
        kind: MediaKind,
        extension: Option<&str>,
    ) -> Result<StagedFile, StageError> {
        let staged = self.allocate(kind, extension);
        match self.copy_into(&staged.path, stream).await {
            Ok(bytes) => {
                debug!(path = %staged.path.display(), bytes, "media staged");
                Ok(staged)
            },
            Err(e) => {
                if let Err(rm) = staged.remove().await {
                    warn!(error = %rm, "failed to remove partial staged file");
                }
                Err(e)
            },
        }
    }

    async fn copy_into(&self, path: &Path, mut stream: MediaStream) -> Result<u64, StageError> {
        let write_err = |source: io::Error| StageError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(write_err)?;

        let mut buf = vec![0u8; COPY_BUF_SIZE];
        let mut total: u64 = 0;
        loop {
            let n = stream
                .reader()
                .read(&mut buf)
                .await
                .map_err(|e| SourceError::external("reading source stream", e))?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await.map_err(write_err)?;
            total += n as u64;
        }
        file.flush().await.map_err(write_err)?;
        drop(file);

        stream.finish(self.finish_grace).await?;

        if total == 0 {
            return Err(StageError::Empty);
        }
        Ok(total)
    }
}

/// Lowercase ASCII alphanumerics only, at most eight characters.
fn sanitize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    (!ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.bytes().all(|b| b.is_ascii_alphanumeric()))
    .then(|| ext.to_ascii_lowercase())
}

/// A file inside the staging directory, removed when no longer needed.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    kind: MediaKind,
    removed: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }

    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Delete the file. A file that never got created counts as removed.
    pub async fn remove(mut self) -> io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                self.removed = true;
                Ok(())
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.removed = true;
                Ok(())
            },
            Err(e) => Err(e),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "staged file removed on drop"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {},
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove staged file")
            },
        }
    }
}
