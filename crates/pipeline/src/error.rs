use std::time::Duration;

use {
    reelbot_common::types::MediaKind,
    reelbot_media::{ConvertError, SourceError, StageError},
};

use crate::{replies, request::Mode};

/// User-facing failure category. Each maps to exactly one reply text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingArgument,
    InvalidSource,
    SourceUnavailable,
    StagingIo,
    Conversion,
    Delivery,
    Unexpected,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingArgument => "missing_argument",
            Self::InvalidSource => "invalid_source",
            Self::SourceUnavailable => "source_unavailable",
            Self::StagingIo => "staging_io",
            Self::Conversion => "conversion",
            Self::Delivery => "delivery",
            Self::Unexpected => "unexpected",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that can end a pipeline run early.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{mode} request without a source argument")]
    MissingArgument { mode: Mode },

    #[error("not a valid source: {url}")]
    InvalidSource { url: String },

    #[error("source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),

    #[error("no {kind} format available among {available} listed")]
    NoSuitableFormat { kind: MediaKind, available: usize },

    #[error("staging failed: {0}")]
    Staging(#[source] StageError),

    #[error("conversion failed: {0}")]
    Conversion(#[from] ConvertError),

    #[error("delivery failed: {0}")]
    Delivery(#[from] reelbot_channels::Error),

    #[error("delivery timed out after {0:?}")]
    DeliveryTimeout(Duration),

    #[error("unexpected failure: {message}")]
    Unexpected { message: String },
}

impl From<SourceError> for PipelineError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::InvalidIdentifier { identifier } => {
                Self::InvalidSource { url: identifier }
            },
            other => Self::SourceUnavailable(other),
        }
    }
}

impl From<StageError> for PipelineError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::Source(source) => source.into(),
            other => Self::Staging(other),
        }
    }
}

impl PipelineError {
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingArgument { .. } => ErrorKind::MissingArgument,
            Self::InvalidSource { .. } => ErrorKind::InvalidSource,
            Self::SourceUnavailable(_) | Self::NoSuitableFormat { .. } => {
                ErrorKind::SourceUnavailable
            },
            Self::Staging(e) if e.is_filesystem() => ErrorKind::StagingIo,
            // Empty streams are a source problem even though the stager saw them.
            Self::Staging(_) => ErrorKind::SourceUnavailable,
            Self::Conversion(_) => ErrorKind::Conversion,
            Self::Delivery(_) | Self::DeliveryTimeout(_) => ErrorKind::Delivery,
            Self::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    /// Plain-language reply for the user. Never contains paths or error
    /// detail.
    #[must_use]
    pub fn user_message(&self, mode: Mode) -> String {
        match self.kind() {
            ErrorKind::MissingArgument => replies::usage(mode),
            ErrorKind::InvalidSource => replies::INVALID_SOURCE.to_string(),
            ErrorKind::SourceUnavailable => replies::SOURCE_UNAVAILABLE.to_string(),
            ErrorKind::StagingIo => replies::STAGING_FAILED.to_string(),
            ErrorKind::Conversion => replies::CONVERSION_FAILED.to_string(),
            ErrorKind::Delivery => replies::DELIVERY_FAILED.to_string(),
            ErrorKind::Unexpected => replies::UNEXPECTED.to_string(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
