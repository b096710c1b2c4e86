use reelbot_common::types::{ConversationId, MediaKind};

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    StreamVideo,
    ExtractAudio,
    /// A bare link in free text: metadata only, answered with a menu.
    LinkDetected,
}

impl Mode {
    /// The artifact delivered for this mode, if any.
    #[must_use]
    pub fn media_kind(self) -> Option<MediaKind> {
        match self {
            Self::StreamVideo => Some(MediaKind::Video),
            Self::ExtractAudio => Some(MediaKind::Audio),
            Self::LinkDetected => None,
        }
    }

    /// Slash command that triggers this mode.
    #[must_use]
    pub fn command(self) -> Option<&'static str> {
        match self {
            Self::StreamVideo => Some("youtube"),
            Self::ExtractAudio => Some("audio"),
            Self::LinkDetected => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StreamVideo => "stream_video",
            Self::ExtractAudio => "extract_audio",
            Self::LinkDetected => "link_detected",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user-issued media request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub mode: Mode,
    /// Raw argument; validated by the pipeline, not at construction.
    pub source_url: Option<String>,
    pub conversation: ConversationId,
}

impl Request {
    #[must_use]
    pub fn new(mode: Mode, source_url: Option<String>, conversation: ConversationId) -> Self {
        Self {
            mode,
            source_url,
            conversation,
        }
    }
}

/// Pipeline states, in the order a successful run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Received,
    Validated,
    MetadataFetched,
    Staged,
    Converted,
    Delivered,
    Cleaned,
    Failed,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::MetadataFetched => "metadata_fetched",
            Self::Staged => "staged",
            Self::Converted => "converted",
            Self::Delivered => "delivered",
            Self::Cleaned => "cleaned",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
