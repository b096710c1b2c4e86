//! Types shared between the transport, the pipeline and the media adapters.

use serde::{Deserialize, Serialize};

/// Opaque handle to the conversation a reply is addressed to.
///
/// For Telegram this is the stringified chat ID; the pipeline never
/// interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// What a staged artifact contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Extension used when the source does not report a container.
    #[must_use]
    pub fn default_extension(self) -> &'static str {
        match self {
            Self::Video => "mp4",
            Self::Audio => "mp3",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranking applied to a source's format list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreference {
    /// Rank by the source's quality attributes; the first listed wins when
    /// nothing carries a rank.
    #[default]
    Highest,
    /// Ignore ranking and take the first candidate in source order.
    FirstListed,
}

/// Which candidate wins between equally ranked formats.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    FirstListed,
    LastListed,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_id_from_chat_id() {
        let id = ConversationId::from(-100_123_i64);
        assert_eq!(id.as_str(), "-100123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"-100123\"");
    }

    #[test]
    fn media_kind_defaults() {
        assert_eq!(MediaKind::Video.default_extension(), "mp4");
        assert_eq!(MediaKind::Audio.default_extension(), "mp3");
        assert_eq!(MediaKind::Audio.to_string(), "audio");
    }

    #[test]
    fn policy_enums_use_snake_case() {
        let tb: TieBreak = serde_json::from_str("\"last_listed\"").unwrap();
        assert_eq!(tb, TieBreak::LastListed);
        let pref: QualityPreference = serde_json::from_str("\"first_listed\"").unwrap();
        assert_eq!(pref, QualityPreference::FirstListed);
    }
}
