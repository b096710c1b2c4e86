use std::path::PathBuf;

use {
    async_trait::async_trait,
    reelbot_common::types::{ConversationId, MediaKind},
};

use crate::Result;

/// A text message received from the chat platform.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub conversation: ConversationId,
    pub text: String,
    /// Display name or username of the sender, for logs only.
    pub sender: Option<String>,
}

/// A local file to upload together with its caption.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub caption: String,
    /// File name shown to the recipient; the staged name is used when unset.
    pub file_name: Option<String>,
}

impl MediaUpload {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind, caption: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            caption: caption.into(),
            file_name: None,
        }
    }

    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Send messages to a conversation.
#[async_trait]
pub trait ChatOutbound: Send + Sync {
    async fn send_text(&self, to: &ConversationId, text: &str) -> Result<()>;

    /// Upload a video file with a caption.
    async fn send_video(&self, to: &ConversationId, upload: &MediaUpload) -> Result<()>;

    /// Upload an audio file with a caption.
    async fn send_audio(&self, to: &ConversationId, upload: &MediaUpload) -> Result<()>;

    /// Send a "typing" indicator. No-op by default.
    async fn send_typing(&self, _to: &ConversationId) -> Result<()> {
        Ok(())
    }

    /// Upload by kind.
    async fn send_media(&self, to: &ConversationId, upload: &MediaUpload) -> Result<()> {
        match upload.kind {
            MediaKind::Video => self.send_video(to, upload).await,
            MediaKind::Audio => self.send_audio(to, upload).await,
        }
    }
}
