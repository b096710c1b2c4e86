use {
    async_trait::async_trait,
    std::{future::Future, time::Duration},
    teloxide::{
        ApiError, RequestError,
        payloads::{SendAudioSetters, SendVideoSetters},
        prelude::*,
        types::{ChatAction, ChatId, InputFile},
    },
    tracing::{debug, info, warn},
};

use {
    reelbot_channels::{ChatOutbound, Error as ChannelError, MediaUpload, Result},
    reelbot_common::types::ConversationId,
};

use crate::text::{self, TELEGRAM_MAX_MESSAGE_LEN};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Outbound message sender for Telegram.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn run_telegram_request_with_retry<T, F, Fut>(
        &self,
        to: &str,
        operation: &'static str,
        mut request: F,
    ) -> std::result::Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };

                    if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                        warn!(
                            chat_id = to,
                            operation,
                            retries,
                            max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err);
                    }

                    retries += 1;
                    warn!(
                        chat_id = to,
                        operation,
                        retries,
                        max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }

    /// Best effort; a failed chat action never blocks the upload.
    async fn send_action(&self, chat_id: ChatId, action: ChatAction) {
        if let Err(e) = self.bot.send_chat_action(chat_id, action).await {
            debug!(chat_id = chat_id.0, error = %e, "telegram chat action failed");
        }
    }
}

fn parse_chat_id(to: &ConversationId) -> Result<ChatId> {
    Ok(ChatId(to.as_str().parse::<i64>()?))
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

/// API refusals (file too large, chat not found, ...) versus transport
/// failures.
fn to_channel_error(operation: &'static str, error: RequestError) -> ChannelError {
    match error {
        RequestError::Api(api) => ChannelError::rejected(format!("{operation}: {api}")),
        RequestError::RetryAfter(wait) => ChannelError::unavailable(format!(
            "{operation}: rate limited for {}s",
            wait.duration().as_secs()
        )),
        other => ChannelError::external(operation, other),
    }
}

/// Whether Telegram reported that the upload exceeds its size limit.
#[must_use]
pub fn is_too_large(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::RequestEntityTooLarge))
}

#[async_trait]
impl ChatOutbound for TelegramOutbound {
    async fn send_text(&self, to: &ConversationId, text: &str) -> Result<()> {
        let chat_id = parse_chat_id(to)?;
        let chunks = text::chunk_message(text, TELEGRAM_MAX_MESSAGE_LEN);
        debug!(
            chat_id = to.as_str(),
            text_len = text.len(),
            chunk_count = chunks.len(),
            "telegram outbound text send"
        );

        for chunk in &chunks {
            self.run_telegram_request_with_retry(to.as_str(), "send message", || {
                let req = self.bot.send_message(chat_id, chunk.as_str());
                async move { req.await }
            })
            .await
            .map_err(|e| to_channel_error("send message", e))?;
        }
        Ok(())
    }

    async fn send_video(&self, to: &ConversationId, upload: &MediaUpload) -> Result<()> {
        let chat_id = parse_chat_id(to)?;
        let caption = text::truncate_caption(&upload.caption);
        info!(
            chat_id = to.as_str(),
            path = %upload.path.display(),
            caption_len = caption.len(),
            "telegram outbound video send start"
        );

        self.send_action(chat_id, ChatAction::UploadVideo).await;
        self.run_telegram_request_with_retry(to.as_str(), "send video", || {
            let mut input = InputFile::file(upload.path.clone());
            if let Some(ref name) = upload.file_name {
                input = input.file_name(name.clone());
            }
            let req = self
                .bot
                .send_video(chat_id, input)
                .caption(caption.clone())
                .supports_streaming(true);
            async move { req.await }
        })
        .await
        .map_err(|e| {
            if is_too_large(&e) {
                warn!(chat_id = to.as_str(), "video exceeds the telegram upload limit");
            }
            to_channel_error("send video", e)
        })?;

        info!(chat_id = to.as_str(), "telegram outbound video sent");
        Ok(())
    }

    async fn send_audio(&self, to: &ConversationId, upload: &MediaUpload) -> Result<()> {
        let chat_id = parse_chat_id(to)?;
        let caption = text::truncate_caption(&upload.caption);
        info!(
            chat_id = to.as_str(),
            path = %upload.path.display(),
            caption_len = caption.len(),
            "telegram outbound audio send start"
        );

        self.send_action(chat_id, ChatAction::UploadVoice).await;
        self.run_telegram_request_with_retry(to.as_str(), "send audio", || {
            let mut input = InputFile::file(upload.path.clone());
            if let Some(ref name) = upload.file_name {
                input = input.file_name(name.clone());
            }
            let req = self
                .bot
                .send_audio(chat_id, input)
                .caption(caption.clone())
                .title(caption.clone());
            async move { req.await }
        })
        .await
        .map_err(|e| to_channel_error("send audio", e))?;

        info!(chat_id = to.as_str(), "telegram outbound audio sent");
        Ok(())
    }

    async fn send_typing(&self, to: &ConversationId) -> Result<()> {
        let chat_id = parse_chat_id(to)?;
        self.send_action(chat_id, ChatAction::Typing).await;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::mock_api::MockServer,
        reelbot_common::types::MediaKind,
        std::sync::atomic::Ordering,
    };

    #[test]
    fn retry_after_duration_extracts_wait() {
        let err = RequestError::RetryAfter(teloxide::types::Seconds::from_seconds(42));
        assert_eq!(retry_after_duration(&err), Some(Duration::from_secs(42)));
    }

    #[test]
    fn retry_after_duration_ignores_other_errors() {
        let err = RequestError::Api(ApiError::BotBlocked);
        assert_eq!(retry_after_duration(&err), None);
    }

    #[test]
    fn api_errors_are_rejections() {
        let err = to_channel_error(
            "send video",
            RequestError::Api(ApiError::RequestEntityTooLarge),
        );
        assert!(matches!(err, ChannelError::Rejected { .. }));
        assert!(is_too_large(&RequestError::Api(
            ApiError::RequestEntityTooLarge
        )));
    }

    #[tokio::test]
    async fn invalid_conversation_id_is_rejected_locally() {
        let outbound = TelegramOutbound::new(Bot::new("test-token"));
        let err = outbound
            .send_text(&ConversationId::new("not-a-chat"), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::ParseInt(_)));
    }

    #[tokio::test]
    async fn long_text_is_sent_in_chunks() {
        let server = MockServer::start().await;
        let outbound = TelegramOutbound::new(server.bot());

        let text = "word ".repeat(2_000);
        outbound
            .send_text(&ConversationId::from(42), &text)
            .await
            .unwrap();

        let sent: Vec<_> = server
            .api
            .requests()
            .into_iter()
            .filter(|r| r.method == "SendMessage")
            .collect();
        assert_eq!(sent.len(), 3);
        for req in &sent {
            let body = req.json().unwrap();
            assert_eq!(body["chat_id"], 42);
            assert!(body["text"].as_str().unwrap().len() <= TELEGRAM_MAX_MESSAGE_LEN);
        }
        server.shutdown().await;
    }

    #[tokio::test]
    async fn video_upload_is_preceded_by_chat_action() {
        let server = MockServer::start().await;
        let outbound = TelegramOutbound::new(server.bot());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1-abc.mp4");
        std::fs::write(&path, b"fake mp4").unwrap();

        let upload = MediaUpload::new(&path, MediaKind::Video, "Demo").with_file_name("Demo.mp4");
        outbound
            .send_media(&ConversationId::from(42), &upload)
            .await
            .unwrap();

        let requests = server.api.requests();
        let methods: Vec<_> = requests.iter().map(|r| r.method.as_str()).collect();
        assert_eq!(methods, vec!["SendChatAction", "SendVideo"]);
        let action = requests[0].json().unwrap();
        assert_eq!(action["action"], "upload_video");
        let body = &requests[1].body;
        assert!(body.contains("Demo.mp4"));
        assert!(body.contains("fake mp4"));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn audio_upload_uses_send_audio() {
        let server = MockServer::start().await;
        let outbound = TelegramOutbound::new(server.bot());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1-abc.mp3");
        std::fs::write(&path, b"ID3").unwrap();

        let upload = MediaUpload::new(&path, MediaKind::Audio, "Demo");
        outbound
            .send_media(&ConversationId::from(42), &upload)
            .await
            .unwrap();

        assert_eq!(server.api.methods(), vec!["SendChatAction", "SendAudio"]);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn rate_limited_send_is_retried() {
        let server = MockServer::start().await;
        server.api.rate_limited.store(1, Ordering::SeqCst);
        let outbound = TelegramOutbound::new(server.bot());

        outbound
            .send_text(&ConversationId::from(42), "hello")
            .await
            .unwrap();

        assert_eq!(server.api.methods(), vec!["SendMessage", "SendMessage"]);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn oversized_upload_is_a_rejection() {
        let server = MockServer::start().await;
        server.api.reject_uploads.store(true, Ordering::SeqCst);
        let outbound = TelegramOutbound::new(server.bot());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.mp4");
        std::fs::write(&path, b"x").unwrap();

        let err = outbound
            .send_video(
                &ConversationId::from(42),
                &MediaUpload::new(&path, MediaKind::Video, "Big"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::Rejected { .. }));
        server.shutdown().await;
    }
}
