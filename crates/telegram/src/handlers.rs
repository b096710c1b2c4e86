use {
    teloxide::types::{MediaKind, Message, MessageKind},
    tracing::{debug, info},
};

use {
    reelbot_channels::InboundMessage,
    reelbot_common::types::ConversationId,
    reelbot_pipeline::{Pipeline, command_mention},
};

/// Convert a Telegram message into the transport-neutral form.
///
/// Returns `None` for messages without text, and for commands addressed to
/// a different bot (`/youtube@otherbot`) in group chats.
pub fn inbound_from_message(msg: &Message, bot_username: Option<&str>) -> Option<InboundMessage> {
    let text = extract_text(msg)?;

    if let (Some(mention), Some(own)) = (command_mention(&text), bot_username)
        && !mention.eq_ignore_ascii_case(own)
    {
        debug!(
            chat_id = msg.chat.id.0,
            mention, "ignoring command addressed to another bot"
        );
        return None;
    }

    let sender = msg.from.as_ref().map(|u| {
        u.username
            .clone()
            .unwrap_or_else(|| u.first_name.clone())
    });

    Some(InboundMessage {
        conversation: ConversationId::from(msg.chat.id.0),
        text,
        sender,
    })
}

/// Hand a message to the pipeline on its own task so a long download never
/// blocks the polling loop. The run reports its own outcome.
pub fn dispatch(msg: &Message, pipeline: &Pipeline, bot_username: Option<&str>) {
    let Some(inbound) = inbound_from_message(msg, bot_username) else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text telegram message");
        return;
    };

    info!(
        chat_id = inbound.conversation.as_str(),
        sender = ?inbound.sender,
        text_len = inbound.text.len(),
        "telegram inbound message"
    );

    let pipeline = pipeline.clone();
    tokio::spawn(async move {
        pipeline.handle_message(&inbound).await;
    });
}

/// Extract text content from a message; media captions count as text.
fn extract_text(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.clone()),
            MediaKind::Photo(p) => p.caption.clone(),
            MediaKind::Document(d) => d.caption.clone(),
            MediaKind::Video(vid) => vid.caption.clone(),
            MediaKind::Animation(a) => a.caption.clone(),
            _ => None,
        },
        _ => None,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn text_message(chat_id: i64, text: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": chat_id, "type": "private", "first_name": "Alice" },
            "from": {
                "id": 1001,
                "is_bot": false,
                "first_name": "Alice",
                "username": "alice"
            },
            "text": text
        }))
        .expect("deserialize text message")
    }

    #[test]
    fn text_message_becomes_inbound() {
        let msg = text_message(42, "/youtube https://youtu.be/dQw4w9WgXcQ");
        let inbound = inbound_from_message(&msg, Some("reel_bot")).unwrap();
        assert_eq!(inbound.conversation.as_str(), "42");
        assert_eq!(inbound.text, "/youtube https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(inbound.sender.as_deref(), Some("alice"));
    }

    #[test]
    fn commands_for_other_bots_are_dropped() {
        let msg = text_message(-100, "/youtube@other_bot https://youtu.be/dQw4w9WgXcQ");
        assert!(inbound_from_message(&msg, Some("reel_bot")).is_none());

        let msg = text_message(-100, "/youtube@Reel_Bot https://youtu.be/dQw4w9WgXcQ");
        assert!(inbound_from_message(&msg, Some("reel_bot")).is_some());
    }

    #[test]
    fn sender_falls_back_to_first_name() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Bob" },
            "from": { "id": 1002, "is_bot": false, "first_name": "Bob" },
            "text": "hello"
        }))
        .unwrap();
        let inbound = inbound_from_message(&msg, None).unwrap();
        assert_eq!(inbound.sender.as_deref(), Some("Bob"));
    }

    #[test]
    fn video_caption_is_used_as_text() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "video": {
                "file_id": "video-file-id",
                "file_unique_id": "video-unique-id",
                "width": 640,
                "height": 360,
                "duration": 3
            },
            "caption": "https://youtu.be/dQw4w9WgXcQ"
        }))
        .unwrap();
        let inbound = inbound_from_message(&msg, None).unwrap();
        assert_eq!(inbound.text, "https://youtu.be/dQw4w9WgXcQ");
        assert!(inbound.sender.is_none());
    }

    #[test]
    fn messages_without_text_are_ignored() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "location": { "latitude": 48.8566, "longitude": 2.3522 }
        }))
        .unwrap();
        assert!(inbound_from_message(&msg, None).is_none());
    }
}
