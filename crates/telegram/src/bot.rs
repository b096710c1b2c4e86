use std::time::Duration;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use reelbot_pipeline::{COMMANDS, Pipeline};

use crate::{
    config::TelegramAccountConfig,
    error::{Context, Result},
    handlers,
};

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Build the bot client with a timeout longer than the long-polling timeout
/// so the HTTP client doesn't abort the request before Telegram responds.
pub fn build_bot(config: &TelegramAccountConfig) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(config.client_timeout())
        .build()?;
    Ok(Bot::with_client(config.token.expose_secret(), client))
}

/// A running polling loop.
pub struct PollingHandle {
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
    pub username: Option<String>,
}

impl PollingHandle {
    /// Cancel polling and wait for the loop to acknowledge its offset.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "telegram polling task ended abnormally");
        }
    }
}

/// Verify the token and start the long-polling loop.
///
/// An unusable token is fatal; command registration failures are only
/// logged.
pub async fn start_polling(
    bot: Bot,
    config: &TelegramAccountConfig,
    pipeline: Pipeline,
) -> Result<PollingHandle> {
    let me = bot
        .get_me()
        .await
        .context("telegram rejected the bot token (getMe)")?;
    let username = me.username.clone();

    // Long polling and webhooks are mutually exclusive.
    bot.delete_webhook()
        .await
        .context("failed to clear telegram webhook")?;

    if config.register_commands {
        let commands: Vec<BotCommand> = COMMANDS
            .iter()
            .map(|(name, description)| BotCommand::new(*name, *description))
            .collect();
        if let Err(e) = bot.set_my_commands(commands).await {
            warn!(error = %e, "failed to register bot commands");
        }
    }

    info!(username = ?username, "telegram bot connected (webhook cleared)");

    let cancel = CancellationToken::new();
    let task = tokio::spawn(poll_loop(
        bot,
        config.poll_timeout_secs,
        pipeline,
        username.clone(),
        cancel.clone(),
    ));

    Ok(PollingHandle {
        cancel,
        task,
        username,
    })
}

async fn poll_loop(
    bot: Bot,
    poll_timeout_secs: u32,
    pipeline: Pipeline,
    username: Option<String>,
    cancel: CancellationToken,
) {
    info!("starting telegram polling loop");
    let mut offset: i32 = 0;

    loop {
        let request = bot
            .get_updates()
            .offset(offset)
            .timeout(poll_timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message]);

        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = request.send() => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    match update.kind {
                        UpdateKind::Message(msg) => {
                            handlers::dispatch(&msg, &pipeline, username.as_deref());
                        },
                        other => {
                            debug!("ignoring non-message update: {other:?}");
                        },
                    }
                }
            },
            Err(e) => {
                if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                    warn!(
                        "telegram polling stopped: another instance is already running with this token"
                    );
                    cancel.cancel();
                    break;
                }

                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(POLL_ERROR_BACKOFF) => {},
                }
            },
        }
    }

    acknowledge_offset(&bot, offset).await;
    info!("telegram polling stopped");
}

/// Confirm consumed updates so a restart does not see them again.
async fn acknowledge_offset(bot: &Bot, offset: i32) {
    if offset == 0 {
        return;
    }
    let ack = bot.get_updates().offset(offset).timeout(0).limit(1);
    match tokio::time::timeout(POLL_ERROR_BACKOFF, ack.send()).await {
        Ok(Ok(_)) => debug!(offset, "telegram update offset acknowledged"),
        Ok(Err(e)) => warn!(offset, error = %e, "failed to acknowledge telegram offset"),
        Err(_) => warn!(offset, "timed out acknowledging telegram offset"),
    }
}
