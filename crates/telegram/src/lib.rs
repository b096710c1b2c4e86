//! Telegram transport for reelbot.
//!
//! Receives messages by long polling with teloxide, hands them to the
//! request pipeline and implements `ChatOutbound` for replies and uploads.

pub mod bot;
pub mod config;
pub mod error;
pub mod handlers;
pub mod outbound;
pub mod text;

#[cfg(test)]
mod mock_api;

pub use {
    bot::{PollingHandle, build_bot, start_polling},
    config::TelegramAccountConfig,
    error::{Error, Result},
    outbound::TelegramOutbound,
};
