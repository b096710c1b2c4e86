/// Config schema types (bot credential, transport, staging, source, conversion, timeouts).
use std::{path::PathBuf, time::Duration};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

pub use reelbot_common::types::{QualityPreference, TieBreak};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelbotConfig {
    pub bot: BotConfig,
    pub telegram: TelegramConfig,
    pub staging: StagingConfig,
    pub source: SourceConfig,
    pub conversion: ConversionConfig,
    pub timeouts: TimeoutsConfig,
}

/// Bot credential and run mode.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot token from @BotFather. Usually `"${BOT_TOKEN}"` or set via env.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
    /// Development mode: permits the placeholder token for local testing.
    pub development: bool,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"[REDACTED]")
            .field("development", &self.development)
            .finish()
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            development: false,
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Telegram long-polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// `getUpdates` long-poll timeout in seconds.
    pub poll_timeout_secs: u32,
    /// HTTP client timeout; must exceed the poll timeout.
    pub client_timeout_secs: u64,
    /// Register the slash commands with Telegram for client autocomplete.
    pub register_commands: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            poll_timeout_secs: 30,
            client_timeout_secs: 45,
            register_commands: true,
        }
    }
}

/// Where staged downloads are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Relative paths resolve against the working directory.
    pub dir: PathBuf,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("temp"),
        }
    }
}

/// Media source adapter (yt-dlp) settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Explicit path to `yt-dlp`; searched in PATH when unset.
    pub binary: Option<String>,
    pub prefer: QualityPreference,
    pub tie_break: TieBreak,
    /// Drop video formats taller than this before ranking.
    pub max_height: Option<u32>,
}

/// Conversion delegate (ffmpeg) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Explicit path to `ffmpeg`; searched in PATH when unset.
    pub binary: Option<String>,
    /// Target container for extracted audio.
    pub audio_container: String,
    /// Target audio bitrate passed to the encoder (e.g. "192k").
    pub audio_bitrate: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            binary: None,
            audio_container: "mp3".into(),
            audio_bitrate: "192k".into(),
        }
    }
}

/// Bounds on the slow external calls of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub metadata_secs: u64,
    pub delivery_secs: u64,
    pub conversion_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            metadata_secs: 30,
            delivery_secs: 300,
            conversion_secs: 600,
        }
    }
}

impl TimeoutsConfig {
    #[must_use]
    pub fn metadata(&self) -> Duration {
        Duration::from_secs(self.metadata_secs)
    }

    #[must_use]
    pub fn delivery(&self) -> Duration {
        Duration::from_secs(self.delivery_secs)
    }

    #[must_use]
    pub fn conversion(&self) -> Duration {
        Duration::from_secs(self.conversion_secs)
    }
}
