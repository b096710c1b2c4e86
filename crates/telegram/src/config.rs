use std::time::Duration;

use {
    reelbot_config::ReelbotConfig,
    secrecy::{ExposeSecret, Secret},
};

/// Connection settings for the bot account.
#[derive(Clone)]
pub struct TelegramAccountConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,

    /// Long-polling timeout passed to `getUpdates`.
    pub poll_timeout_secs: u32,

    /// HTTP client timeout; must exceed the poll timeout.
    pub client_timeout_secs: u64,

    /// Publish the command list to Telegram on startup.
    pub register_commands: bool,
}

impl TelegramAccountConfig {
    #[must_use]
    pub fn from_config(config: &ReelbotConfig) -> Self {
        Self {
            token: Secret::new(config.bot.token.expose_secret().trim().to_string()),
            poll_timeout_secs: config.telegram.poll_timeout_secs,
            client_timeout_secs: config.telegram.client_timeout_secs,
            register_commands: config.telegram.register_commands,
        }
    }

    /// Client timeout, raised to at least poll timeout + 15s so the HTTP
    /// client never aborts a long poll Telegram is still holding.
    #[must_use]
    pub fn client_timeout(&self) -> Duration {
        let floor = u64::from(self.poll_timeout_secs) + 15;
        Duration::from_secs(self.client_timeout_secs.max(floor))
    }
}

impl std::fmt::Debug for TelegramAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramAccountConfig")
            .field("token", &"[REDACTED]")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("client_timeout_secs", &self.client_timeout_secs)
            .field("register_commands", &self.register_commands)
            .finish()
    }
}

impl Default for TelegramAccountConfig {
    fn default() -> Self {
        Self::from_config(&ReelbotConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = TelegramAccountConfig::default();
        assert_eq!(cfg.poll_timeout_secs, 30);
        assert_eq!(cfg.client_timeout(), Duration::from_secs(45));
        assert!(cfg.register_commands);
    }

    #[test]
    fn copies_token_and_raises_client_timeout() {
        let mut config = ReelbotConfig::default();
        config.bot.token = Secret::new("123:ABC".into());
        config.telegram.poll_timeout_secs = 50;
        config.telegram.client_timeout_secs = 10;

        let cfg = TelegramAccountConfig::from_config(&config);
        assert_eq!(cfg.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.client_timeout(), Duration::from_secs(65));
    }

    #[test]
    fn token_whitespace_never_reaches_the_client() {
        let mut config = ReelbotConfig::default();
        config.bot.token = Secret::new("  7:abc \n".into());
        let cfg = TelegramAccountConfig::from_config(&config);
        assert_eq!(cfg.token.expose_secret(), "7:abc");
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = TelegramAccountConfig {
            token: Secret::new("123:SECRET".into()),
            ..TelegramAccountConfig::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("SECRET"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
