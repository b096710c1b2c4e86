//! Configuration loading, env substitution, and credential validation.
//!
//! Config files: `reelbot.toml`, `reelbot.yaml`, or `reelbot.json`
//! Searched in `./` then `~/.config/reelbot/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{
        BotConfig, ConversionConfig, QualityPreference, ReelbotConfig, SourceConfig,
        StagingConfig, TelegramConfig, TieBreak, TimeoutsConfig,
    },
    validate::{PLACEHOLDER_TOKEN, TokenError, TokenStatus, check_token},
};
