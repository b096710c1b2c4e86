use std::path::{Path, PathBuf};

use {
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::ReelbotConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "reelbot.toml",
    "reelbot.yaml",
    "reelbot.yml",
    "reelbot.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<ReelbotConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./reelbot.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/reelbot/reelbot.{toml,yaml,yml,json}` (user-global)
///
/// Returns `ReelbotConfig::default()` if no config file is found or the one
/// found cannot be parsed.
pub fn discover_and_load() -> ReelbotConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    ReelbotConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/reelbot/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "reelbot").map(|d| d.config_dir().to_path_buf())
}

/// Apply process-environment overrides on top of a loaded config.
///
/// - `BOT_TOKEN` replaces the configured credential when non-empty.
///   Whichever token wins is stored with surrounding whitespace removed.
/// - `REELBOT_ENV=development` turns development mode on.
/// - `REELBOT_STAGING_DIR` replaces the staging directory.
pub fn apply_env_overrides(config: ReelbotConfig) -> ReelbotConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_env_overrides_with(
    mut config: ReelbotConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ReelbotConfig {
    let token = lookup("BOT_TOKEN")
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| config.bot.token.expose_secret().clone());
    config.bot.token = Secret::new(token.trim().to_string());
    if lookup("REELBOT_ENV").is_some_and(|v| v.eq_ignore_ascii_case("development")) {
        config.bot.development = true;
    }
    if let Some(dir) = lookup("REELBOT_STAGING_DIR").filter(|d| !d.is_empty()) {
        config.staging.dir = PathBuf::from(dir);
    }
    config
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<ReelbotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::schema::TieBreak, secrecy::ExposeSecret};

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reelbot.toml");
        std::fs::write(
            &path,
            "[bot]\ntoken = \"99:xyz\"\n[source]\ntie_break = \"last_listed\"\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.bot.token.expose_secret(), "99:xyz");
        assert_eq!(cfg.source.tie_break, TieBreak::LastListed);
    }

    #[test]
    fn loads_yaml_and_json_files() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("reelbot.yaml");
        std::fs::write(&yaml, "staging:\n  dir: /tmp/reel\n").unwrap();
        assert_eq!(
            load_config(&yaml).unwrap().staging.dir,
            PathBuf::from("/tmp/reel")
        );

        let json = dir.path().join("reelbot.json");
        std::fs::write(&json, r#"{"timeouts": {"metadata_secs": 5}}"#).unwrap();
        assert_eq!(load_config(&json).unwrap().timeouts.metadata_secs, 5);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reelbot.ini");
        std::fs::write(&path, "x=1").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn env_overrides_token_mode_and_staging() {
        let lookup = |name: &str| match name {
            "BOT_TOKEN" => Some("5:env".to_string()),
            "REELBOT_ENV" => Some("Development".to_string()),
            "REELBOT_STAGING_DIR" => Some("/srv/stage".to_string()),
            _ => None,
        };
        let cfg = apply_env_overrides_with(ReelbotConfig::default(), lookup);
        assert_eq!(cfg.bot.token.expose_secret(), "5:env");
        assert!(cfg.bot.development);
        assert_eq!(cfg.staging.dir, PathBuf::from("/srv/stage"));
    }

    #[test]
    fn blank_env_token_keeps_configured_one() {
        let mut base = ReelbotConfig::default();
        base.bot.token = Secret::new("1:file".into());
        let cfg = apply_env_overrides_with(base, |name| {
            (name == "BOT_TOKEN").then(|| "   ".to_string())
        });
        assert_eq!(cfg.bot.token.expose_secret(), "1:file");
        assert!(!cfg.bot.development);
    }

    #[test]
    fn tokens_are_stored_trimmed() {
        let cfg = apply_env_overrides_with(ReelbotConfig::default(), |name| {
            (name == "BOT_TOKEN").then(|| "  7:abc \n".to_string())
        });
        assert_eq!(cfg.bot.token.expose_secret(), "7:abc");

        let mut base = ReelbotConfig::default();
        base.bot.token = Secret::new("\t8:file  ".into());
        let cfg = apply_env_overrides_with(base, |_| None);
        assert_eq!(cfg.bot.token.expose_secret(), "8:file");
    }
}
