//! `reelbot doctor` — config validation and environment audit.
//!
//! Runs a series of checks against the local installation and prints a
//! structured report with `[ok]`, `[warn]`, `[fail]`, or `[info]` status
//! indicators per item.

use std::path::{Path, PathBuf};

use {
    anyhow::Result,
    reelbot_config::{ReelbotConfig, TokenStatus},
    reelbot_media::{FfmpegConverter, source::ytdlp::YtDlpSource},
    secrecy::ExposeSecret,
};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Per-check result used to build the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }
}

// ── Printing ────────────────────────────────────────────────────────────────

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
            match item.status {
                Status::Fail => errors += 1,
                Status::Warn => warnings += 1,
                _ => {},
            }
        }
        eprintln!();
    }

    (errors, warnings)
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub async fn handle_doctor(config_path: Option<&Path>) -> Result<()> {
    eprintln!("{BOLD}reelbot doctor{RESET}");
    eprintln!("{BOLD}=============={RESET}\n");

    let mut sections = Vec::new();

    // 1. Config discovery and parsing
    let (section, config) = check_config(config_path);
    sections.push(section);
    let config = reelbot_config::apply_env_overrides(config);

    // 2. Bot credential
    sections.push(check_credential(&config));

    // 3. Staging directory
    sections.push(check_staging(&config.staging.dir));

    // 4. External tools
    sections.push(check_tools(&config));

    let (errors, warnings) = print_report(&sections);

    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

// ── 1. Config ───────────────────────────────────────────────────────────────

fn check_config(explicit: Option<&Path>) -> (Section, ReelbotConfig) {
    let path = explicit
        .map(PathBuf::from)
        .or_else(reelbot_config::find_config_file);

    let Some(path) = path else {
        let mut section = Section::new("Config");
        section.push(Status::Info, "No config file found (using defaults)");
        return (section, ReelbotConfig::default());
    };

    let mut section = Section::new(format!("Config ({})", path.display()));
    match reelbot_config::load_config(&path) {
        Ok(config) => {
            section.push(Status::Ok, "Config parsed");
            (section, config)
        },
        Err(e) => {
            section.push(Status::Fail, format!("{e:#}"));
            (section, ReelbotConfig::default())
        },
    }
}

// ── 2. Credential ───────────────────────────────────────────────────────────

fn check_credential(config: &ReelbotConfig) -> Section {
    let mut section = Section::new("Bot credential");

    if config.bot.development {
        section.push(Status::Info, "Development mode enabled");
    }

    match reelbot_config::check_token(config.bot.token.expose_secret(), config.bot.development) {
        Ok(TokenStatus::Valid) => section.push(Status::Ok, "Bot token format valid"),
        Ok(TokenStatus::DevelopmentPlaceholder) => section.push(
            Status::Warn,
            "Using the example bot token; Telegram will reject it",
        ),
        Err(e) => section.push(Status::Fail, e.to_string()),
    }

    section
}

// ── 3. Staging ──────────────────────────────────────────────────────────────

fn check_staging(dir: &Path) -> Section {
    let mut section = Section::new("Staging directory");

    if dir.is_dir() {
        section.push(Status::Ok, format!("Staging directory: {}", dir.display()));
        check_writable(&mut section, dir, "Staging directory");
    } else if dir.exists() {
        section.push(
            Status::Fail,
            format!("Staging path is not a directory: {}", dir.display()),
        );
    } else {
        section.push(
            Status::Info,
            format!(
                "Staging directory not found (will be created on startup): {}",
                dir.display()
            ),
        );
    }

    section
}

fn check_writable(section: &mut Section, dir: &Path, label: &str) {
    let probe = dir.join(".reelbot-doctor-probe");
    match std::fs::write(&probe, b"probe") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
        },
        Err(e) => {
            section.push(Status::Fail, format!("{label} is not writable: {e}"));
        },
    }
}

// ── 4. Tools ────────────────────────────────────────────────────────────────

fn check_tools(config: &ReelbotConfig) -> Section {
    let mut section = Section::new("External tools");

    let source = YtDlpSource::detect(config.source.binary.as_deref());
    match source.binary_path() {
        Some(path) => section.push(Status::Ok, describe_tool("yt-dlp", path)),
        None => section.push(
            Status::Fail,
            "yt-dlp not found; /youtube and /audio cannot fetch media",
        ),
    }

    let converter = FfmpegConverter::detect(
        config.conversion.binary.as_deref(),
        config.conversion.audio_container.as_str(),
        config.conversion.audio_bitrate.as_str(),
    );
    match converter.binary() {
        Some(path) => section.push(Status::Ok, describe_tool("ffmpeg", path)),
        None => section.push(
            Status::Warn,
            "ffmpeg not found; /audio will fail unless the source already provides the target container",
        ),
    }

    section
}

fn describe_tool(name: &str, path: &Path) -> String {
    match tool_version(path) {
        Some(version) => format!("{name}: {} ({version})", path.display()),
        None => format!("{name}: {}", path.display()),
    }
}

/// First line of `<tool> -version` style output.
fn tool_version(path: &Path) -> Option<String> {
    let flag = if path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.starts_with("ffmpeg"))
    {
        "-version"
    } else {
        "--version"
    };
    let output = std::process::Command::new(path).arg(flag).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}
