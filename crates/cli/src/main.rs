mod doctor_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    reelbot_config::{ReelbotConfig, TokenStatus},
    reelbot_media::{FfmpegConverter, Stager, source::ytdlp::YtDlpSource},
    reelbot_pipeline::{Pipeline, PipelineContext, PipelineSettings},
    reelbot_telegram::{TelegramAccountConfig, TelegramOutbound},
    secrecy::ExposeSecret,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "reelbot", about = "reelbot — Telegram media streaming bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "REELBOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (default when no subcommand is provided).
    Run,
    /// Config validation and environment audit.
    Doctor,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// An explicit `--config` must load; discovery falls back to defaults.
fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ReelbotConfig> {
    let config = match path {
        Some(path) => reelbot_config::load_config(path)?,
        None => reelbot_config::discover_and_load(),
    };
    Ok(reelbot_config::apply_env_overrides(config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Run) => run_bot(cli.config.as_ref()).await,
        Some(Commands::Doctor) => doctor_commands::handle_doctor(cli.config.as_deref()).await,
    }
}

async fn run_bot(config_path: Option<&PathBuf>) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "reelbot starting");

    let config = load_config(config_path)?;

    match reelbot_config::check_token(config.bot.token.expose_secret(), config.bot.development)? {
        TokenStatus::Valid => {},
        TokenStatus::DevelopmentPlaceholder => {
            warn!("using the example bot token in development mode; Telegram will reject it");
        },
    }

    let stager = Stager::init(&config.staging.dir)
        .await
        .with_context(|| format!("staging directory {}", config.staging.dir.display()))?;
    info!(dir = %stager.dir().display(), "staging directory ready");

    let source = YtDlpSource::detect(config.source.binary.as_deref());
    if !source.is_available() {
        warn!("yt-dlp not found; media requests will fail until it is installed");
    }

    let converter = FfmpegConverter::detect(
        config.conversion.binary.as_deref(),
        config.conversion.audio_container.as_str(),
        config.conversion.audio_bitrate.as_str(),
    )
    .with_timeout(config.timeouts.conversion());
    if converter.binary().is_none() {
        warn!("ffmpeg not found; audio extraction is unavailable");
    }

    let telegram = TelegramAccountConfig::from_config(&config);
    let bot = reelbot_telegram::build_bot(&telegram)?;

    let ctx = PipelineContext::new(
        Arc::new(source),
        Arc::new(converter),
        Arc::new(TelegramOutbound::new(bot.clone())),
        stager,
    )
    .with_settings(PipelineSettings::from_config(&config));

    let handle = reelbot_telegram::start_polling(bot, &telegram, Pipeline::new(ctx)).await?;
    info!(username = ?handle.username, "reelbot running");

    tokio::select! {
        () = shutdown_signal() => info!("shutdown signal received"),
        () = handle.cancel.cancelled() => warn!("telegram polling stopped"),
    }

    handle.shutdown().await;
    info!("reelbot stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
