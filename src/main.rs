//! Message Enhancer
//!
//! CLI entry point: policy checks, page scans, completions and end-to-end
//! simulations against HTML fixtures.

mod cli;
mod cmd_enhance;
mod cmd_page;
mod cmd_settings;

use std::process::ExitCode;

use clap::Parser;
use enhancer_config::{ConfigLoader, LoggingConfig};
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cli::{Cli, Commands};

fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // stdout carries command output
    let console = if logging.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_target(true).with_writer(std::io::stderr).boxed()
    };

    let file = match &logging.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("message-enhancer")
                .filename_suffix("log")
                .max_log_files(30)
                .build(dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ConfigLoader::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }
    info!("Message Enhancer v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Check { url, blocked } => cmd_page::handle_check(&config, &url, blocked),
        Commands::Scan { html, url } => cmd_page::handle_scan(&config, &html, &url).await,
        Commands::Enhance {
            text,
            tone,
            kind,
            translate,
            api_key,
        } => cmd_enhance::handle_enhance(&config, text, tone, kind, translate, api_key).await,
        Commands::Validate => cmd_settings::handle_validate(&config),
        Commands::Simulate {
            html,
            field,
            text,
            url,
            offline,
            api_key,
        } => cmd_enhance::handle_simulate(&config, &html, &url, &field, &text, offline, api_key).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
