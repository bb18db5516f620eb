//! authgate
//!
//! Command-line host for the authenticated request layer:
//! 1. Loads config and opens the persisted credential store
//! 2. Builds router + route guard and the authenticated transport over reqwest
//! 3. Runs one command (login, logout, status, request, upload, navigate)
//!
//! Logs go to stderr so command output on stdout stays clean.

mod app;
mod commands;
mod config;
mod error;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::commands::Cli;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // LOG_LEVEL / RUST_LOG filter; LOG_FORMAT=json switches to JSON lines
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.api.base_url,
        store_path = %config.session.store_path.display(),
        redirect = ?config.navigation.redirect,
        "configuration loaded"
    );

    let app = App::build(&config)?;

    let mut stdout = std::io::stdout().lock();
    let mut stdin = std::io::stdin().lock();
    commands::run(&app, cli.command, &mut stdout, &mut stdin).await
}
