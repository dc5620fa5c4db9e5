//! One-shot progress status check against a library server.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load app configuration from `conf/config.toml`.
//! - Load the book environment the host would inject.
//! - Fetch the saved reading position and report it.

use anyhow::{Context, Result, anyhow};
use readmark::config::{load_book_env, load_config};
use readmark::sync::{ProgressStore, SyncClient};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let env_path = parse_args()?;
    let config = load_config(Path::new("conf/config.toml"));
    set_log_level(reload_handle, config.log_level.as_filter_str());

    let book_env = load_book_env(&env_path)?;
    info!(
        server = %book_env.server_url,
        book_id = book_env.book_id,
        format = %book_env.format,
        "Checking saved reading position"
    );

    let client = SyncClient::new(&book_env).context("Failed to build sync client")?;
    match client.fetch_progress(book_env.book_id, book_env.format)? {
        Some(token) => info!(progress = %token, "Server has a saved position"),
        None => info!("No saved position for this book"),
    }
    Ok(())
}

fn parse_args() -> Result<PathBuf> {
    let mut args = env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| anyhow!("Usage: readmark <path-to-book-env.toml>"))?;

    let path = PathBuf::from(path);
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }
    Ok(path)
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_filter(filter_layer))
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    }
}
