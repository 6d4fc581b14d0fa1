pub mod api;
pub mod app;
pub mod commands;
pub mod config;
pub mod db;
pub mod journal;
pub mod models;
pub mod offline;
pub mod session;
pub mod view;

use anyhow::{Context as _, Result};
use clap::Parser;
use std::sync::Arc;

use api::{BackendClient, HttpTransport, SecureStorage};
use app::{AppSettings, JournalApp};
use commands::{Cli, Context};
use config::AppConfig;
use db::{Database, LocalStorage};
use offline::{AssetWorker, CacheManifest, CacheStorage, HttpFetcher};

const DATABASE_FILE: &str = "journal.db";

fn build_context(config: &AppConfig, assume_yes: bool) -> Result<Context> {
    let data_dir = config.data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let db_path = data_dir.join(DATABASE_FILE);
    let database = Database::new(&db_path).with_context(|| {
        format!(
            "Failed to open local database {}; move it aside to start fresh",
            db_path.display()
        )
    })?;
    let database = Arc::new(database);
    let storage = LocalStorage::new(database.clone());
    let vault = SecureStorage::new(storage.clone())?;

    let transport = HttpTransport::new(&config.backend.url, &config.backend.anon_key)?;
    let backend = Arc::new(BackendClient::new(
        Arc::new(transport),
        config.network.retry_policy(),
        config.network.timeout(),
    ));

    let settings = AppSettings {
        app_url: config.app.url.clone(),
        locale: config.app.locale,
        restore_timeout: config.restore_timeout(),
    };
    let app = JournalApp::new(backend, storage, vault, settings);

    let worker = AssetWorker::new(
        CacheManifest::new(&config.offline.cache_version),
        CacheStorage::new(database),
        Arc::new(HttpFetcher::new(config.network.timeout())?),
        &config.app.url,
        Some(config.backend.url.as_str()),
    )?;

    Ok(Context {
        app,
        worker,
        assume_yes,
    })
}

/// Entry point of the `g-trade-journal` binary
pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Invalid configuration")?;
    log::info!("Backend: {}", config.backend.url);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let ctx = build_context(&config, cli.yes)?;
        commands::dispatch(&ctx, cli.command).await
    })
}
