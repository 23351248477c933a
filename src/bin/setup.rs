//! Prepares a fresh installation.
//!
//! Creates the client data and object storage directories named in the configuration, then
//! applies any pending database migrations.

use anyhow::Context;
use bunkr::settings::Settings;
use bunkr::store::Store;
use std::fs;
use tracing_subscriber::EnvFilter;

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let settings = Settings::load().context("failed to load configuration")?;

    for dir in [&settings.client.data_dir, &settings.storage.root] {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        tracing::info!(dir = %dir.display(), "directory ready");
    }

    // Connecting applies pending migrations.
    Store::connect(&settings.store.url)?;

    println!("Database ready at {}", settings.store.url);
    println!("Object storage ready at {}", settings.storage.root.display());

    Ok(())
}
