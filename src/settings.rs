//! Layered settings: built-in defaults, then `config.toml`, then `BUNKR_*` environment variables,
//! then `DATABASE_URL`.
//!
//! Environment keys nest with a double underscore: `BUNKR_STORE__ANON_KEY` sets `store.anon_key`.

use crate::error::Result;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub store: StoreSettings,
    pub storage: StorageSettings,
    pub client: ClientSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoreSettings {
    /// Where the `sqlite3` database lives.
    pub url: String,
    /// The public key identifying this client to the store.
    pub anon_key: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageSettings {
    /// The directory holding uploaded objects.
    pub root: PathBuf,
    /// The base that public object URLs are built from.
    pub public_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSettings {
    /// Where the saved session and theme preference are kept.
    pub data_dir: PathBuf,
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(Config::builder()
        .set_default("store.url", "bunkr.db")?
        .set_default("store.anon_key", "dummy-key")?
        .set_default("storage.root", "storage")?
        .set_default("storage.public_url", "http://localhost:54321")?
        .set_default("client.data_dir", ".bunkr")?)
}

impl Settings {
    /// Loads settings from `config.toml` in the working directory, the environment and any `.env`
    /// file. Every source is optional.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = defaults()?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("BUNKR")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("store.url", env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Loads settings from a specific file on top of the defaults, ignoring the environment.
    pub fn from_file(path: &Path) -> Result<Self> {
        let settings = defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// The anon key with everything but its last four characters hidden.
    pub fn masked_anon_key(&self) -> String {
        let key = &self.store.anon_key;
        let shown = key.chars().count().min(4);
        let hidden = key.chars().count() - shown;
        let tail: String = key.chars().skip(hidden).collect();
        format!("{}{tail}", "*".repeat(hidden))
    }
}
