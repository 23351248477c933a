use crate::client::Bunkr;
use crate::error::Result;
use crate::settings::Settings;
use crate::storage::LocalStorage;
use crate::store::Store;

pub mod aggregate;
pub mod auth;
pub mod cache;
pub mod calendar;
pub mod cli;
pub mod client;
pub mod commands;
pub mod display;
pub mod drafts;
pub mod error;
pub mod export;
pub mod models;
pub mod schema;
pub mod settings;
pub mod storage;
pub mod store;
pub mod theme;

pub use crate::error::Error;

/// Builds a client from `settings`: connects to the store (applying migrations) and opens the
/// local object storage.
pub fn connect(settings: &Settings) -> Result<Bunkr<LocalStorage>> {
    let store = Store::connect(&settings.store.url)?;
    let storage = LocalStorage::new(&settings.storage.root, &settings.storage.public_url);

    Ok(Bunkr::new(store, storage))
}
