//! Incremental browser over the PokeAPI creature catalog.
//!
//! Listing pages are fetched one at a time, every reference on a page is
//! enriched concurrently into a [`CatalogEntry`] with Japanese name and type
//! strings, and the results accumulate in a deduplicated [`CatalogStore`]
//! that supports free-text filtering.

pub mod browser;
pub mod config;
mod data;
pub mod enrich;
pub mod error;
pub mod pager;
pub mod search;
pub mod service;
pub mod source;
pub mod store;
pub mod translate;

#[cfg(feature = "web")]
pub mod web;

pub use browser::{BrowserEvent, BrowserStats, CatalogBrowser, Trigger};
pub use config::BrowserConfig;
pub use data::{
    Artwork, CatalogEntry, Cursor, EntryId, ListingPage, NamedResource, OtherSprites,
    PageReference, RecordDetail, Sprites, TypeSlot,
};
pub use error::{Error, Result};
pub use search::Query;
pub use service::{BrowserHandle, Snapshot};
pub use source::{CatalogSource, HttpSource};
pub use store::{CatalogStore, InsertOutcome};
pub use translate::{Localized, TranslationLookup, TranslationTables};

use std::sync::Arc;

/// Builds a browser over the live HTTP endpoints named by `config`.
pub fn http_browser<L>(
    config: &BrowserConfig,
    lookup: Arc<L>,
) -> Result<CatalogBrowser<HttpSource, L>>
where
    L: TranslationLookup + 'static,
{
    let start_url = config.start_url()?;
    let source = HttpSource::new(config)?;
    Ok(CatalogBrowser::new(Arc::new(source), lookup, start_url))
}
