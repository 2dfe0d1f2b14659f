//!
//! src/client.rs
//!
//! Public client surface. One primary operation: resolve a content
//! URL to its canonical entity through the creation endpoint. The
//! page operation returns the batch of every entity a songwhip page
//! carries.
//!

use std::sync::Arc;

use tracing::{debug, info};

use crate::assemble;
use crate::config::{ClientConfig, load_config};
use crate::errors::ApiError;
use crate::fetch::{Fetch, HttpFetcher};
use crate::model::{Entity, Response};

pub struct SongWhip {
    config: ClientConfig,
    fetcher: Arc<dyn Fetch>,
}

impl SongWhip {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        Ok(Self { config, fetcher })
    }

    /// Builds a client from SONGWHIP_* environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(load_config()?)
    }

    /// Swaps the transport out; the seam tests and embedders use.
    pub fn with_fetcher(config: ClientConfig, fetcher: Arc<dyn Fetch>) -> Self {
        Self { config, fetcher }
    }

    /// Resolves a user-supplied content URL (a Spotify/Apple/etc. link
    /// or a songwhip URL) to exactly one typed entity, using the
    /// configured default country for link placeholders.
    pub async fn resolve(&self, url: &str) -> Result<Entity, ApiError> {
        self.resolve_with_country(url, &self.config.default_country)
            .await
    }

    pub async fn resolve_with_country(&self, url: &str, country: &str) -> Result<Entity, ApiError> {
        debug!(url = %url, country = %country, "resolve.start");
        let payload = self.fetcher.fetch_creation(url, country).await?;
        let entity = assemble::creation_entity(&payload)?;
        info!(url = %url, kind = entity.kind().as_str(), path = entity.path(), "resolve.done");
        Ok(entity)
    }

    /// Fetches a songwhip page path and returns every entity embedded
    /// in it as a batch.
    pub async fn page(&self, path: &str) -> Result<Response, ApiError> {
        debug!(path = %path, "page.start");
        let state = self.fetcher.fetch_page(path).await?;
        let response = assemble::page_response(&state)?;
        info!(
            path = %path,
            artists = response.artists.len(),
            albums = response.albums.len(),
            tracks = response.tracks.len(),
            "page.done"
        );
        Ok(response)
    }
}
