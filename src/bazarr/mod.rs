// Bazarr REST API access
//
// This module hides the remote subtitle-management service behind one trait:
// - Models: wire payloads and their normalized forms
// - Client: reqwest implementation authenticated with the API key

pub mod client;
pub mod models;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

pub use client::BazarrClient;
pub use models::*;

use crate::error::{BazarrError, Result};

/// The two media flavors Bazarr tracks subtitles for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    Episode,
    Movie,
}

impl ItemKind {
    /// Value of the `type` field in translate requests
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Episode => "episode",
            ItemKind::Movie => "movie",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            ItemKind::Episode => "Episodes",
            ItemKind::Movie => "Movies",
        }
    }

    pub(crate) fn wanted_path(self) -> &'static str {
        match self {
            ItemKind::Episode => "/api/episodes/wanted",
            ItemKind::Movie => "/api/movies/wanted",
        }
    }

    /// Path and array-style id parameter of the detail listing
    pub(crate) fn detail_endpoint(self) -> (&'static str, &'static str) {
        match self {
            ItemKind::Episode => ("/api/episodes", "episodeid[]"),
            ItemKind::Movie => ("/api/movies", "radarrid[]"),
        }
    }

    /// Path and id parameter of the provider endpoint (search and download)
    pub(crate) fn provider_endpoint(self) -> (&'static str, &'static str) {
        match self {
            ItemKind::Episode => ("/api/providers/episodes", "episodeid"),
            ItemKind::Movie => ("/api/providers/movies", "radarrid"),
        }
    }

    /// Query pairs identifying the item on a download POST
    pub(crate) fn download_query(self, item: &WantedItem) -> Result<Vec<(&'static str, i64)>> {
        let (_, id_param) = self.provider_endpoint();
        match self {
            ItemKind::Episode => {
                let episode = item
                    .episode
                    .as_ref()
                    .ok_or(BazarrError::MissingSeriesId(item.id))?;
                Ok(vec![("seriesid", episode.series_id), (id_param, item.id)])
            }
            ItemKind::Movie => Ok(vec![(id_param, item.id)]),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations the workflow needs from Bazarr
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BazarrApi: Send + Sync {
    /// List items of one kind flagged with missing subtitles
    async fn wanted(&self, kind: ItemKind) -> Result<Vec<WantedItem>>;

    /// Current detail for an item, `None` when Bazarr has no record
    async fn detail(&self, item: &WantedItem) -> Result<Option<ItemDetail>>;

    /// Run a provider search for an item
    async fn search(&self, item: &WantedItem) -> Result<Vec<SearchCandidate>>;

    /// Ask Bazarr to download a candidate, giving up after `timeout`
    async fn download(
        &self,
        item: &WantedItem,
        request: &DownloadRequest,
        timeout: Duration,
    ) -> Result<()>;

    /// Ask Bazarr to machine-translate an existing subtitle file
    async fn translate(&self, request: &TranslateRequest) -> Result<()>;
}
