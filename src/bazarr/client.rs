use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::models::{Envelope, WantedEpisode, WantedMovie};
use super::{BazarrApi, DownloadRequest, ItemDetail, ItemKind, SearchCandidate, TranslateRequest, WantedItem};
use crate::config::BazarrConfig;
use crate::error::{BazarrError, Result};

const API_KEY_HEADER: &str = "x-api-key";

/// Bazarr client bound to one base authority and API key
pub struct BazarrClient {
    client: Client,
    base_url: String,
}

impl BazarrClient {
    pub fn new(config: &BazarrConfig) -> Result<Self> {
        Self::with_base_url(config.base_url(), &config.api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: &str) -> Result<Self> {
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| BazarrError::Config(format!("Invalid API key: {}", e)))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, timeout: Option<Duration>) -> Result<Response> {
        let request = match timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        };

        let response = request.send().await.map_err(|e| match timeout {
            Some(timeout) if e.is_timeout() => BazarrError::Timeout(timeout),
            _ => BazarrError::Http(e),
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BazarrError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str, query: &[(&str, i64)]) -> Result<T> {
        let url = self.url(path);
        debug!("GET {} {:?}", url, query);

        let response = self.send(self.client.get(&url).query(query), None).await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl BazarrApi for BazarrClient {
    async fn wanted(&self, kind: ItemKind) -> Result<Vec<WantedItem>> {
        let path = kind.wanted_path();
        let items = match kind {
            ItemKind::Episode => self
                .get_data::<Vec<WantedEpisode>>(path, &[])
                .await?
                .into_iter()
                .map(WantedItem::from)
                .collect(),
            ItemKind::Movie => self
                .get_data::<Vec<WantedMovie>>(path, &[])
                .await?
                .into_iter()
                .map(WantedItem::from)
                .collect(),
        };
        Ok(items)
    }

    async fn detail(&self, item: &WantedItem) -> Result<Option<ItemDetail>> {
        let (path, id_param) = item.kind.detail_endpoint();
        let records: Vec<ItemDetail> = self.get_data(path, &[(id_param, item.id)]).await?;
        Ok(records.into_iter().next())
    }

    async fn search(&self, item: &WantedItem) -> Result<Vec<SearchCandidate>> {
        let (path, id_param) = item.kind.provider_endpoint();
        let candidates: Option<Vec<SearchCandidate>> =
            self.get_data(path, &[(id_param, item.id)]).await?;
        candidates.ok_or_else(|| {
            BazarrError::InvalidResponse(format!("no search results for {} {}", item.kind, item.id))
        })
    }

    async fn download(
        &self,
        item: &WantedItem,
        request: &DownloadRequest,
        timeout: Duration,
    ) -> Result<()> {
        let (path, _) = item.kind.provider_endpoint();
        let query = item.kind.download_query(item)?;
        let url = self.url(path);
        debug!("POST {} {:?}", url, query);

        self.send(self.client.post(&url).query(&query).json(request), Some(timeout))
            .await?;
        Ok(())
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<()> {
        let url = self.url("/api/subtitles");
        debug!("PATCH {} {:?}", url, request);

        self.send(
            self.client
                .patch(&url)
                .query(&[("action", "translate")])
                .json(request),
            None,
        )
        .await?;
        Ok(())
    }
}
