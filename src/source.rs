use crate::config::BrowserConfig;
use crate::data::{ListingPage, PageReference, RecordDetail};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("malformed payload from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("request to {url} did not finish: {reason}")]
    Interrupted { url: String, reason: String },
}

/// Remote side of the catalog: the paginated listing and per-record detail
/// endpoints.
#[async_trait]
pub trait CatalogSource: Send + Sync + 'static {
    async fn fetch_page(&self, url: &str) -> Result<ListingPage, SourceError>;

    async fn fetch_record(&self, reference: &PageReference) -> Result<RecordDetail, SourceError>;
}

pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(config: &BrowserConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|source| SourceError::Transport {
                url: config.base_url.clone(),
                source,
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let transport = |source| SourceError::Transport {
            url: url.to_string(),
            source,
        };
        debug!(%url, "GET");
        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(transport)?;
        serde_json::from_slice(&body).map_err(|source| SourceError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl CatalogSource for HttpSource {
    async fn fetch_page(&self, url: &str) -> Result<ListingPage, SourceError> {
        self.get_json(url).await
    }

    async fn fetch_record(&self, reference: &PageReference) -> Result<RecordDetail, SourceError> {
        self.get_json(&reference.url).await
    }
}
