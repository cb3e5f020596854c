use std::path::PathBuf;

use serde_json::Value;

use crate::config::FeedConfig;
use crate::utils::{Error, VomadridResult};

/// Where the now-playing document comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSource {
    File(PathBuf),
    Http { url: String, city_key: Option<String> },
}

#[derive(Debug, Clone)]
pub struct FeedClient {
    source: FeedSource,
    client: reqwest::Client,
}

impl FeedClient {
    pub fn new(source: FeedSource) -> Self {
        Self::with_client(source, reqwest::Client::new())
    }

    pub fn with_client(source: FeedSource, client: reqwest::Client) -> Self {
        Self { source, client }
    }

    pub fn from_config(cfg: &FeedConfig) -> VomadridResult<Self> {
        let source = if let Some(path) = &cfg.path {
            FeedSource::File(PathBuf::from(path))
        } else if let Some(url) = &cfg.url {
            FeedSource::Http {
                url: url.clone(),
                city_key: cfg.city_key.clone(),
            }
        } else {
            return Err(Error::Other(
                "feed needs either feed.path or feed.url".to_string(),
            ));
        };
        Ok(Self::new(source))
    }

    pub fn source(&self) -> &FeedSource {
        &self.source
    }

    /// Load the whole document into memory.
    pub async fn fetch(&self) -> VomadridResult<Value> {
        match &self.source {
            FeedSource::File(path) => {
                tracing::debug!("Reading feed from '{}'", path.display());
                let bytes = tokio::fs::read(path).await?;
                Ok(serde_json::from_slice(&bytes)?)
            }
            FeedSource::Http { url, city_key } => self.request(url, city_key.as_deref()).await,
        }
    }

    async fn request(&self, url: &str, city_key: Option<&str>) -> VomadridResult<Value> {
        let req = match city_key {
            Some(city) => {
                tracing::debug!("POST {} (cityKey={})", url, city);
                self.client
                    .post(url)
                    .json(&serde_json::json!({ "cityKey": city }))
            }
            None => {
                tracing::debug!("GET {}", url);
                self.client.get(url)
            }
        };

        let resp = req.header("Accept", "application/json").send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Other(format!(
                "Feed request failed: HTTP {status} body={body}"
            )));
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
