//! Content-addressed storage of whitelist payloads.

use crate::{config::ClientConfig, error::Result};
use async_trait::async_trait;
use redpacket_lib::whitelist::WhitelistDocument;
use reqwest::StatusCode;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// `Ok(None)` when the store has nothing under `content_id`.
    async fn fetch_payload(&self, content_id: &str) -> Result<Option<WhitelistDocument>>;
}

/// Reads payloads through an HTTP IPFS gateway.
#[derive(Clone)]
pub struct IpfsGateway {
    client: reqwest::Client,
    gateway: String,
}

impl IpfsGateway {
    pub fn new(client: reqwest::Client, gateway: impl Into<String>) -> Self {
        Self {
            client,
            gateway: gateway.into(),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self::new(client, config.ipfs_gateway.clone())
    }

    pub fn url(&self, content_id: &str) -> String {
        format!(
            "{}/ipfs/{}",
            self.gateway.trim_end_matches('/'),
            content_id.trim_start_matches("ipfs://")
        )
    }
}

#[async_trait]
impl ContentStore for IpfsGateway {
    async fn fetch_payload(&self, content_id: &str) -> Result<Option<WhitelistDocument>> {
        let url = self.url(content_id);
        tracing::debug!("fetching whitelist {}", url);
        let resp = self.client.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = resp.error_for_status()?.bytes().await?;
        Ok(Some(WhitelistDocument::parse(&body)?))
    }
}
