//! Client of the claim indexing API.

use crate::{config::ClientConfig, error::Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use solana_sdk::{pubkey::Pubkey, signature::Signature};

pub const PAGE_SIZE: u32 = 50;

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    #[serde_as(as = "DisplayFromStr")]
    pub claimant: Pubkey,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub amount: u64,
    pub timestamp: i64,
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimPage {
    pub items: Vec<ClaimRecord>,
    #[serde(default)]
    pub next_page: Option<u32>,
}

#[async_trait]
pub trait ClaimHistory: Send + Sync {
    async fn claims(&self, claimant: &Pubkey, page: u32) -> Result<ClaimPage>;
}

#[derive(Clone)]
pub struct HistoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HistoryClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// `None` when no indexer is configured.
    pub fn from_config(client: reqwest::Client, config: &ClientConfig) -> Option<Self> {
        config
            .indexer_url
            .as_ref()
            .map(|url| Self::new(client, url.clone()))
    }

    pub fn url(&self) -> String {
        format!("{}/claims", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ClaimHistory for HistoryClient {
    async fn claims(&self, claimant: &Pubkey, page: u32) -> Result<ClaimPage> {
        let page = self
            .client
            .get(self.url())
            .query(&[
                ("claimant", claimant.to_string()),
                ("page", page.to_string()),
                ("page_size", PAGE_SIZE.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<ClaimPage>()
            .await?;
        Ok(page)
    }
}

/// Walk the claimant's history until `signature` shows up.
pub async fn find_claim(
    history: &dyn ClaimHistory,
    claimant: &Pubkey,
    signature: &Signature,
    max_pages: u32,
) -> Result<Option<ClaimRecord>> {
    let mut page = 0;
    for _ in 0..max_pages {
        let resp = history.claims(claimant, page).await?;
        if let Some(record) = resp.items.into_iter().find(|r| r.signature == *signature) {
            return Ok(Some(record));
        }
        match resp.next_page {
            Some(next) if next != page => page = next,
            _ => break,
        }
    }
    Ok(None)
}
