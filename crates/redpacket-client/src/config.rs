use crate::error::{Error, Result};
use redpacket_lib::consts::PROGRAM_ID;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, DurationSecondsWithFrac};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
};
use std::{collections::HashMap, str::FromStr, time::Duration};

/// Environment variables read by [`ClientConfig::from_env`].
pub mod env {
    pub const RPC_URL: &str = "RPC_URL";
    pub const PROGRAM_ID: &str = "RED_PACKET_PROGRAM_ID";
    pub const IPFS_GATEWAY: &str = "IPFS_GATEWAY";
    pub const INDEXER_URL: &str = "INDEXER_URL";
    pub const TX_COMMITMENT_LEVEL: &str = "TX_COMMITMENT_LEVEL";
    pub const RECONCILE_ATTEMPTS: &str = "RECONCILE_ATTEMPTS";
    pub const RECONCILE_INTERVAL: &str = "RECONCILE_INTERVAL";
    pub const SIGNATURE_TIMEOUT: &str = "SIGNATURE_TIMEOUT";
}

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io";
pub const SIGNATURE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Bounds of confirmation polling and balance re-sampling.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReconcileConfig {
    pub max_attempts: u32,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub interval: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(2),
        }
    }
}

/// Missing fields take their [`Default`] value.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub rpc_url: String,
    #[serde_as(as = "DisplayFromStr")]
    pub program_id: Pubkey,
    pub ipfs_gateway: String,
    pub indexer_url: Option<String>,
    pub tx_commitment_level: CommitmentLevel,
    pub reconcile: ReconcileConfig,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub signature_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_owned(),
            program_id: PROGRAM_ID,
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_owned(),
            indexer_url: None,
            tx_commitment_level: CommitmentLevel::Confirmed,
            reconcile: ReconcileConfig::default(),
            signature_timeout: SIGNATURE_TIMEOUT,
        }
    }
}

fn parse<T>(env: &HashMap<String, String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env.get(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|error| Error::Config(format!("{key}: {error}")))
        })
        .transpose()
}

fn parse_duration(env: &HashMap<String, String>, key: &str) -> Result<Option<Duration>> {
    match parse::<f64>(env, key)? {
        Some(secs) => Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|error| Error::Config(format!("{key}: {error}"))),
        None => Ok(None),
    }
}

impl ClientConfig {
    /// Unset keys keep their default value.
    pub fn from_env(env: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = env.get(env::RPC_URL) {
            config.rpc_url = url.clone();
        }
        if let Some(program_id) = parse(env, env::PROGRAM_ID)? {
            config.program_id = program_id;
        }
        if let Some(url) = env.get(env::IPFS_GATEWAY) {
            config.ipfs_gateway = url.clone();
        }
        config.indexer_url = env
            .get(env::INDEXER_URL)
            .filter(|url| !url.is_empty())
            .cloned();
        if let Some(level) = parse(env, env::TX_COMMITMENT_LEVEL)? {
            config.tx_commitment_level = level;
        }
        if let Some(attempts) = parse(env, env::RECONCILE_ATTEMPTS)? {
            config.reconcile.max_attempts = attempts;
        }
        if let Some(interval) = parse_duration(env, env::RECONCILE_INTERVAL)? {
            config.reconcile.interval = interval;
        }
        if let Some(timeout) = parse_duration(env, env::SIGNATURE_TIMEOUT)? {
            config.signature_timeout = timeout;
        }
        Ok(config)
    }

    pub fn commitment(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.tx_commitment_level,
        }
    }

    pub fn rpc_client(&self) -> RpcClient {
        RpcClient::new_with_commitment(self.rpc_url.clone(), self.commitment())
    }
}
