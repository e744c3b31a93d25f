//! Request signatures from wallets whose secret key is not available locally.

use crate::utils::TowerClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as, DisplayFromStr, DurationSecondsWithFrac};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("can't sign for pubkey: {0}")]
    Pubkey(Pubkey),
    #[error("user rejected the signature request: {0}")]
    Rejected(String),
    #[error("timeout")]
    Timeout,
    #[error("wallet modified the transaction message")]
    MessageChanged,
    #[error("signer service stopped: {0}")]
    Worker(String),
}

pub type Svc = TowerClient<SignatureRequest, SignatureResponse, Error>;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureRequest {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time: DateTime<Utc>,
    #[serde_as(as = "DisplayFromStr")]
    pub pubkey: Pubkey,
    #[serde_as(as = "Base64")]
    pub message: bytes::Bytes,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub timeout: Duration,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureResponse {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    #[serde_as(as = "Option<Base64>")]
    pub new_message: Option<bytes::Bytes>,
}

fn worker_error(e: tower::BoxError) -> Error {
    Error::Worker(e.to_string())
}

pub fn from_service<S>(s: S) -> Svc
where
    S: tower::Service<SignatureRequest, Response = SignatureResponse, Error = Error>
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    Svc::from_service(s, worker_error)
}

/// Signer for contexts where every wallet is a local keypair.
pub fn unimplemented() -> Svc {
    Svc::unimplemented(|| Error::Rejected("no external signer".to_owned()), worker_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serde() {
        let req = SignatureRequest {
            time: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
            pubkey: Pubkey::new_from_array([1; 32]),
            message: bytes::Bytes::from_static(&[1, 2, 3]),
            timeout: Duration::from_millis(1500),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "time": 1_700_000_000_123i64,
                "pubkey": Pubkey::new_from_array([1; 32]).to_string(),
                "message": "AQID",
                "timeout": 1.5,
            })
        );
    }

    #[test]
    fn test_response_serde() {
        let sig = Signature::from([7u8; 64]);
        let resp: SignatureResponse =
            serde_json::from_value(json!({ "signature": sig.to_string() })).unwrap();
        assert_eq!(resp.signature, sig);
        assert!(resp.new_message.is_none());
    }
}
