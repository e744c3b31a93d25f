//! Seam between the orchestrators and the Solana RPC.

use async_trait::async_trait;
use solana_client::{client_error::ClientError, nonblocking::rpc_client::RpcClient};
use solana_sdk::{
    account::Account, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::{Transaction, TransactionError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    /// Unknown to the node, or not yet at the required commitment.
    Pending,
    Confirmed,
    Failed(TransactionError),
}

#[async_trait]
pub trait Chain: Send + Sync {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, ClientError>;

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, ClientError>;

    async fn get_latest_blockhash(&self) -> Result<Hash, ClientError>;

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, ClientError>;

    async fn get_signature_state(&self, signature: &Signature)
        -> Result<SignatureState, ClientError>;

    /// Current unix time, compared against packet expiry.
    async fn unix_timestamp(&self) -> Result<i64, ClientError> {
        Ok(chrono::Utc::now().timestamp())
    }
}

#[async_trait]
impl Chain for RpcClient {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, ClientError> {
        tracing::debug!("get_account {}", address);
        Ok(self
            .get_account_with_commitment(address, self.commitment())
            .await?
            .value)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, ClientError> {
        RpcClient::get_balance(self, address).await
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ClientError> {
        RpcClient::get_latest_blockhash(self).await
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, ClientError> {
        RpcClient::send_transaction(self, tx).await
    }

    async fn get_signature_state(
        &self,
        signature: &Signature,
    ) -> Result<SignatureState, ClientError> {
        let status = self
            .get_signature_statuses(&[*signature])
            .await?
            .value
            .into_iter()
            .next()
            .flatten();
        Ok(match status {
            None => SignatureState::Pending,
            Some(status) => match status.err {
                Some(error) => SignatureState::Failed(error),
                None if status.satisfies_commitment(self.commitment()) => {
                    SignatureState::Confirmed
                }
                None => SignatureState::Pending,
            },
        })
    }
}
