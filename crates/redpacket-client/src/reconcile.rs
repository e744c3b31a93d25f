//! Find out how much a submitted claim actually paid out.
//!
//! Confirmation polling and balance re-sampling are both bounded by
//! [`ReconcileConfig`]. Dropping a returned future stops polling; it has no
//! effect on the transaction itself.

use crate::{
    asset::balance,
    chain::{Chain, SignatureState},
    config::ReconcileConfig,
    error::{Error, Result},
    history::{find_claim, ClaimHistory},
};
use redpacket_lib::{AssetKind, Operation};
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::TransactionError};
use std::sync::Arc;

/// Pages of claim history searched before giving up.
const HISTORY_PAGES: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Pending { attempt: u32 },
    Confirmed,
    Failed(TransactionError),
    TimedOut,
}

pub async fn await_confirmation(
    chain: &dyn Chain,
    signature: &Signature,
    config: &ReconcileConfig,
) -> PollState {
    let mut state = PollState::Pending { attempt: 0 };
    while let PollState::Pending { attempt } = state {
        if attempt >= config.max_attempts {
            state = PollState::TimedOut;
            break;
        }
        if attempt > 0 {
            tokio::time::sleep(config.interval).await;
        }
        tracing::debug!("polling {}, attempt {}", signature, attempt + 1);
        state = match chain.get_signature_state(signature).await {
            Ok(SignatureState::Confirmed) => PollState::Confirmed,
            Ok(SignatureState::Failed(error)) => PollState::Failed(error),
            Ok(SignatureState::Pending) => PollState::Pending {
                attempt: attempt + 1,
            },
            Err(error) => {
                tracing::warn!("polling {} failed: {}", signature, error);
                PollState::Pending {
                    attempt: attempt + 1,
                }
            }
        };
    }
    state
}

/// Wait until `signature` is confirmed, failing with the classified
/// transaction error if it failed on chain.
pub async fn confirm(
    chain: &dyn Chain,
    signature: &Signature,
    config: &ReconcileConfig,
    operation: Operation,
) -> Result<bool> {
    match await_confirmation(chain, signature, config).await {
        PollState::Confirmed => Ok(true),
        PollState::Failed(error) => Err(Error::Transaction { error, operation }),
        PollState::Pending { .. } | PollState::TimedOut => Ok(false),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Balance went up by this much.
    Measured(u64),
    /// Balance did not move; the amount declared by the whitelist is used.
    Declared(u64),
    /// Amount found in the indexer's claim history.
    Indexed(u64),
    /// Confirmed, but the amount can't be told.
    AmountUnknown,
    /// Not confirmed within the attempt ceiling.
    Unconfirmed,
}

impl Reconciliation {
    pub fn amount(&self) -> u64 {
        match self {
            Reconciliation::Measured(amount)
            | Reconciliation::Declared(amount)
            | Reconciliation::Indexed(amount) => *amount,
            Reconciliation::AmountUnknown | Reconciliation::Unconfirmed => 0,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        !matches!(self, Reconciliation::Unconfirmed)
    }
}

#[derive(Clone, Default)]
pub struct Reconciler {
    pub config: ReconcileConfig,
    pub history: Option<Arc<dyn ClaimHistory>>,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            config,
            history: None,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn ClaimHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub async fn reconcile_claimed_amount(
        &self,
        chain: &dyn Chain,
        claimant: &Pubkey,
        asset: &AssetKind,
        before: u64,
        signature: &Signature,
        fallback: Option<u64>,
    ) -> Result<Reconciliation> {
        if !confirm(chain, signature, &self.config, Operation::Claim).await? {
            tracing::warn!("{} not confirmed", signature);
            return Ok(Reconciliation::Unconfirmed);
        }

        for attempt in 0..self.config.max_attempts.max(1) {
            if attempt > 0 {
                tokio::time::sleep(self.config.interval).await;
            }
            match balance(chain, claimant, asset).await {
                Ok(after) if after > before => {
                    return Ok(Reconciliation::Measured(after - before));
                }
                Ok(after) => tracing::debug!("balance of {} still {}", claimant, after),
                Err(error) => tracing::warn!("reading balance of {} failed: {}", claimant, error),
            }
        }

        if let Some(amount) = fallback {
            tracing::warn!("no balance change for {}, using declared amount", signature);
            return Ok(Reconciliation::Declared(amount));
        }

        if let Some(history) = &self.history {
            match find_claim(history.as_ref(), claimant, signature, HISTORY_PAGES).await {
                Ok(Some(record)) => return Ok(Reconciliation::Indexed(record.amount)),
                Ok(None) => {}
                Err(error) => tracing::warn!("claim history lookup failed: {}", error),
            }
        }

        Ok(Reconciliation::AmountUnknown)
    }
}
