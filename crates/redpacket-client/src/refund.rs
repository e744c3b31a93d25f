//! Refunding what is left in an expired packet to its creator.

use crate::{
    asset::AssetResolver,
    context::Context,
    error::{Error, Result},
    execute::Instructions,
    packet::{load_packet, PacketRef},
    reconcile::confirm,
    wallet::Wallet,
};
use redpacket_lib::{
    instruction::{refund_sol, refund_spl, TokenAccounts},
    AssetKind, ErrorKind, Operation, RefundEligibility,
};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

/// Refunds a packet at most once per instance.
#[derive(Debug, Clone, Default)]
pub struct RefundOrchestrator {
    assets: AssetResolver,
    submitted: Arc<Mutex<HashSet<Pubkey>>>,
}

impl RefundOrchestrator {
    pub fn new(assets: AssetResolver) -> Self {
        Self {
            assets,
            submitted: <_>::default(),
        }
    }

    fn submitted(&self) -> std::sync::MutexGuard<'_, HashSet<Pubkey>> {
        self.submitted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_submitted(&self, packet: &Pubkey) -> bool {
        self.submitted().contains(packet)
    }

    /// Refund and wait for confirmation within the reconcile bounds.
    pub async fn refund(&self, ctx: &Context, packet: PacketRef, creator: Wallet) -> Result<Signature> {
        let identity = *packet.identity();
        let address = packet.address();
        if creator.pubkey() != identity.creator {
            return Err(Error::rejected(ErrorKind::Unauthorized));
        }
        if !self.submitted().insert(address) {
            return Err(Error::rejected(ErrorKind::AlreadyRefunded));
        }

        let result = self.submit(ctx, &packet, creator).await;
        if let Err(error) = &result {
            // keep the packet marked when the refund may have gone through
            if !matches!(
                error.kind(),
                ErrorKind::AmbiguousOutcome | ErrorKind::AlreadyRefunded
            ) {
                self.submitted().remove(&address);
            }
        }
        result
    }

    async fn submit(&self, ctx: &Context, packet: &PacketRef, creator: Wallet) -> Result<Signature> {
        let chain = ctx.chain.as_ref();
        let loaded = load_packet(chain, packet).await?;

        match loaded.record.refund_eligibility(ctx.now().await?) {
            RefundEligibility::Eligible { amount } => {
                tracing::info!("refunding {} of {} to {}", amount, loaded.identity, creator.pubkey());
            }
            RefundEligibility::NotYetExpired { .. } => {
                return Err(Error::rejected(ErrorKind::NotYetExpired))
            }
            RefundEligibility::NothingLeft => return Err(Error::rejected(ErrorKind::FullyClaimed)),
            RefundEligibility::AlreadyWithdrawn => {
                return Err(Error::rejected(ErrorKind::AlreadyRefunded))
            }
        }

        let asset = self.assets.resolve(chain, &loaded.record).await?;
        let ix = match asset {
            AssetKind::Native => refund_sol(&loaded.identity, &loaded.address)?,
            AssetKind::Fungible { mint, program, .. } => {
                let tokens =
                    TokenAccounts::derive(&loaded.address, &creator.pubkey(), &mint, &program.id());
                refund_spl(&loaded.identity, &loaded.address, &tokens)?
            }
        };

        let signature = ctx
            .execute(Instructions::new(creator, vec![ix]), Operation::Refund)
            .await?;
        if !confirm(chain, &signature, &ctx.config.reconcile, Operation::Refund).await? {
            tracing::warn!("refund {} not confirmed yet", signature);
        }
        Ok(signature)
    }
}
