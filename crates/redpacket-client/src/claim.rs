//! Claiming a share of a packet.

use crate::{
    asset::{balance, AssetResolver},
    config::ClientConfig,
    content::IpfsGateway,
    context::Context,
    error::{Error, Result},
    execute::Instructions,
    history::{ClaimHistory, HistoryClient},
    packet::{has_claimed, load_packet, LoadedPacket, PacketRef},
    reconcile::{Reconciler, Reconciliation},
    resolver::{Resolution, WhitelistCache, WhitelistResolver},
    wallet::Wallet,
};
use redpacket_lib::{
    instruction::{claim_sol, claim_spl, ClaimArgs, TokenAccounts},
    AllocationPolicy, AssetKind, Entitlement, ErrorKind, Operation, PacketIdentity,
};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

/// Claims currently being processed, by (packet address, claimant).
#[derive(Debug, Clone, Default)]
pub struct InFlightClaims {
    inner: Arc<Mutex<HashSet<(Pubkey, Pubkey)>>>,
}

impl InFlightClaims {
    /// `None` when a claim for the pair is already in flight.
    pub fn try_acquire(&self, packet: Pubkey, claimant: Pubkey) -> Option<InFlightGuard> {
        let key = (packet, claimant);
        let inserted = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
        inserted.then(|| InFlightGuard {
            claims: self.clone(),
            key,
        })
    }

    pub fn is_in_flight(&self, packet: &Pubkey, claimant: &Pubkey) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(*packet, *claimant))
    }
}

/// Releases the pair when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    claims: InFlightClaims,
    key: (Pubkey, Pubkey),
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.claims
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub packet: PacketRef,
    pub claimant: Wallet,
    /// Entitlement obtained elsewhere, checked against the packet's root.
    pub entitlement: Option<Entitlement>,
    /// Where the whitelist payload can be fetched from.
    pub content_id: Option<String>,
}

impl ClaimRequest {
    pub fn new(packet: impl Into<PacketRef>, claimant: Wallet) -> Self {
        Self {
            packet: packet.into(),
            claimant,
            entitlement: None,
            content_id: None,
        }
    }
}

/// What the reconciler needs to know about a submitted claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub signature: Signature,
    pub packet: PacketIdentity,
    pub packet_address: Pubkey,
    pub claimant: Pubkey,
    pub asset: AssetKind,
    pub balance_before: u64,
    /// Fixed amount of a whitelist claim.
    pub declared_amount: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub receipt: ClaimReceipt,
    pub reconciliation: Reconciliation,
}

#[derive(Clone)]
pub struct ClaimOrchestrator {
    resolver: WhitelistResolver,
    assets: AssetResolver,
    in_flight: InFlightClaims,
    history: Option<Arc<dyn ClaimHistory>>,
}

impl ClaimOrchestrator {
    pub fn new(resolver: WhitelistResolver, assets: AssetResolver) -> Self {
        Self {
            resolver,
            assets,
            in_flight: InFlightClaims::default(),
            history: None,
        }
    }

    /// Whitelists come from the configured IPFS gateway. Claim history is
    /// used when an indexer is configured.
    pub fn from_config(config: &ClientConfig) -> Self {
        let client = reqwest::Client::new();
        let store = Arc::new(IpfsGateway::from_config(client.clone(), config));
        let claims = Self::new(
            WhitelistResolver::new(store, WhitelistCache::default()),
            AssetResolver::default(),
        );
        match HistoryClient::from_config(client, config) {
            Some(history) => claims.with_history(Arc::new(history)),
            None => claims,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn ClaimHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn in_flight(&self) -> &InFlightClaims {
        &self.in_flight
    }

    fn acquire(&self, request: &ClaimRequest) -> Result<InFlightGuard> {
        self.in_flight
            .try_acquire(request.packet.address(), request.claimant.pubkey())
            .ok_or(Error::rejected(ErrorKind::ClaimInProgress))
    }

    /// Submit one claim transaction. Does not wait for confirmation.
    pub async fn claim(&self, ctx: &Context, request: ClaimRequest) -> Result<ClaimReceipt> {
        let _guard = self.acquire(&request)?;
        self.submit(ctx, request).await
    }

    /// Claim, then find out how much was received.
    pub async fn claim_and_reconcile(
        &self,
        ctx: &Context,
        request: ClaimRequest,
    ) -> Result<ClaimOutcome> {
        let _guard = self.acquire(&request)?;
        let receipt = self.submit(ctx, request).await?;
        let reconciler = Reconciler {
            config: ctx.config.reconcile.clone(),
            history: self.history.clone(),
        };
        let reconciliation = reconciler
            .reconcile_claimed_amount(
                ctx.chain.as_ref(),
                &receipt.claimant,
                &receipt.asset,
                receipt.balance_before,
                &receipt.signature,
                receipt.declared_amount,
            )
            .await?;
        tracing::info!(
            "claim {} of {} reconciled: {:?}",
            receipt.signature,
            receipt.packet,
            reconciliation
        );
        Ok(ClaimOutcome {
            receipt,
            reconciliation,
        })
    }

    async fn submit(&self, ctx: &Context, request: ClaimRequest) -> Result<ClaimReceipt> {
        let chain = ctx.chain.as_ref();
        let claimant = request.claimant.pubkey();
        let packet = load_packet(chain, &request.packet).await?;
        let record = &packet.record;

        if record.is_fully_claimed() {
            return Err(Error::rejected(ErrorKind::FullyClaimed));
        }
        if record.is_expired(ctx.now().await?) {
            return Err(Error::rejected(ErrorKind::Expired));
        }
        if has_claimed(chain, &packet, &claimant).await? {
            return Err(Error::rejected(ErrorKind::AlreadyClaimed));
        }

        let entitlement = match record.allocation_policy {
            AllocationPolicy::WhitelistFixed => {
                Some(self.entitlement(&packet, &claimant, &request).await?)
            }
            AllocationPolicy::Equal | AllocationPolicy::PseudoRandom => None,
        };
        let declared_amount = entitlement.as_ref().map(|e| e.amount);
        let args = ClaimArgs {
            amount: declared_amount,
            proof: entitlement.map(|e| e.proof),
            packet_id: packet.identity.packet_id,
        };

        let asset = self.assets.resolve(chain, record).await?;
        let ix = match asset {
            AssetKind::Native => claim_sol(&packet.identity, &packet.address, &claimant, &args)?,
            AssetKind::Fungible { mint, program, .. } => {
                let tokens = TokenAccounts::derive(&packet.address, &claimant, &mint, &program.id());
                claim_spl(&packet.identity, &packet.address, &claimant, &tokens, &args)?
            }
        };

        let balance_before = balance(chain, &claimant, &asset).await?;

        tracing::info!("claiming {} for {}", packet.identity, claimant);
        let signature = ctx
            .execute(Instructions::new(request.claimant, vec![ix]), Operation::Claim)
            .await?;

        Ok(ClaimReceipt {
            signature,
            packet: packet.identity,
            packet_address: packet.address,
            claimant,
            asset,
            balance_before,
            declared_amount,
        })
    }

    async fn entitlement(
        &self,
        packet: &LoadedPacket,
        claimant: &Pubkey,
        request: &ClaimRequest,
    ) -> Result<Entitlement> {
        let root = packet
            .record
            .merkle_root
            .ok_or(Error::rejected(ErrorKind::WhitelistIntegrityMismatch))?;

        if let Some(entitlement) = &request.entitlement {
            if entitlement.claimant != *claimant {
                return Err(Error::rejected(ErrorKind::NotWhitelisted));
            }
            if !entitlement.verify(&root) {
                return Err(Error::rejected(ErrorKind::WhitelistIntegrityMismatch));
            }
            return Ok(entitlement.clone());
        }

        match self
            .resolver
            .resolve(
                &packet.identity,
                claimant,
                request.content_id.as_deref(),
                &root,
            )
            .await?
        {
            Resolution::Entitled(entitlement) => Ok(entitlement),
            Resolution::NotFound => Err(Error::rejected(ErrorKind::NotWhitelisted)),
        }
    }
}
