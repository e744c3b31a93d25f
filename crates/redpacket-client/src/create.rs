//! Creating packets.

use crate::{
    asset::AssetResolver,
    context::Context,
    error::{Error, Result},
    execute::Instructions,
    packet::load_creator_state,
    reconcile::confirm,
    wallet::Wallet,
};
use redpacket_lib::{
    allocation::to_base_units,
    instruction::{
        create_sol_red_packet, create_spl_red_packet, initialize_user_state, CreateArgs,
        TokenAccounts,
    },
    plan_allocations,
    whitelist::WhitelistDocument,
    AllocationInput, AllocationPolicy, AssetKind, Decimal, Hash32, Operation, PacketIdentity,
};
use solana_sdk::{pubkey::Pubkey, signature::Signature};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateAsset {
    Native,
    Fungible(Pubkey),
}

/// How the pool is shared. Amounts are in UI units of the asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatePolicy {
    Equal {
        total: Decimal,
        count: u32,
    },
    PseudoRandom {
        total: Decimal,
        count: u32,
        seed: Option<u64>,
    },
    /// One share per entry; the total is the sum of the planned allocations.
    Whitelist { entries: Vec<AllocationInput> },
}

#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub creator: Wallet,
    pub asset: CreateAsset,
    pub policy: CreatePolicy,
    pub expiry_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPacket {
    pub identity: PacketIdentity,
    pub address: Pubkey,
    pub signature: Signature,
    pub asset: AssetKind,
    pub total_amount: u64,
    pub packet_count: u32,
    /// Planned whitelist, to be published for claimants.
    pub whitelist: Option<WhitelistDocument>,
    pub merkle_root: Option<Hash32>,
}

struct Plan {
    policy: AllocationPolicy,
    total_amount: u64,
    packet_count: u32,
    random_seed: Option<u64>,
    whitelist: Option<WhitelistDocument>,
}

fn invalid(message: &str) -> Error {
    Error::InvalidInput(message.to_owned())
}

fn plan(policy: &CreatePolicy, decimals: u8) -> Result<Plan> {
    let shared = |policy, total: &Decimal, count: u32, random_seed| -> Result<Plan> {
        if count == 0 {
            return Err(invalid("packet count must be positive"));
        }
        let total_amount = to_base_units(*total, decimals)?;
        if total_amount == 0 {
            return Err(invalid("total amount must be positive"));
        }
        Ok(Plan {
            policy,
            total_amount,
            packet_count: count,
            random_seed,
            whitelist: None,
        })
    };

    match policy {
        CreatePolicy::Equal { total, count } => shared(AllocationPolicy::Equal, total, *count, None),
        CreatePolicy::PseudoRandom { total, count, seed } => {
            shared(AllocationPolicy::PseudoRandom, total, *count, *seed)
        }
        CreatePolicy::Whitelist { entries } => {
            let planned = plan_allocations(entries, decimals)?;
            let doc = WhitelistDocument::new(planned, Some(decimals))?;
            let total_amount = doc
                .total()
                .ok_or(redpacket_lib::Error::AmountOverflow)?;
            if total_amount == 0 {
                return Err(invalid("total amount must be positive"));
            }
            let packet_count = u32::try_from(doc.entries.len())
                .map_err(|_| invalid("too many whitelist entries"))?;
            Ok(Plan {
                policy: AllocationPolicy::WhitelistFixed,
                total_amount,
                packet_count,
                random_seed: None,
                whitelist: Some(doc),
            })
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateOrchestrator {
    assets: AssetResolver,
}

impl CreateOrchestrator {
    pub fn new(assets: AssetResolver) -> Self {
        Self { assets }
    }

    pub async fn create(&self, ctx: &Context, request: CreateRequest) -> Result<CreatedPacket> {
        let chain = ctx.chain.as_ref();
        let program_id = ctx.program_id();
        let creator = request.creator.pubkey();

        let asset = match request.asset {
            CreateAsset::Native => AssetKind::Native,
            CreateAsset::Fungible(mint) => self.assets.resolve_mint(chain, &mint).await?,
        };
        let plan = plan(&request.policy, asset.decimals())?;
        let merkle_root = plan.whitelist.as_ref().and_then(|doc| doc.merkle_root);

        let mut instructions = Vec::with_capacity(2);
        let packet_id = match load_creator_state(chain, &program_id, &creator).await? {
            Some(state) => state.next_packet_id,
            None => {
                instructions.push(initialize_user_state(&program_id, &creator));
                0
            }
        };
        let identity = PacketIdentity::new(program_id, creator, packet_id);
        let address = identity.address();

        let args = CreateArgs {
            total_amount: plan.total_amount,
            packet_count: plan.packet_count,
            allocation_policy: plan.policy as u8,
            merkle_root,
            expiry_days: request.expiry_days,
            random_seed: plan.random_seed,
        };
        instructions.push(match asset {
            AssetKind::Native => create_sol_red_packet(&identity, &address, &args)?,
            AssetKind::Fungible { mint, program, .. } => {
                let tokens = TokenAccounts::derive(&address, &creator, &mint, &program.id());
                create_spl_red_packet(&identity, &address, &tokens, &args)?
            }
        });

        tracing::info!(
            "creating {} at {}: {} base units in {} shares",
            identity,
            address,
            plan.total_amount,
            plan.packet_count
        );
        let signature = ctx
            .execute(Instructions::new(request.creator, instructions), Operation::Create)
            .await?;
        if !confirm(chain, &signature, &ctx.config.reconcile, Operation::Create).await? {
            tracing::warn!("creation of {} not confirmed yet", identity);
        }

        Ok(CreatedPacket {
            identity,
            address,
            signature,
            asset,
            total_amount: plan.total_amount,
            packet_count: plan.packet_count,
            whitelist: plan.whitelist,
            merkle_root,
        })
    }
}
