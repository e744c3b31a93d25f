//! Instruction builders.
//!
//! Data is the Anchor discriminator followed by the borsh encoded arguments.
//! Account order follows the program's account structs.

use crate::{
    consts::{
        ASSOCIATED_TOKEN_PROGRAM_ID, IX_CLAIM_SOL, IX_CLAIM_SPL, IX_CREATE_SOL, IX_CREATE_SPL,
        IX_INITIALIZE_USER_STATE, IX_REFUND_SOL, IX_REFUND_SPL, SYSTEM_PROGRAM_ID,
    },
    error::Result,
    merkle::Hash32,
    pda::{derive_claimant_state_address, derive_creator_state_address, token_account_address},
    PacketIdentity,
};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

/// Compute Anchor 8-byte instruction discriminator: sha256("global:{name}")[..8]
pub fn anchor_discriminator(name: &str) -> [u8; 8] {
    let preimage = format!("global:{}", name);
    let hash = solana_program::hash::hash(preimage.as_bytes());
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash.to_bytes()[..8]);
    disc
}

fn data<T: BorshSerialize>(name: &str, args: &T) -> Result<Vec<u8>> {
    let mut data = anchor_discriminator(name).to_vec();
    data.extend(borsh::to_vec(args)?);
    Ok(data)
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ClaimArgs {
    pub amount: Option<u64>,
    pub proof: Option<Vec<Hash32>>,
    pub packet_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct RefundArgs {
    pub packet_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CreateArgs {
    pub total_amount: u64,
    pub packet_count: u32,
    pub allocation_policy: u8,
    pub merkle_root: Option<Hash32>,
    pub expiry_days: Option<i64>,
    pub random_seed: Option<u64>,
}

/// Token accounts involved in moving a fungible asset between a packet's pool
/// and a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccounts {
    pub mint: Pubkey,
    pub token_program: Pubkey,
    pub pool: Pubkey,
    pub wallet: Pubkey,
}

impl TokenAccounts {
    pub fn derive(packet: &Pubkey, wallet: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Self {
        Self {
            mint: *mint,
            token_program: *token_program,
            pool: token_account_address(packet, mint, token_program),
            wallet: token_account_address(wallet, mint, token_program),
        }
    }
}

pub fn claim_sol(
    packet: &PacketIdentity,
    address: &Pubkey,
    claimant: &Pubkey,
    args: &ClaimArgs,
) -> Result<Instruction> {
    let (claimant_state, _) =
        derive_claimant_state_address(&packet.program_id, address, claimant);
    let accounts = vec![
        AccountMeta::new(*address, false),                    // red_packet
        AccountMeta::new(claimant_state, false),              // claimer_state
        AccountMeta::new(*claimant, true),                    // claimer
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),  // system_program
    ];
    Ok(Instruction {
        program_id: packet.program_id,
        accounts,
        data: data(IX_CLAIM_SOL, args)?,
    })
}

pub fn claim_spl(
    packet: &PacketIdentity,
    address: &Pubkey,
    claimant: &Pubkey,
    tokens: &TokenAccounts,
    args: &ClaimArgs,
) -> Result<Instruction> {
    let (claimant_state, _) =
        derive_claimant_state_address(&packet.program_id, address, claimant);
    let accounts = vec![
        AccountMeta::new(*address, false),                              // red_packet
        AccountMeta::new(claimant_state, false),                        // claimer_state
        AccountMeta::new_readonly(tokens.mint, false),                  // mint
        AccountMeta::new(tokens.pool, false),                           // pool_ata
        AccountMeta::new(tokens.wallet, false),                         // claimer_ata
        AccountMeta::new(*claimant, true),                              // claimer
        AccountMeta::new_readonly(tokens.token_program, false),         // token_program
        AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false),  // associated_token_program
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),            // system_program
    ];
    Ok(Instruction {
        program_id: packet.program_id,
        accounts,
        data: data(IX_CLAIM_SPL, args)?,
    })
}

pub fn refund_sol(packet: &PacketIdentity, address: &Pubkey) -> Result<Instruction> {
    let accounts = vec![
        AccountMeta::new(*address, false),                    // red_packet
        AccountMeta::new(packet.creator, true),               // creator
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),  // system_program
    ];
    Ok(Instruction {
        program_id: packet.program_id,
        accounts,
        data: data(
            IX_REFUND_SOL,
            &RefundArgs {
                packet_id: packet.packet_id,
            },
        )?,
    })
}

pub fn refund_spl(
    packet: &PacketIdentity,
    address: &Pubkey,
    tokens: &TokenAccounts,
) -> Result<Instruction> {
    let accounts = vec![
        AccountMeta::new(*address, false),                              // red_packet
        AccountMeta::new_readonly(tokens.mint, false),                  // mint
        AccountMeta::new(tokens.pool, false),                           // pool_ata
        AccountMeta::new(tokens.wallet, false),                         // creator_ata
        AccountMeta::new(packet.creator, true),                         // creator
        AccountMeta::new_readonly(tokens.token_program, false),         // token_program
        AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false),  // associated_token_program
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),            // system_program
    ];
    Ok(Instruction {
        program_id: packet.program_id,
        accounts,
        data: data(
            IX_REFUND_SPL,
            &RefundArgs {
                packet_id: packet.packet_id,
            },
        )?,
    })
}

pub fn initialize_user_state(program_id: &Pubkey, creator: &Pubkey) -> Instruction {
    let (user_state, _) = derive_creator_state_address(program_id, creator);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(user_state, false),                  // user_state
            AccountMeta::new(*creator, true),                     // creator
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),  // system_program
        ],
        data: anchor_discriminator(IX_INITIALIZE_USER_STATE).to_vec(),
    }
}

pub fn create_sol_red_packet(
    packet: &PacketIdentity,
    address: &Pubkey,
    args: &CreateArgs,
) -> Result<Instruction> {
    let (user_state, _) = derive_creator_state_address(&packet.program_id, &packet.creator);
    let accounts = vec![
        AccountMeta::new(user_state, false),                  // user_state
        AccountMeta::new(*address, false),                    // red_packet
        AccountMeta::new(packet.creator, true),               // creator
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),  // system_program
    ];
    Ok(Instruction {
        program_id: packet.program_id,
        accounts,
        data: data(IX_CREATE_SOL, args)?,
    })
}

pub fn create_spl_red_packet(
    packet: &PacketIdentity,
    address: &Pubkey,
    tokens: &TokenAccounts,
    args: &CreateArgs,
) -> Result<Instruction> {
    let (user_state, _) = derive_creator_state_address(&packet.program_id, &packet.creator);
    let accounts = vec![
        AccountMeta::new(user_state, false),                            // user_state
        AccountMeta::new(*address, false),                              // red_packet
        AccountMeta::new_readonly(tokens.mint, false),                  // mint
        AccountMeta::new(tokens.wallet, false),                         // creator_ata
        AccountMeta::new(tokens.pool, false),                           // pool_ata
        AccountMeta::new(packet.creator, true),                         // creator
        AccountMeta::new_readonly(tokens.token_program, false),         // token_program
        AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false),  // associated_token_program
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),            // system_program
    ];
    Ok(Instruction {
        program_id: packet.program_id,
        accounts,
        data: data(IX_CREATE_SPL, args)?,
    })
}
