// Red packet program
//
// Anchor program; instruction data is `sha256("global:{name}")[..8]` followed
// by the borsh encoded arguments, accounts start with
// `sha256("account:{Name}")[..8]`.

use solana_program::{pubkey, pubkey::Pubkey};

// =============================================================================
// Program Constants
// =============================================================================

/// Default deployment of the red packet program
pub const PROGRAM_ID: Pubkey = pubkey!("ELrAoEkxF7j4RwRmTndBrybARdHTsSphB6jNnNiMqmWj");

/// System Program ID
pub const SYSTEM_PROGRAM_ID: Pubkey = pubkey!("11111111111111111111111111111111");

/// Token Program ID
pub const TOKEN_PROGRAM_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// Token-2022 Program ID
pub const TOKEN_2022_PROGRAM_ID: Pubkey = pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");

/// Associated Token Account Program ID
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// Decimals of the native asset (lamports per SOL = 10^9)
pub const NATIVE_DECIMALS: u8 = 9;

// =============================================================================
// PDA Seeds
// =============================================================================

pub const SEED_RED_PACKET: &[u8] = b"red_packet";
pub const SEED_CLAIMER: &[u8] = b"claimer";
pub const SEED_USER_STATE: &[u8] = b"user_state";

// =============================================================================
// Instruction names
// =============================================================================

pub const IX_CLAIM_SOL: &str = "claim_sol";
pub const IX_CLAIM_SPL: &str = "claim_spl";
pub const IX_REFUND_SOL: &str = "refund_sol";
pub const IX_REFUND_SPL: &str = "refund_spl";
pub const IX_INITIALIZE_USER_STATE: &str = "initialize_user_state";
pub const IX_CREATE_SOL: &str = "create_sol_red_packet";
pub const IX_CREATE_SPL: &str = "create_spl_red_packet";

// =============================================================================
// Account discriminators
// =============================================================================

/// `sha256("account:RedPacket")[..8]`
pub const RED_PACKET_DISCRIMINATOR: [u8; 8] = [51, 197, 171, 232, 223, 81, 121, 248];

/// `sha256("account:UserState")[..8]`
pub const USER_STATE_DISCRIMINATOR: [u8; 8] = [72, 177, 85, 249, 76, 167, 186, 126];

// =============================================================================
// Program error codes
// =============================================================================

/// First custom error code of an Anchor program.
pub const ANCHOR_ERROR_OFFSET: u32 = 6000;
