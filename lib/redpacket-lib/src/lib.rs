//! Protocol core for the red packet program.
//!
//! Everything in this crate is pure: no network access, no clocks.
//!
//! Table of contents:
//! - [`pda`]: deterministic program addresses.
//! - [`allocation`]: converting fractional amounts into base units.
//! - [`merkle`]: whitelist Merkle tree and proofs.
//! - [`whitelist`]: whitelist entries, payloads and entitlements.
//! - [`asset`]: native vs fungible assets and token programs.
//! - [`state`]: decoding on-chain accounts.
//! - [`instruction`]: building program instructions.
//! - [`error`]: error types and failure classification.

pub mod allocation;
pub mod asset;
pub mod consts;
pub mod error;
pub mod instruction;
pub mod merkle;
pub mod pda;
pub mod state;
pub mod whitelist;

pub use allocation::{plan_allocations, AllocationInput};
pub use asset::{AssetKind, TokenProgram};
pub use error::{Error, ErrorKind, Operation, Result};
pub use merkle::{Hash32, MerkleTree};
pub use pda::PacketIdentity;
pub use state::{AllocationPolicy, AssetType, CreatorState, PacketRecord, RefundEligibility};
pub use whitelist::{Entitlement, WhitelistEntry};

pub use rust_decimal::Decimal;
pub use solana_program::pubkey::Pubkey;
