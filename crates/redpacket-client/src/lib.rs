//! Client side of the red packet program: reading packets, claiming,
//! refunding and creating them.
//!
//! Table of contents:
//! - [`context`]: chain, signer and configuration shared by all operations.
//! - [`claim`], [`refund`], [`create`]: the user-facing operations.
//! - [`reconcile`]: confirming transactions and measuring claimed amounts.
//! - [`resolver`], [`content`]: fetching and caching whitelists.
//! - [`packet`], [`asset`]: reading on-chain state.
//! - [`execute`], [`signer`], [`wallet`]: building, signing and sending transactions.
//! - [`history`]: the claim indexer.

pub mod asset;
pub mod chain;
pub mod claim;
pub mod config;
pub mod content;
pub mod context;
pub mod create;
pub mod error;
pub mod execute;
pub mod history;
pub mod packet;
pub mod reconcile;
pub mod refund;
pub mod resolver;
pub mod signer;
pub mod utils;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use chain::{Chain, SignatureState};
pub use claim::{ClaimOrchestrator, ClaimOutcome, ClaimReceipt, ClaimRequest};
pub use config::{ClientConfig, ReconcileConfig};
pub use context::Context;
pub use create::{CreateAsset, CreateOrchestrator, CreatePolicy, CreateRequest, CreatedPacket};
pub use error::{Error, Result};
pub use packet::{LoadedPacket, PacketRef};
pub use reconcile::{Reconciler, Reconciliation};
pub use refund::RefundOrchestrator;
pub use resolver::{WhitelistCache, WhitelistResolver};
pub use wallet::Wallet;

pub use redpacket_lib::{self, ErrorKind, Operation, PacketIdentity};
