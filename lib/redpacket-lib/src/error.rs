use crate::consts::ANCHOR_ERROR_OFFSET;
use serde::{Deserialize, Serialize};
use solana_program::instruction::InstructionError;
use solana_sdk::transaction::TransactionError;
use std::result::Result as StdResult;
use thiserror::Error as ThisError;

pub type Result<T> = StdResult<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
    #[error("allocation list is empty")]
    EmptyAllocationList,
    #[error("negative amount at entry {index}")]
    NegativeAmount { index: usize },
    #[error("unsupported decimals: {0}")]
    InvalidDecimals(u8),
    #[error("amount does not fit in u64 base units")]
    AmountOverflow,
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("whitelist is empty")]
    EmptyWhitelist,
    #[error("invalid whitelist payload: {0}")]
    InvalidWhitelistPayload(String),
    #[error("account {name} has invalid data: {reason}")]
    InvalidAccountData { name: &'static str, reason: String },
    #[error("invalid allocation policy: {0}")]
    InvalidAllocationPolicy(u8),
    #[error("invalid asset type: {0}")]
    InvalidAssetType(u8),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Program(#[from] solana_program::program_error::ProgramError),
}

impl Error {
    pub fn account_data(name: &'static str, reason: impl ToString) -> Self {
        Self::InvalidAccountData {
            name,
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidIdentity(_)
            | Error::EmptyAllocationList
            | Error::NegativeAmount { .. }
            | Error::InvalidDecimals(_)
            | Error::AmountOverflow
            | Error::InvalidAmount(_)
            | Error::EmptyWhitelist
            | Error::InvalidWhitelistPayload(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::Fatal { code: None },
        }
    }
}

/// Closed set of failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ErrorKind {
    AlreadyClaimed,
    Expired,
    FullyClaimed,
    InsufficientClaimerFunds,
    InsufficientPoolFunds,
    WhitelistIntegrityMismatch,
    NotWhitelisted,
    InvalidClaimAmount,
    Unauthorized,
    UserRejectedSigning,
    NetworkRetryable,
    AmbiguousOutcome,
    NotYetExpired,
    AlreadyRefunded,
    ClaimInProgress,
    InvalidInput,
    Fatal { code: Option<u32> },
}

impl ErrorKind {
    /// Only transient network failures may be retried; an ambiguous outcome
    /// must be reconciled instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::NetworkRetryable)
    }

    /// Terminal states that are not failures from the user's point of view.
    pub fn is_informational(&self) -> bool {
        matches!(self, ErrorKind::AlreadyClaimed | ErrorKind::FullyClaimed)
    }

    pub fn message(&self) -> String {
        match self {
            ErrorKind::AlreadyClaimed => "You have already claimed this red packet.".to_owned(),
            ErrorKind::Expired => "This red packet has expired.".to_owned(),
            ErrorKind::FullyClaimed => "All shares of this red packet have been claimed.".to_owned(),
            ErrorKind::InsufficientClaimerFunds => {
                "Your wallet does not have enough SOL to pay fees and rent.".to_owned()
            }
            ErrorKind::InsufficientPoolFunds => {
                "The red packet does not hold enough funds for this claim.".to_owned()
            }
            ErrorKind::WhitelistIntegrityMismatch => {
                "The whitelist does not match the red packet's Merkle root.".to_owned()
            }
            ErrorKind::NotWhitelisted => "Your address is not on this red packet's whitelist.".to_owned(),
            ErrorKind::InvalidClaimAmount => "The claim amount is not valid for this red packet.".to_owned(),
            ErrorKind::Unauthorized => "This wallet is not allowed to perform this action.".to_owned(),
            ErrorKind::UserRejectedSigning => "The signature request was rejected.".to_owned(),
            ErrorKind::NetworkRetryable => "Network error, please try again.".to_owned(),
            ErrorKind::AmbiguousOutcome => {
                "The transaction outcome is unknown; check your balance before retrying.".to_owned()
            }
            ErrorKind::NotYetExpired => "This red packet has not expired yet.".to_owned(),
            ErrorKind::AlreadyRefunded => "This red packet has already been refunded.".to_owned(),
            ErrorKind::ClaimInProgress => "A claim for this red packet is already in progress.".to_owned(),
            ErrorKind::InvalidInput => "Invalid input.".to_owned(),
            ErrorKind::Fatal { code: Some(code) } => format!("Transaction failed (code {code})."),
            ErrorKind::Fatal { code: None } => "Transaction failed.".to_owned(),
        }
    }
}

/// Which orchestrated operation produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Claim,
    Refund,
    Create,
}

/// Custom errors of the red packet program, `6000 + n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RedPacketError {
    Expired = 6000,
    FullyClaimed = 6001,
    AlreadyClaimed = 6002,
    InsufficientPoolFunds = 6003,
    InvalidMerkleProof = 6004,
    InvalidClaimAmount = 6005,
    Unauthorized = 6006,
    NotExpired = 6007,
    AlreadyWithdrawn = 6008,
    InvalidPacketCount = 6009,
    InvalidTotalAmount = 6010,
    MissingMerkleRoot = 6011,
}

impl RedPacketError {
    const ALL: [RedPacketError; 12] = [
        RedPacketError::Expired,
        RedPacketError::FullyClaimed,
        RedPacketError::AlreadyClaimed,
        RedPacketError::InsufficientPoolFunds,
        RedPacketError::InvalidMerkleProof,
        RedPacketError::InvalidClaimAmount,
        RedPacketError::Unauthorized,
        RedPacketError::NotExpired,
        RedPacketError::AlreadyWithdrawn,
        RedPacketError::InvalidPacketCount,
        RedPacketError::InvalidTotalAmount,
        RedPacketError::MissingMerkleRoot,
    ];

    pub fn from_code(code: u32) -> Option<Self> {
        let index = code.checked_sub(ANCHOR_ERROR_OFFSET)?;
        Self::ALL.get(index as usize).copied()
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn kind(self) -> ErrorKind {
        match self {
            RedPacketError::Expired => ErrorKind::Expired,
            RedPacketError::FullyClaimed => ErrorKind::FullyClaimed,
            RedPacketError::AlreadyClaimed => ErrorKind::AlreadyClaimed,
            RedPacketError::InsufficientPoolFunds => ErrorKind::InsufficientPoolFunds,
            RedPacketError::InvalidMerkleProof => ErrorKind::NotWhitelisted,
            RedPacketError::InvalidClaimAmount => ErrorKind::InvalidClaimAmount,
            RedPacketError::Unauthorized => ErrorKind::Unauthorized,
            RedPacketError::NotExpired => ErrorKind::NotYetExpired,
            RedPacketError::AlreadyWithdrawn => ErrorKind::AlreadyRefunded,
            RedPacketError::InvalidPacketCount
            | RedPacketError::InvalidTotalAmount
            | RedPacketError::MissingMerkleRoot => ErrorKind::InvalidInput,
        }
    }
}

// Anchor framework constraint errors
const ANCHOR_CONSTRAINT_HAS_ONE: u32 = 2001;
const ANCHOR_CONSTRAINT_SIGNER: u32 = 2002;
const ANCHOR_CONSTRAINT_SEEDS: u32 = 2006;

/// Classify a custom instruction error code.
pub fn classify_custom_code(code: u32, operation: Operation) -> ErrorKind {
    if let Some(e) = RedPacketError::from_code(code) {
        return e.kind();
    }
    match code {
        // system program: account already in use
        0 if operation == Operation::Claim => ErrorKind::AlreadyClaimed,
        // system and token program: insufficient funds
        1 if operation == Operation::Create => ErrorKind::InsufficientClaimerFunds,
        1 => ErrorKind::InsufficientPoolFunds,
        ANCHOR_CONSTRAINT_HAS_ONE | ANCHOR_CONSTRAINT_SIGNER | ANCHOR_CONSTRAINT_SEEDS => {
            ErrorKind::Unauthorized
        }
        code => ErrorKind::Fatal { code: Some(code) },
    }
}

pub fn classify_instruction_error(error: &InstructionError, operation: Operation) -> ErrorKind {
    match error {
        InstructionError::Custom(code) => classify_custom_code(*code, operation),
        InstructionError::MissingRequiredSignature => ErrorKind::Unauthorized,
        InstructionError::InsufficientFunds => ErrorKind::InsufficientPoolFunds,
        _ => ErrorKind::Fatal { code: None },
    }
}

pub fn classify_transaction_error(error: &TransactionError, operation: Operation) -> ErrorKind {
    match error {
        TransactionError::InstructionError(_, error) => {
            classify_instruction_error(error, operation)
        }
        TransactionError::InsufficientFundsForFee
        | TransactionError::InsufficientFundsForRent { .. }
        | TransactionError::AccountNotFound => ErrorKind::InsufficientClaimerFunds,
        TransactionError::BlockhashNotFound => ErrorKind::NetworkRetryable,
        TransactionError::AlreadyProcessed => ErrorKind::AmbiguousOutcome,
        TransactionError::SignatureFailure => ErrorKind::Unauthorized,
        _ => ErrorKind::Fatal { code: None },
    }
}
