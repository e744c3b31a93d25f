use crate::signer;
use redpacket_lib::{
    error::{classify_transaction_error, ErrorKind, Operation},
    PacketIdentity,
};
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    rpc_request::{RpcError, RpcResponseErrorData},
    rpc_response::RpcSimulateTransactionResult,
};
use solana_sdk::{pubkey::Pubkey, signer::SignerError, transaction::TransactionError};
use std::{result::Result as StdResult, sync::Arc};
use thiserror::Error as ThisError;

pub type Result<T> = StdResult<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Protocol(#[from] redpacket_lib::Error),
    #[error("{}", verbose_solana_error(error))]
    Solana {
        error: Arc<ClientError>,
        operation: Operation,
    },
    #[error("transaction failed: {error}")]
    Transaction {
        error: TransactionError,
        operation: Operation,
    },
    #[error(transparent)]
    Signer(#[from] signer::Error),
    #[error(transparent)]
    SignerSdk(#[from] SignerError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{}", kind.message())]
    Rejected { kind: ErrorKind },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("account not found: {0}")]
    AccountNotFound(Pubkey),
    #[error("account {address} is not packet {identity}: {reason}")]
    UnverifiedAddress {
        address: Pubkey,
        identity: PacketIdentity,
        reason: &'static str,
    },
    #[error("mint {mint} is owned by {owner}, not a token program")]
    UnsupportedMint { mint: Pubkey, owner: Pubkey },
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

impl Error {
    pub fn custom<E: Into<anyhow::Error>>(e: E) -> Self {
        Self::Any(e.into())
    }

    pub fn rejected(kind: ErrorKind) -> Self {
        Self::Rejected { kind }
    }

    /// Wrap an RPC error raised during `operation`.
    pub fn solana(operation: Operation) -> impl FnOnce(ClientError) -> Self {
        move |error| Self::Solana {
            error: Arc::new(error),
            operation,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Protocol(e) => e.kind(),
            Error::Solana { error, operation } => classify_client_error(error, *operation),
            Error::Transaction { error, operation } => {
                classify_transaction_error(error, *operation)
            }
            Error::Signer(e) => match e {
                signer::Error::Pubkey(_)
                | signer::Error::Rejected(_)
                | signer::Error::Timeout
                | signer::Error::MessageChanged => ErrorKind::UserRejectedSigning,
                signer::Error::Worker(_) => ErrorKind::Fatal { code: None },
            },
            Error::SignerSdk(
                SignerError::NotEnoughSigners
                | SignerError::KeypairPubkeyMismatch
                | SignerError::TooManySigners,
            ) => ErrorKind::Unauthorized,
            Error::SignerSdk(SignerError::UserCancel(_)) => ErrorKind::UserRejectedSigning,
            Error::SignerSdk(_) => ErrorKind::Fatal { code: None },
            Error::Http(e) => {
                let throttled = e
                    .status()
                    .is_some_and(|s| s.as_u16() == 429 || s.is_server_error());
                if throttled || e.is_timeout() || e.is_connect() || e.is_request() {
                    ErrorKind::NetworkRetryable
                } else {
                    ErrorKind::Fatal {
                        code: e.status().map(|s| s.as_u16() as u32),
                    }
                }
            }
            Error::Rejected { kind } => *kind,
            Error::InvalidInput(_)
            | Error::AccountNotFound(_)
            | Error::UnverifiedAddress { .. }
            | Error::UnsupportedMint { .. }
            | Error::Config(_) => ErrorKind::InvalidInput,
            Error::Json(_) | Error::Any(_) => ErrorKind::Fatal { code: None },
        }
    }
}

/// Map an RPC client error into the taxonomy. A transaction error carried by
/// the response, including a failed preflight simulation, takes precedence.
pub fn classify_client_error(error: &ClientError, operation: Operation) -> ErrorKind {
    if let Some(e) = error.get_transaction_error() {
        return classify_transaction_error(&e, operation);
    }
    match error.kind() {
        ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => ErrorKind::NetworkRetryable,
        ClientErrorKind::RpcError(RpcError::RpcResponseError { data, .. }) => match data {
            RpcResponseErrorData::NodeUnhealthy { .. } => ErrorKind::NetworkRetryable,
            // simulation failed but no transaction error came back
            RpcResponseErrorData::SendTransactionPreflightFailure(_) => {
                ErrorKind::AmbiguousOutcome
            }
            _ => ErrorKind::Fatal { code: None },
        },
        ClientErrorKind::RpcError(RpcError::RpcRequestError(message))
            if is_rate_limited(message) =>
        {
            ErrorKind::NetworkRetryable
        }
        ClientErrorKind::Custom(message) if is_rate_limited(message) => {
            ErrorKind::NetworkRetryable
        }
        ClientErrorKind::SigningError(SignerError::UserCancel(_)) => {
            ErrorKind::UserRejectedSigning
        }
        ClientErrorKind::SigningError(_) => ErrorKind::Unauthorized,
        _ => ErrorKind::Fatal { code: None },
    }
}

fn is_rate_limited(message: &str) -> bool {
    message.contains("429") || message.contains("Too Many Requests")
}

/// Error message of an RPC error, with preflight logs when there are any.
pub fn verbose_solana_error(err: &ClientError) -> String {
    use std::fmt::Write;
    if let ClientErrorKind::RpcError(RpcError::RpcResponseError {
        code,
        message,
        data,
    }) = err.kind()
    {
        let mut s = String::new();
        writeln!(s, "{} ({})", message, code).ok();
        if let RpcResponseErrorData::SendTransactionPreflightFailure(
            RpcSimulateTransactionResult {
                logs: Some(logs), ..
            },
        ) = data
        {
            for (i, log) in logs.iter().enumerate() {
                writeln!(s, "{}: {}", i + 1, log).ok();
            }
        }
        s
    } else {
        err.to_string()
    }
}
