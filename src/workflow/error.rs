//! Error taxonomy for ledger, wallet and initialization failures.

use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use thiserror::Error;

/// Failures reported by the ledger collaborator.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("rate limited by the cluster: {0}")]
    RateLimited(String),
    #[error("rpc request failed: {0}")]
    Rpc(String),
    #[error("account {0} not found")]
    AccountNotFound(Pubkey),
    #[error("transaction {signature} failed: {reason}")]
    TransactionFailed { signature: Signature, reason: String },
    #[error("transaction {0} not confirmed yet")]
    Pending(Signature),
    #[error("transaction {0} was not confirmed in time")]
    ConfirmationTimeout(Signature),
    #[error("failed to build instruction: {0}")]
    Instruction(String),
}

impl LedgerError {
    /// Classify a raw client message, picking out faucet and RPC throttling.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_rate_limit_message(&message) {
            LedgerError::RateLimited(message)
        } else {
            LedgerError::Rpc(message)
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LedgerError::RateLimited(_))
    }

    /// Errors worth polling through while waiting on a confirmation.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Pending(_) | LedgerError::Rpc(_))
    }
}

impl From<ClientError> for LedgerError {
    fn from(err: ClientError) -> Self {
        if let ClientErrorKind::Reqwest(reqwest_err) = err.kind() {
            if reqwest_err.status().map(|s| s.as_u16()) == Some(429) {
                return LedgerError::RateLimited(err.to_string());
            }
        }
        LedgerError::from_message(err.to_string())
    }
}

fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("429")
        || lower.contains("too many requests")
        || lower.contains("rate limit")
        || lower.contains("airdrop limit")
}

/// Failures reported by the wallet collaborator.
#[derive(Debug, Clone, Error)]
pub enum WalletError {
    #[error("no wallet is installed")]
    NoWalletInstalled,
    #[error("wallet {0} is not available")]
    UnknownWallet(String),
    #[error("wallet is not connected")]
    NotConnected,
    #[error("wallet rejected the request: {0}")]
    Rejected(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Conditions that abort a whole initialization run.
#[derive(Debug, Clone, Error)]
pub enum InitAbort {
    #[error("connected account holds {balance} lamports, {required} required")]
    InsufficientFunds { balance: u64, required: u64 },
    #[error("faucet rate limit reached: {0}")]
    FaucetRateLimited(LedgerError),
    #[error("faucet request failed: {0}")]
    Faucet(LedgerError),
    #[error("could not read connected account balance: {0}")]
    BalanceCheck(LedgerError),
}
