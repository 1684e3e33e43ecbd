//! Configuration, notification and report types for the workflow.

use crate::types::{TokenInstance, LAMPORTS_PER_SOL};
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use std::time::Duration;

/// Confirmation depth requested when waiting on ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_config(&self) -> CommitmentConfig {
        match self {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

impl Default for Commitment {
    fn default() -> Self {
        Commitment::Confirmed
    }
}

/// How long to poll for a signature to reach the target commitment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationPolicy {
    /// Target commitment level
    pub commitment: Commitment,
    /// Delay between status polls in milliseconds
    pub poll_interval_ms: u64,
    /// Polls after the first one before giving up
    pub max_polls: usize,
}

impl ConfirmationPolicy {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            commitment: Commitment::Confirmed,
            poll_interval_ms: 500,
            // ~60s, the cluster's own initial confirmation timeout
            max_polls: 120,
        }
    }
}

/// Workflow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Cluster RPC endpoint
    pub rpc_url: String,
    /// RPC timeout in seconds
    pub rpc_timeout_seconds: u64,
    /// Outgoing RPC requests per second
    pub rate_limit_requests_per_second: u32,
    /// Minimum connected-account balance before any mutation, in lamports
    pub min_native_balance_lamports: u64,
    /// Faucet grant requested for the ephemeral payer, in lamports
    pub airdrop_lamports: u64,
    /// Decimal precision of created mints
    pub token_decimals: u8,
    /// Base units minted into the holder account of each new token
    pub initial_supply: u64,
    /// Base units moved by a trade
    pub trade_amount: u64,
    /// Divisor converting raw ledger amounts into displayed quantities
    pub display_scale: u64,
    /// Extra pause between ledger steps in milliseconds
    pub settle_delay_ms: u64,
    /// Confirmation polling
    pub confirmation: ConfirmationPolicy,
    /// External faucet shown when funds are missing
    pub faucet_url: String,
    /// Where to get a wallet when none is installed
    pub wallet_install_url: String,
    /// Notification channel capacity
    pub notification_buffer: usize,
}

impl WorkflowConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_seconds)
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            rpc_timeout_seconds: 60,
            rate_limit_requests_per_second: 10,
            min_native_balance_lamports: LAMPORTS_PER_SOL / 10,
            airdrop_lamports: LAMPORTS_PER_SOL / 10,
            token_decimals: 9,
            initial_supply: 1_000_000_000,
            trade_amount: 1_000_000_000,
            display_scale: LAMPORTS_PER_SOL,
            settle_delay_ms: 0,
            confirmation: ConfirmationPolicy::default(),
            faucet_url: "https://faucet.solana.com".to_string(),
            wallet_install_url: "https://phantom.app/".to_string(),
            notification_buffer: 64,
        }
    }
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

/// A link the UI can offer next to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub label: String,
    pub url: String,
}

/// A user-facing notification (toast).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub action: Option<NotificationAction>,
    /// Unix timestamp in milliseconds
    pub timestamp: u64,
}

/// Outcome of one initialization run.
#[derive(Debug, Clone, Default)]
pub struct InitReport {
    /// Catalog state after the run (and after the balance refresh)
    pub tokens: Vec<TokenInstance>,
    /// Symbols that gained a mint in this run
    pub created: Vec<String>,
    /// Symbols whose creation failed in this run
    pub failed: Vec<String>,
    /// Symbols skipped because they were already minted
    pub skipped: Vec<String>,
    /// Set when the whole run was aborted before the creation loop
    pub aborted: bool,
}

impl InitReport {
    pub fn created_any(&self) -> bool {
        !self.created.is_empty()
    }
}

/// Channel for sending notifications to the presentation layer
pub type NotificationSender = tokio::sync::mpsc::Sender<Notification>;
pub type NotificationReceiver = tokio::sync::mpsc::Receiver<Notification>;
