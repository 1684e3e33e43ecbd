//! Workflow module - token initialization, balance refresh and trading.
//!
//! The workflow is written against two collaborator traits,
//! [`LedgerClient`] and [`WalletAdapter`], so the same code runs against a
//! live cluster or an in-memory fake. [`Session`] ties the pieces together
//! for a presentation layer.

pub mod types;
pub mod error;
pub mod ledger;
pub mod confirmation;
pub mod wallet;
pub mod notifier;
pub mod balances;
pub mod initializer;
pub mod trade;
pub mod session;

// Re-export main public types
pub use types::{
    Commitment, ConfirmationPolicy, InitReport, Notification, NotificationAction,
    NotificationLevel, NotificationReceiver, NotificationSender, WorkflowConfig,
};
pub use error::{InitAbort, LedgerError, WalletError};
pub use ledger::{associated_holder_address, HolderAccount, LedgerClient, RpcLedger, SignatureStatus};
pub use wallet::{KeypairWallet, WalletAdapter, WalletDescriptor};
pub use notifier::Notifier;
pub use initializer::TokenInitializer;
pub use session::{Session, SessionSnapshot};

use crate::types::TokenCatalog;
use std::sync::Arc;

/// Workflow builder for convenient construction with sensible defaults.
pub struct WorkflowBuilder {
    config: WorkflowConfig,
    catalog: TokenCatalog,
    wallets: Vec<Arc<dyn WalletAdapter>>,
}

impl WorkflowBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: WorkflowConfig::default(),
            catalog: TokenCatalog::default(),
            wallets: Vec::new(),
        }
    }

    /// Set the RPC endpoint.
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.config.rpc_url = url.into();
        self
    }

    /// Set the minimum connected-account balance in lamports.
    pub fn with_min_native_balance(mut self, lamports: u64) -> Self {
        self.config.min_native_balance_lamports = lamports;
        self
    }

    /// Set the faucet grant for the ephemeral payer in lamports.
    pub fn with_airdrop_amount(mut self, lamports: u64) -> Self {
        self.config.airdrop_lamports = lamports;
        self
    }

    /// Set confirmation polling.
    pub fn with_confirmation(mut self, policy: ConfirmationPolicy) -> Self {
        self.config.confirmation = policy;
        self
    }

    /// Set the extra pause between ledger steps.
    pub fn with_settle_delay(mut self, delay_ms: u64) -> Self {
        self.config.settle_delay_ms = delay_ms;
        self
    }

    /// Set RPC rate limiting.
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.config.rate_limit_requests_per_second = requests_per_second;
        self
    }

    /// Replace the token catalog.
    pub fn with_catalog(mut self, catalog: TokenCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Register a wallet adapter.
    pub fn with_wallet(mut self, wallet: Arc<dyn WalletAdapter>) -> Self {
        self.wallets.push(wallet);
        self
    }

    /// Build the workflow configuration.
    pub fn build_config(self) -> WorkflowConfig {
        self.config
    }

    /// Build a session against `ledger`, returning the notification stream.
    pub fn build(self, ledger: Arc<dyn LedgerClient>) -> (Session, NotificationReceiver) {
        let (notifier, receiver) = Notifier::channel(self.config.notification_buffer);
        let session = Session::new(ledger, Arc::new(self.config), &self.catalog, self.wallets, notifier);
        (session, receiver)
    }

    /// Build a session against the configured RPC endpoint.
    pub fn build_rpc(self) -> (Session, NotificationReceiver) {
        let ledger: Arc<dyn LedgerClient> = Arc::new(RpcLedger::new(&self.config));
        self.build(ledger)
    }
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}
