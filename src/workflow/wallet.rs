//! Wallet collaborator.
//!
//! The workflow only needs identity and signing from a wallet, so adapters
//! are modelled as a narrow capability trait. `KeypairWallet` is a local
//! file-system keypair exposed through the same trait.

use crate::workflow::error::WalletError;
use crate::workflow::ledger::LedgerClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// What the UI needs to list a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletDescriptor {
    pub display_name: String,
    pub icon_url: Option<String>,
}

/// Identity and signing capability provided by a wallet.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn display_name(&self) -> &str;

    fn icon_url(&self) -> Option<&str> {
        None
    }

    /// Ask the wallet to connect; returns the account it exposes.
    async fn request_connect(&self) -> Result<Pubkey, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Sign a transaction whose blockhash is already set.
    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, WalletError>;

    /// Sign and broadcast through `ledger`.
    async fn send_transaction(
        &self,
        transaction: Transaction,
        ledger: &dyn LedgerClient,
    ) -> Result<Signature, WalletError> {
        let signed = self.sign_transaction(transaction).await?;
        Ok(ledger.send_transaction(&signed).await?)
    }

    fn descriptor(&self) -> WalletDescriptor {
        WalletDescriptor {
            display_name: self.display_name().to_string(),
            icon_url: self.icon_url().map(str::to_string),
        }
    }
}

/// Wallet backed by a local keypair.
pub struct KeypairWallet {
    name: String,
    keypair: Keypair,
    connected: AtomicBool,
}

impl KeypairWallet {
    pub fn new(name: impl Into<String>, keypair: Keypair) -> Self {
        Self {
            name: name.into(),
            keypair,
            connected: AtomicBool::new(false),
        }
    }

    /// Load a keypair file in the Solana CLI JSON format.
    pub fn from_file(name: impl Into<String>, path: &str) -> anyhow::Result<Self> {
        let keypair = solana_sdk::signature::read_keypair_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to read keypair {}: {}", path, e))?;
        Ok(Self::new(name, keypair))
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

#[async_trait]
impl WalletAdapter for KeypairWallet {
    fn display_name(&self) -> &str {
        &self.name
    }

    async fn request_connect(&self) -> Result<Pubkey, WalletError> {
        self.connected.store(true, Ordering::SeqCst);
        info!("Keypair wallet {} connected as {}", self.name, self.keypair.pubkey());
        Ok(self.keypair.pubkey())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_transaction(&self, mut transaction: Transaction) -> Result<Transaction, WalletError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(WalletError::NotConnected);
        }
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| WalletError::Rejected(e.to_string()))?;
        debug!("Signed transaction with {} instructions", transaction.message.instructions.len());
        Ok(transaction)
    }
}
