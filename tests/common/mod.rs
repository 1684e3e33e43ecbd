//! In-memory ledger and wallet used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use devnet_memecoins::workflow::{
    associated_holder_address, Commitment, ConfirmationPolicy, HolderAccount, LedgerClient,
    LedgerError, Notification, NotificationReceiver, SignatureStatus, WalletAdapter, WalletError,
    WorkflowConfig,
};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::transaction::Transaction;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// A recorded ledger call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    NativeBalance(Pubkey),
    Airdrop(Pubkey, u64),
    SignatureStatus(Signature),
    LatestBlockhash,
    CreateMint,
    HolderAccount(Pubkey),
    MintTo(Pubkey, u64),
    TokenAmount(Pubkey),
    SendTransaction,
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::Airdrop(..) | Call::CreateMint | Call::HolderAccount(_) | Call::MintTo(..) | Call::SendTransaction
        )
    }
}

#[derive(Default)]
struct FakeState {
    native: HashMap<Pubkey, u64>,
    mints: HashSet<Pubkey>,
    token_accounts: HashMap<Pubkey, u64>,
    calls: Vec<Call>,
    create_mint_attempts: usize,
    failing_mint_attempts: HashSet<usize>,
    holder_attempts: usize,
    failing_holder_attempts: HashSet<usize>,
    mint_to_attempts: usize,
    failing_mint_to_attempts: HashSet<usize>,
    failing_lookups: HashSet<Pubkey>,
    failed_signatures: HashSet<Signature>,
    pending_polls: usize,
    airdrop_error: Option<LedgerError>,
    send_error: Option<LedgerError>,
    balance_latency: Duration,
    token_latency: Duration,
}

/// Ledger that keeps balances and accounts in memory.
#[derive(Default)]
pub struct FakeLedger {
    state: Mutex<FakeState>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native_balance(self, owner: Pubkey, lamports: u64) -> Self {
        self.set_native_balance(owner, lamports);
        self
    }

    pub fn set_native_balance(&self, owner: Pubkey, lamports: u64) {
        self.state.lock().unwrap().native.insert(owner, lamports);
    }

    /// Fail the `attempt`-th create_mint call (0-based, counted across runs).
    pub fn fail_mint_creation(&self, attempt: usize) {
        self.state.lock().unwrap().failing_mint_attempts.insert(attempt);
    }

    /// Fail the `attempt`-th holder account call (0-based).
    pub fn fail_holder_account(&self, attempt: usize) {
        self.state.lock().unwrap().failing_holder_attempts.insert(attempt);
    }

    /// Fail the `attempt`-th mint_to call (0-based).
    pub fn fail_mint_to(&self, attempt: usize) {
        self.state.lock().unwrap().failing_mint_to_attempts.insert(attempt);
    }

    pub fn fail_lookup(&self, holder: Pubkey) {
        self.state.lock().unwrap().failing_lookups.insert(holder);
    }

    pub fn fail_signature(&self, signature: Signature) {
        self.state.lock().unwrap().failed_signatures.insert(signature);
    }

    /// Report `polls` pending statuses before confirming anything.
    pub fn set_pending_polls(&self, polls: usize) {
        self.state.lock().unwrap().pending_polls = polls;
    }

    pub fn fail_airdrop(&self, error: LedgerError) {
        self.state.lock().unwrap().airdrop_error = Some(error);
    }

    pub fn fail_send(&self, error: LedgerError) {
        self.state.lock().unwrap().send_error = Some(error);
    }

    pub fn set_balance_latency(&self, latency: Duration) {
        self.state.lock().unwrap().balance_latency = latency;
    }

    /// Delay applied to token balance lookups started from now on.
    pub fn set_token_latency(&self, latency: Duration) {
        self.state.lock().unwrap().token_latency = latency;
    }

    pub fn set_token_amount(&self, holder: Pubkey, amount: u64) {
        self.state.lock().unwrap().token_accounts.insert(holder, amount);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn mutation_count(&self) -> usize {
        self.count(Call::is_mutation)
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn native_balance(&self, owner: &Pubkey) -> Result<u64, LedgerError> {
        let latency = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::NativeBalance(*owner));
            state.balance_latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(self.state.lock().unwrap().native.get(owner).copied().unwrap_or(0))
    }

    async fn request_airdrop(&self, recipient: &Pubkey, lamports: u64) -> Result<Signature, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Airdrop(*recipient, lamports));
        if let Some(error) = state.airdrop_error.clone() {
            return Err(error);
        }
        *state.native.entry(*recipient).or_default() += lamports;
        Ok(Signature::new_unique())
    }

    async fn signature_status(
        &self,
        signature: &Signature,
        _commitment: Commitment,
    ) -> Result<SignatureStatus, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::SignatureStatus(*signature));
        if state.failed_signatures.contains(signature) {
            return Ok(SignatureStatus::Failed("custom program error: 0x1".to_string()));
        }
        if state.pending_polls > 0 {
            state.pending_polls -= 1;
            return Ok(SignatureStatus::Pending);
        }
        Ok(SignatureStatus::Confirmed)
    }

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.record(Call::LatestBlockhash);
        Ok(Hash::new_unique())
    }

    async fn create_mint(
        &self,
        _payer: &Keypair,
        _mint_authority: &Pubkey,
        _freeze_authority: Option<&Pubkey>,
        _decimals: u8,
    ) -> Result<(Pubkey, Signature), LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateMint);
        let attempt = state.create_mint_attempts;
        state.create_mint_attempts += 1;
        if state.failing_mint_attempts.contains(&attempt) {
            return Err(LedgerError::Rpc("Transaction simulation failed".to_string()));
        }
        let mint = Pubkey::new_unique();
        state.mints.insert(mint);
        Ok((mint, Signature::new_unique()))
    }

    async fn get_or_create_associated_account(
        &self,
        _payer: &Keypair,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> Result<HolderAccount, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::HolderAccount(*mint));
        let attempt = state.holder_attempts;
        state.holder_attempts += 1;
        if state.failing_holder_attempts.contains(&attempt) {
            return Err(LedgerError::Rpc("Transaction simulation failed".to_string()));
        }
        if !state.mints.contains(mint) {
            return Err(LedgerError::AccountNotFound(*mint));
        }
        let address = associated_holder_address(owner, mint);
        if state.token_accounts.contains_key(&address) {
            return Ok(HolderAccount { address, created: None });
        }
        state.token_accounts.insert(address, 0);
        Ok(HolderAccount {
            address,
            created: Some(Signature::new_unique()),
        })
    }

    async fn mint_to(
        &self,
        _payer: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        _authority: &Keypair,
        amount: u64,
    ) -> Result<Signature, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::MintTo(*mint, amount));
        let attempt = state.mint_to_attempts;
        state.mint_to_attempts += 1;
        if state.failing_mint_to_attempts.contains(&attempt) {
            return Err(LedgerError::TransactionFailed {
                signature: Signature::new_unique(),
                reason: "owner does not match".to_string(),
            });
        }
        match state.token_accounts.get_mut(destination) {
            Some(balance) => {
                *balance += amount;
                Ok(Signature::new_unique())
            }
            None => Err(LedgerError::AccountNotFound(*destination)),
        }
    }

    async fn token_account_amount(&self, account: &Pubkey) -> Result<u64, LedgerError> {
        let latency = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::TokenAmount(*account));
            state.token_latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let state = self.state.lock().unwrap();
        if state.failing_lookups.contains(account) {
            return Err(LedgerError::Rpc("node is behind".to_string()));
        }
        state
            .token_accounts
            .get(account)
            .copied()
            .ok_or(LedgerError::AccountNotFound(*account))
    }

    async fn send_transaction(&self, _transaction: &Transaction) -> Result<Signature, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::SendTransaction);
        if let Some(error) = state.send_error.clone() {
            return Err(error);
        }
        Ok(Signature::new_unique())
    }
}

/// Wallet that hands out a fixed account and passes transactions through.
pub struct FakeWallet {
    pub name: String,
    pub owner: Pubkey,
    pub reject_connect: bool,
    pub reject_sign: bool,
    pub reject_disconnect: bool,
}

impl FakeWallet {
    pub fn new(name: &str, owner: Pubkey) -> Self {
        Self {
            name: name.to_string(),
            owner,
            reject_connect: false,
            reject_sign: false,
            reject_disconnect: false,
        }
    }
}

#[async_trait]
impl WalletAdapter for FakeWallet {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn icon_url(&self) -> Option<&str> {
        Some("data:image/svg+xml;base64,AAAA")
    }

    async fn request_connect(&self) -> Result<Pubkey, WalletError> {
        if self.reject_connect {
            return Err(WalletError::Rejected("User rejected the request".to_string()));
        }
        Ok(self.owner)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        if self.reject_disconnect {
            return Err(WalletError::Rejected("Wallet is busy".to_string()));
        }
        Ok(())
    }

    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, WalletError> {
        if self.reject_sign {
            return Err(WalletError::Rejected("User rejected the request".to_string()));
        }
        Ok(transaction)
    }
}

/// Config with fast confirmation polling and no settle delay.
pub fn fast_config() -> WorkflowConfig {
    WorkflowConfig {
        confirmation: ConfirmationPolicy {
            commitment: Commitment::Confirmed,
            poll_interval_ms: 1,
            max_polls: 3,
        },
        settle_delay_ms: 0,
        ..WorkflowConfig::default()
    }
}

/// Everything currently queued on the notification channel.
pub fn drain(receiver: &mut NotificationReceiver) -> Vec<Notification> {
    let mut notifications = Vec::new();
    while let Ok(notification) = receiver.try_recv() {
        notifications.push(notification);
    }
    notifications
}

pub const FUNDED: u64 = 2_000_000_000;
