//! Session: the state and action entry points a UI binds to.
//!
//! Holds connection status, native balance, the token catalog and the loading
//! flag. Every action converts its failures into notifications; nothing here
//! returns an error to the caller.

use crate::types::{merge_tokens, shorten_address, TokenCatalog, TokenInstance};
use crate::workflow::balances::{fetch_native_balance, refresh_token_balances};
use crate::workflow::error::WalletError;
use crate::workflow::initializer::TokenInitializer;
use crate::workflow::ledger::LedgerClient;
use crate::workflow::notifier::Notifier;
use crate::workflow::trade::execute_trade;
use crate::workflow::types::{InitReport, WorkflowConfig};
use crate::workflow::wallet::{WalletAdapter, WalletDescriptor};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

/// Read-only view of the session for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub wallet: Option<String>,
    pub owner: Option<Pubkey>,
    pub owner_short: Option<String>,
    pub native_balance: Option<f64>,
    pub tokens: Vec<TokenInstance>,
    pub is_loading: bool,
}

#[derive(Default)]
struct SessionState {
    selected: Option<Arc<dyn WalletAdapter>>,
    owner: Option<Pubkey>,
    native_balance: Option<f64>,
    tokens: Vec<TokenInstance>,
}

/// Clears the loading flag when dropped.
struct LoadingGuard {
    flag: Arc<AtomicBool>,
}

impl LoadingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Connection, balances and token catalog for one user, plus the actions on them.
pub struct Session {
    ledger: Arc<dyn LedgerClient>,
    config: Arc<WorkflowConfig>,
    notifier: Notifier,
    wallets: Vec<Arc<dyn WalletAdapter>>,
    initializer: TokenInitializer,
    state: Arc<RwLock<SessionState>>,
    loading: Arc<AtomicBool>,
}

impl Session {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        config: Arc<WorkflowConfig>,
        catalog: &TokenCatalog,
        wallets: Vec<Arc<dyn WalletAdapter>>,
        notifier: Notifier,
    ) -> Self {
        let initializer = TokenInitializer::new(ledger.clone(), config.clone(), notifier.clone());
        let state = SessionState {
            tokens: catalog.instantiate(),
            ..SessionState::default()
        };

        Self {
            ledger,
            config,
            notifier,
            wallets,
            initializer,
            state: Arc::new(RwLock::new(state)),
            loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn available_wallets(&self) -> Vec<WalletDescriptor> {
        self.wallets.iter().map(|w| w.descriptor()).collect()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub async fn owner(&self) -> Option<Pubkey> {
        self.state.read().await.owner
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            wallet: state.selected.as_ref().map(|w| w.display_name().to_string()),
            owner: state.owner,
            owner_short: state.owner.map(|o| shorten_address(&o.to_string())),
            native_balance: state.native_balance,
            tokens: state.tokens.clone(),
            is_loading: self.is_loading(),
        }
    }

    /// Connect the named wallet (or the first one available), then run the
    /// on-connect refresh and token initialization.
    #[instrument(skip(self))]
    pub async fn connect(&self, wallet_name: Option<&str>) {
        {
            let Some(_guard) = self.begin("connect") else {
                return;
            };

            let wallet = match self.select_wallet(wallet_name) {
                Ok(wallet) => wallet,
                Err(WalletError::NoWalletInstalled) => {
                    self.notifier
                        .error_with_link(
                            "No wallet detected. Please install a Solana wallet like Phantom to continue",
                            "Get Phantom Wallet",
                            &self.config.wallet_install_url,
                        )
                        .await;
                    return;
                }
                Err(e) => {
                    error!("Failed to select wallet: {}", e);
                    self.notifier.error("Failed to connect wallet").await;
                    return;
                }
            };

            match wallet.request_connect().await {
                Ok(owner) => {
                    let mut state = self.state.write().await;
                    state.selected = Some(wallet.clone());
                    state.owner = Some(owner);
                    info!("Connected {} as {}", wallet.display_name(), owner);
                }
                Err(e) => {
                    error!("Failed to connect {}: {}", wallet.display_name(), e);
                    self.notifier.error("Failed to connect wallet").await;
                    return;
                }
            }
        }

        self.on_connected().await;
    }

    fn select_wallet(&self, wallet_name: Option<&str>) -> Result<Arc<dyn WalletAdapter>, WalletError> {
        if self.wallets.is_empty() {
            return Err(WalletError::NoWalletInstalled);
        }
        match wallet_name {
            Some(name) => self
                .wallets
                .iter()
                .find(|w| w.display_name() == name)
                .cloned()
                .ok_or_else(|| WalletError::UnknownWallet(name.to_string())),
            None => self.wallets.first().cloned().ok_or(WalletError::NoWalletInstalled),
        }
    }

    /// Reaction to a connection becoming active.
    async fn on_connected(&self) {
        self.notifier.success("Connected to wallet").await;
        self.refresh_native_balance().await;
        self.initialize_tokens().await;
    }

    #[instrument(skip(self))]
    pub async fn disconnect(&self) {
        let wallet = self.state.read().await.selected.clone();
        let Some(wallet) = wallet else {
            debug!("Disconnect requested with no wallet selected");
            return;
        };

        match wallet.disconnect().await {
            Ok(()) => {
                let mut state = self.state.write().await;
                state.selected = None;
                state.owner = None;
                state.native_balance = None;
                drop(state);
                self.notifier.success("Wallet disconnected").await;
            }
            Err(e) => {
                error!("Failed to disconnect {}: {}", wallet.display_name(), e);
                self.notifier.error("Failed to disconnect wallet").await;
            }
        }
    }

    /// Refresh the connected account's native balance.
    pub async fn refresh_native_balance(&self) {
        let Some(owner) = self.owner().await else {
            return;
        };

        match fetch_native_balance(self.ledger.as_ref(), &owner, self.config.display_scale).await {
            Ok(balance) => {
                self.state.write().await.native_balance = Some(balance);
            }
            Err(e) => {
                error!("Error fetching balance: {}", e);
                self.notifier.error("Error fetching balance").await;
            }
        }
    }

    /// Refresh every minted token's balance.
    ///
    /// Only balances are written back; a mint assigned while the lookups were
    /// in flight is kept.
    pub async fn refresh_token_balances(&self) {
        let Some(owner) = self.owner().await else {
            return;
        };

        let tokens = self.state.read().await.tokens.clone();
        let refresh = refresh_token_balances(self.ledger.as_ref(), &owner, tokens, self.config.display_scale).await;
        if !refresh.failed.is_empty() {
            self.notifier
                .warning(format!("Could not refresh balance for {}", refresh.failed.join(", ")))
                .await;
        }
        merge_tokens(&mut self.state.write().await.tokens, &refresh.tokens);
    }

    /// Create mints for every token that has none yet.
    pub async fn initialize_tokens(&self) -> Option<InitReport> {
        let owner = self.owner().await?;
        let _guard = self.begin("initialize")?;

        let tokens = self.state.read().await.tokens.clone();
        let report = self.initializer.initialize(&owner, tokens).await;
        merge_tokens(&mut self.state.write().await.tokens, &report.tokens);
        Some(report)
    }

    /// Trade the token with the given id or symbol.
    #[instrument(skip(self))]
    pub async fn trade(&self, token_id: &str) {
        let (owner, wallet, token) = {
            let state = self.state.read().await;
            let token = state
                .tokens
                .iter()
                .find(|t| t.id() == token_id || t.symbol() == token_id)
                .cloned();
            (state.owner, state.selected.clone(), token)
        };

        let (Some(owner), Some(wallet), Some(token)) = (owner, wallet, token) else {
            debug!("Trade of {} ignored: not connected or unknown token", token_id);
            return;
        };
        if !token.is_minted() {
            debug!("Trade of {} ignored: no mint yet", token.symbol());
            return;
        }

        let Some(_guard) = self.begin("trade") else {
            return;
        };

        match execute_trade(self.ledger.as_ref(), wallet.as_ref(), &owner, &token, &self.config).await {
            Ok(Some(signature)) => {
                info!("Trade of {} confirmed: {}", token.symbol(), signature);
                self.notifier.success(format!("Traded 1 {}", token.symbol())).await;
            }
            Ok(None) => return,
            Err(e) => {
                error!("Error trading token {}: {}", token.symbol(), e);
                self.notifier.error("Error trading token").await;
                return;
            }
        }

        self.refresh_token_balances().await;
        self.refresh_native_balance().await;
    }

    fn begin(&self, action: &str) -> Option<LoadingGuard> {
        let guard = LoadingGuard::acquire(&self.loading);
        if guard.is_none() {
            debug!("Ignoring {} while another action is running", action);
        }
        guard
    }
}
