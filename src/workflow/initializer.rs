//! Token initialization workflow.
//!
//! One run: check the connected account is funded, fund a fresh ephemeral
//! payer from the faucet, then create mint + holder account + initial supply
//! for every catalog entry that has no mint yet, one token at a time. A token
//! that fails is reported and skipped; only the funding steps can abort the
//! whole run.

use crate::types::TokenInstance;
use crate::workflow::balances::refresh_token_balances;
use crate::workflow::confirmation::wait_for_confirmation;
use crate::workflow::error::{InitAbort, LedgerError};
use crate::workflow::ledger::LedgerClient;
use crate::workflow::notifier::Notifier;
use crate::workflow::types::{InitReport, WorkflowConfig};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Runs token initialization against a ledger.
pub struct TokenInitializer {
    ledger: Arc<dyn LedgerClient>,
    config: Arc<WorkflowConfig>,
    notifier: Notifier,
}

impl TokenInitializer {
    pub fn new(ledger: Arc<dyn LedgerClient>, config: Arc<WorkflowConfig>, notifier: Notifier) -> Self {
        Self {
            ledger,
            config,
            notifier,
        }
    }

    /// Run initialization for `owner` over `tokens`.
    ///
    /// Never fails: aborts are turned into a single notification and the
    /// catalog is returned unchanged with `aborted` set.
    #[instrument(skip(self, tokens))]
    pub async fn initialize(&self, owner: &Pubkey, tokens: Vec<TokenInstance>) -> InitReport {
        match self.try_initialize(owner, tokens.clone()).await {
            Ok(report) => report,
            Err(abort) => {
                error!("Token initialization aborted: {}", abort);
                self.notify_abort(&abort).await;
                InitReport {
                    tokens,
                    aborted: true,
                    ..InitReport::default()
                }
            }
        }
    }

    async fn try_initialize(&self, owner: &Pubkey, mut tokens: Vec<TokenInstance>) -> Result<InitReport, InitAbort> {
        let mut report = InitReport::default();

        if tokens.iter().all(TokenInstance::is_minted) {
            debug!("Every token already has a mint, refreshing balances only");
            report.skipped = tokens.iter().map(|t| t.symbol().to_string()).collect();
            report.tokens = self.refresh(owner, tokens).await;
            return Ok(report);
        }

        self.ensure_funded(owner).await?;

        let payer = Keypair::new();
        self.fund_payer(&payer).await?;
        self.settle().await;

        for token in tokens.iter_mut() {
            if token.is_minted() {
                debug!("{} already has a mint, skipping", token.symbol());
                report.skipped.push(token.symbol().to_string());
                continue;
            }

            match self.create_token(&payer, owner).await {
                Ok(mint) => {
                    token.assign_mint(mint);
                    info!("Created {} with mint {}", token.symbol(), mint);
                    self.notifier.success(format!("Created {} token", token.symbol())).await;
                    report.created.push(token.symbol().to_string());
                }
                Err(e) => {
                    error!("Error creating token {}: {}", token.symbol(), e);
                    self.notifier.error(format!("Failed to create {} token", token.symbol())).await;
                    report.failed.push(token.symbol().to_string());
                }
            }
            self.settle().await;
        }

        if report.created_any() {
            self.notifier.success("Some tokens were initialized successfully").await;
        }

        report.tokens = self.refresh(owner, tokens).await;
        Ok(report)
    }

    async fn refresh(&self, owner: &Pubkey, tokens: Vec<TokenInstance>) -> Vec<TokenInstance> {
        let refresh = refresh_token_balances(self.ledger.as_ref(), owner, tokens, self.config.display_scale).await;
        if !refresh.failed.is_empty() {
            self.notifier
                .warning(format!("Could not refresh balance for {}", refresh.failed.join(", ")))
                .await;
        }
        refresh.tokens
    }

    /// Fast-fail guard: no ledger mutation without a minimally funded account.
    async fn ensure_funded(&self, owner: &Pubkey) -> Result<(), InitAbort> {
        let balance = self
            .ledger
            .native_balance(owner)
            .await
            .map_err(InitAbort::BalanceCheck)?;

        let required = self.config.min_native_balance_lamports;
        if balance < required {
            return Err(InitAbort::InsufficientFunds { balance, required });
        }
        Ok(())
    }

    async fn fund_payer(&self, payer: &Keypair) -> Result<(), InitAbort> {
        let classify = |e: LedgerError| {
            if e.is_rate_limited() {
                InitAbort::FaucetRateLimited(e)
            } else {
                InitAbort::Faucet(e)
            }
        };

        let signature = self
            .ledger
            .request_airdrop(&payer.pubkey(), self.config.airdrop_lamports)
            .await
            .map_err(classify)?;

        wait_for_confirmation(self.ledger.as_ref(), &signature, &self.config.confirmation)
            .await
            .map_err(classify)?;

        debug!("Ephemeral payer {} funded", payer.pubkey());
        Ok(())
    }

    /// Mint, holder account and initial supply for one token.
    async fn create_token(&self, payer: &Keypair, owner: &Pubkey) -> Result<Pubkey, LedgerError> {
        let policy = &self.config.confirmation;

        let (mint, signature) = self
            .ledger
            .create_mint(payer, &payer.pubkey(), Some(owner), self.config.token_decimals)
            .await?;
        wait_for_confirmation(self.ledger.as_ref(), &signature, policy).await?;
        self.settle().await;

        let holder = self.ledger.get_or_create_associated_account(payer, &mint, owner).await?;
        if let Some(signature) = holder.created {
            wait_for_confirmation(self.ledger.as_ref(), &signature, policy).await?;
        }
        self.settle().await;

        let signature = self
            .ledger
            .mint_to(payer, &mint, &holder.address, payer, self.config.initial_supply)
            .await?;
        wait_for_confirmation(self.ledger.as_ref(), &signature, policy).await?;

        Ok(mint)
    }

    async fn settle(&self) {
        let delay = self.config.settle_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn notify_abort(&self, abort: &InitAbort) {
        let faucet = self.config.faucet_url.as_str();
        match abort {
            InitAbort::InsufficientFunds { .. } => {
                self.notifier
                    .error_with_link("Insufficient SOL balance. Please get SOL from the Solana Faucet", "Get SOL", faucet)
                    .await;
            }
            InitAbort::FaucetRateLimited(_) => {
                self.notifier
                    .error_with_link("Airdrop limit reached. Please get SOL from the Solana Faucet", "Get SOL", faucet)
                    .await;
            }
            InitAbort::Faucet(_) | InitAbort::BalanceCheck(_) => {
                warn!("Unexpected failure before token creation");
                self.notifier
                    .error_with_link(
                        "Error initializing tokens. Make sure you have enough SOL in your wallet",
                        "Get SOL",
                        faucet,
                    )
                    .await;
            }
        }
    }
}
