//! Ledger collaborator: the narrow surface the workflow needs from the cluster.
//!
//! `LedgerClient` is what the workflow is written against; `RpcLedger` is the
//! production implementation on top of the nonblocking Solana RPC client and
//! the SPL token program instructions. Mutating calls return as soon as the
//! transaction is submitted; waiting for confirmation is the caller's job
//! (see [`crate::workflow::confirmation`]).

use crate::workflow::error::LedgerError;
use crate::workflow::types::{Commitment, WorkflowConfig};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use spl_associated_token_account::get_associated_token_address;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use spl_token::solana_program::program_pack::Pack;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Status of a submitted transaction at the requested commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Not yet seen at the requested commitment
    Pending,
    /// Reached the requested commitment without error
    Confirmed,
    /// Landed but failed on-chain
    Failed(String),
}

/// Holder account lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderAccount {
    pub address: Pubkey,
    /// Creation transaction, when the account did not exist yet
    pub created: Option<Signature>,
}

/// Operations the workflow performs against the ledger and token program.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Native balance of `owner` in lamports.
    async fn native_balance(&self, owner: &Pubkey) -> Result<u64, LedgerError>;

    /// Ask the faucet to fund `recipient`.
    async fn request_airdrop(&self, recipient: &Pubkey, lamports: u64) -> Result<Signature, LedgerError>;

    async fn signature_status(
        &self,
        signature: &Signature,
        commitment: Commitment,
    ) -> Result<SignatureStatus, LedgerError>;

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError>;

    /// Create and initialize a new mint funded by `payer`.
    async fn create_mint(
        &self,
        payer: &Keypair,
        mint_authority: &Pubkey,
        freeze_authority: Option<&Pubkey>,
        decimals: u8,
    ) -> Result<(Pubkey, Signature), LedgerError>;

    /// Return `owner`'s associated account for `mint`, creating it if missing.
    async fn get_or_create_associated_account(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> Result<HolderAccount, LedgerError>;

    async fn mint_to(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        authority: &Keypair,
        amount: u64,
    ) -> Result<Signature, LedgerError>;

    /// Raw token amount held by a token account.
    async fn token_account_amount(&self, account: &Pubkey) -> Result<u64, LedgerError>;

    /// Broadcast an already signed transaction.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError>;
}

/// Associated holder address of `owner` for `mint` under the classic token program.
pub fn associated_holder_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(owner, mint)
}

/// `LedgerClient` backed by a Solana JSON-RPC endpoint.
pub struct RpcLedger {
    rpc: Arc<RpcClient>,
    limiter: DefaultDirectRateLimiter,
}

impl RpcLedger {
    /// Create a new RPC ledger from configuration.
    pub fn new(config: &WorkflowConfig) -> Self {
        let rpc = Arc::new(RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            config.rpc_timeout(),
            config.confirmation.commitment.as_config(),
        ));
        Self::with_client(rpc, config.rate_limit_requests_per_second)
    }

    /// Wrap an existing client, pacing requests at `requests_per_second`.
    pub fn with_client(rpc: Arc<RpcClient>, requests_per_second: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
        Self {
            rpc,
            limiter: RateLimiter::direct(quota),
        }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }

    async fn throttle(&self) {
        self.limiter.until_ready().await;
    }

    async fn sign_and_send(
        &self,
        instructions: &[solana_sdk::instruction::Instruction],
        payer: &Keypair,
        extra_signers: &[&Keypair],
    ) -> Result<Signature, LedgerError> {
        let blockhash = self.latest_blockhash().await?;

        let mut signers: Vec<&Keypair> = vec![payer];
        for signer in extra_signers.iter().copied() {
            if signer.pubkey() != payer.pubkey() {
                signers.push(signer);
            }
        }

        let transaction =
            Transaction::new_signed_with_payer(instructions, Some(&payer.pubkey()), &signers, blockhash);
        self.send_transaction(&transaction).await
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    #[instrument(skip(self))]
    async fn native_balance(&self, owner: &Pubkey) -> Result<u64, LedgerError> {
        self.throttle().await;
        Ok(self.rpc.get_balance(owner).await?)
    }

    #[instrument(skip(self))]
    async fn request_airdrop(&self, recipient: &Pubkey, lamports: u64) -> Result<Signature, LedgerError> {
        self.throttle().await;
        let signature = self.rpc.request_airdrop(recipient, lamports).await?;
        debug!("Airdrop of {} lamports requested: {}", lamports, signature);
        Ok(signature)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
        commitment: Commitment,
    ) -> Result<SignatureStatus, LedgerError> {
        self.throttle().await;
        let status = self
            .rpc
            .get_signature_status_with_commitment(signature, commitment.as_config())
            .await?;

        Ok(match status {
            None => SignatureStatus::Pending,
            Some(Ok(())) => SignatureStatus::Confirmed,
            Some(Err(err)) => SignatureStatus::Failed(err.to_string()),
        })
    }

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.throttle().await;
        Ok(self.rpc.get_latest_blockhash().await?)
    }

    #[instrument(skip(self, payer), fields(payer = %payer.pubkey()))]
    async fn create_mint(
        &self,
        payer: &Keypair,
        mint_authority: &Pubkey,
        freeze_authority: Option<&Pubkey>,
        decimals: u8,
    ) -> Result<(Pubkey, Signature), LedgerError> {
        let mint = Keypair::new();

        self.throttle().await;
        let rent = self
            .rpc
            .get_minimum_balance_for_rent_exemption(spl_token::state::Mint::LEN)
            .await?;

        let instructions = vec![
            system_instruction::create_account(
                &payer.pubkey(),
                &mint.pubkey(),
                rent,
                spl_token::state::Mint::LEN as u64,
                &spl_token::id(),
            ),
            spl_token::instruction::initialize_mint2(
                &spl_token::id(),
                &mint.pubkey(),
                mint_authority,
                freeze_authority,
                decimals,
            )
            .map_err(|e| LedgerError::Instruction(e.to_string()))?,
        ];

        let signature = self.sign_and_send(&instructions, payer, &[&mint]).await?;
        debug!("Mint {} submitted: {}", mint.pubkey(), signature);
        Ok((mint.pubkey(), signature))
    }

    #[instrument(skip(self, payer))]
    async fn get_or_create_associated_account(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> Result<HolderAccount, LedgerError> {
        let address = associated_holder_address(owner, mint);

        self.throttle().await;
        let existing = self
            .rpc
            .get_account_with_commitment(&address, self.rpc.commitment())
            .await?
            .value;

        if existing.is_some() {
            debug!("Holder account {} already exists", address);
            return Ok(HolderAccount { address, created: None });
        }

        let instruction =
            create_associated_token_account_idempotent(&payer.pubkey(), owner, mint, &spl_token::id());
        let signature = self.sign_and_send(&[instruction], payer, &[]).await?;
        Ok(HolderAccount {
            address,
            created: Some(signature),
        })
    }

    #[instrument(skip(self, payer, authority))]
    async fn mint_to(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        authority: &Keypair,
        amount: u64,
    ) -> Result<Signature, LedgerError> {
        let instruction = spl_token::instruction::mint_to(
            &spl_token::id(),
            mint,
            destination,
            &authority.pubkey(),
            &[],
            amount,
        )
        .map_err(|e| LedgerError::Instruction(e.to_string()))?;

        self.sign_and_send(&[instruction], payer, &[authority]).await
    }

    #[instrument(skip(self))]
    async fn token_account_amount(&self, account: &Pubkey) -> Result<u64, LedgerError> {
        self.throttle().await;
        let balance = self.rpc.get_token_account_balance(account).await?;
        balance
            .amount
            .parse::<u64>()
            .map_err(|e| LedgerError::Rpc(format!("invalid token amount {:?}: {}", balance.amount, e)))
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        self.throttle().await;
        Ok(self.rpc.send_transaction(transaction).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_associated_address_is_deterministic() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        assert_eq!(
            associated_holder_address(&owner, &mint),
            associated_holder_address(&owner, &mint)
        );
        assert_ne!(
            associated_holder_address(&owner, &mint),
            associated_holder_address(&owner, &Pubkey::new_unique())
        );
    }

    #[tokio::test]
    async fn test_rpc_ledger_construction() {
        let config = WorkflowConfig::default();
        let ledger = RpcLedger::new(&config);
        assert_eq!(ledger.url(), "https://api.devnet.solana.com");
    }
}
