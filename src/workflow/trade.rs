//! Trade action: transfer a fixed quantity of a token.
//!
//! Source and destination are both the owner's associated holder account for
//! the mint, so a trade is a self-transfer. It still exercises the full
//! build, sign, broadcast and confirm path.

use crate::types::TokenInstance;
use crate::workflow::confirmation::wait_for_confirmation;
use crate::workflow::error::{LedgerError, WalletError};
use crate::workflow::ledger::{associated_holder_address, LedgerClient};
use crate::workflow::types::WorkflowConfig;
use crate::workflow::wallet::WalletAdapter;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tracing::{debug, instrument};

/// Build the unsigned transfer transaction for `mint`.
pub fn build_transfer(owner: &Pubkey, mint: &Pubkey, amount: u64, decimals: u8) -> Result<Transaction, LedgerError> {
    let source = associated_holder_address(owner, mint);
    let destination = associated_holder_address(owner, mint);

    let instruction = spl_token::instruction::transfer_checked(
        &spl_token::id(),
        &source,
        mint,
        &destination,
        owner,
        &[],
        amount,
        decimals,
    )
    .map_err(|e| LedgerError::Instruction(e.to_string()))?;

    Ok(Transaction::new_with_payer(&[instruction], Some(owner)))
}

/// Execute a trade of `token` signed by `wallet`.
///
/// Returns `Ok(None)` without touching the ledger when the token has no mint.
#[instrument(skip(ledger, wallet, token, config), fields(symbol = %token.symbol()))]
pub async fn execute_trade(
    ledger: &dyn LedgerClient,
    wallet: &dyn WalletAdapter,
    owner: &Pubkey,
    token: &TokenInstance,
    config: &WorkflowConfig,
) -> Result<Option<Signature>, WalletError> {
    let Some(mint) = token.mint() else {
        debug!("{} has no mint, nothing to trade", token.symbol());
        return Ok(None);
    };

    let mut transaction = build_transfer(owner, &mint, config.trade_amount, config.token_decimals)?;
    transaction.message.recent_blockhash = ledger.latest_blockhash().await?;

    let signature = wallet.send_transaction(transaction, ledger).await?;
    wait_for_confirmation(ledger, &signature, &config.confirmation).await?;

    Ok(Some(signature))
}
