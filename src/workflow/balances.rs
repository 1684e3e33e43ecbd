//! Native and token balance lookups.

use crate::types::{to_ui_amount, TokenInstance};
use crate::workflow::error::LedgerError;
use crate::workflow::ledger::{associated_holder_address, LedgerClient};
use futures::future::join_all;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, instrument, warn};

/// Result of a token balance refresh.
#[derive(Debug, Clone)]
pub struct BalanceRefresh {
    /// Catalog with every successfully fetched balance applied
    pub tokens: Vec<TokenInstance>,
    /// Symbols whose lookup failed and kept their previous balance
    pub failed: Vec<String>,
}

/// Native balance of `owner`, scaled for display.
#[instrument(skip(ledger))]
pub async fn fetch_native_balance(ledger: &dyn LedgerClient, owner: &Pubkey, scale: u64) -> Result<f64, LedgerError> {
    let lamports = ledger.native_balance(owner).await?;
    Ok(to_ui_amount(lamports, scale))
}

/// Query every minted token's holder balance concurrently.
///
/// The returned catalog is only assembled once every lookup has settled. A
/// failed lookup leaves that entry's previous balance (or absence) in place.
#[instrument(skip(ledger, tokens), fields(count = tokens.len()))]
pub async fn refresh_token_balances(
    ledger: &dyn LedgerClient,
    owner: &Pubkey,
    tokens: Vec<TokenInstance>,
    scale: u64,
) -> BalanceRefresh {
    let lookups = tokens.into_iter().map(move |token| async move {
        let Some(mint) = token.mint() else {
            return (token, true);
        };

        let holder = associated_holder_address(owner, &mint);
        match ledger.token_account_amount(&holder).await {
            Ok(raw) => {
                let mut token = token;
                token.set_balance(to_ui_amount(raw, scale));
                debug!("{} balance: {:?}", token.symbol(), token.balance());
                (token, true)
            }
            Err(e) => {
                warn!("Error fetching balance for {} at {}: {}", token.symbol(), holder, e);
                (token, false)
            }
        }
    });

    let settled = join_all(lookups).await;

    let mut refresh = BalanceRefresh {
        tokens: Vec::with_capacity(settled.len()),
        failed: Vec::new(),
    };
    for (token, ok) in settled {
        if !ok {
            refresh.failed.push(token.symbol().to_string());
        }
        refresh.tokens.push(token);
    }
    refresh
}
