//! Wait for a submitted transaction to reach a commitment level.
//!
//! Polls the signature status at a fixed interval instead of sleeping for a
//! fixed time and hoping the transaction landed.

use crate::workflow::error::LedgerError;
use crate::workflow::ledger::{LedgerClient, SignatureStatus};
use crate::workflow::types::ConfirmationPolicy;
use solana_sdk::signature::Signature;
use tokio_retry::{strategy::FixedInterval, RetryIf};
use tracing::{debug, instrument, warn};

/// Poll until `signature` is confirmed at `policy.commitment`.
///
/// Transient RPC errors and pending statuses are polled through; an on-chain
/// failure returns immediately. Running out of polls yields
/// `LedgerError::ConfirmationTimeout`.
#[instrument(skip(ledger, policy))]
pub async fn wait_for_confirmation(
    ledger: &dyn LedgerClient,
    signature: &Signature,
    policy: &ConfirmationPolicy,
) -> Result<(), LedgerError> {
    let strategy = FixedInterval::new(policy.poll_interval()).take(policy.max_polls);

    let result = RetryIf::spawn(
        strategy,
        || poll_status(ledger, signature, policy),
        |err: &LedgerError| err.is_transient(),
    )
    .await;

    match result {
        Ok(()) => {
            debug!("Transaction {} confirmed", signature);
            Ok(())
        }
        Err(LedgerError::Pending(_)) => {
            warn!("Transaction {} not confirmed after {} polls", signature, policy.max_polls);
            Err(LedgerError::ConfirmationTimeout(*signature))
        }
        Err(err) => Err(err),
    }
}

async fn poll_status(
    ledger: &dyn LedgerClient,
    signature: &Signature,
    policy: &ConfirmationPolicy,
) -> Result<(), LedgerError> {
    match ledger.signature_status(signature, policy.commitment).await? {
        SignatureStatus::Confirmed => Ok(()),
        SignatureStatus::Pending => Err(LedgerError::Pending(*signature)),
        SignatureStatus::Failed(reason) => Err(LedgerError::TransactionFailed {
            signature: *signature,
            reason,
        }),
    }
}
