//! Shared resume/advance machinery for one protocol leg (spec.md §9 redesign
//! note: "per-leg dispatch is a small step function"). `AddFeeCredit` and
//! `ReclaimFeeCredit` both drive three legs that share the same shape — has
//! the leg already produced a proof? is a transaction already in flight that
//! we only need to wait on? — so the waiting half lives here once.

use fce_model::{OrderHash, Proof, SubmitError, TransactionOrder};
use tokio_util::sync::CancellationToken;

use crate::submitter::Submitter;

/// Outcome of resuming a leg whose transaction was already submitted in a
/// previous call.
pub enum Resume {
    /// The transaction confirmed; here is its proof.
    Confirmed(Proof),
    /// `order.timeout` has passed with no proof observed. The caller decides
    /// whether to compensate or rebuild with a fresh timeout.
    TimedOut,
}

/// Wait on a transaction order that was persisted (and presumably
/// submitted) by a prior call.
pub async fn resume(
    submitter: &Submitter<'_>,
    tx: &TransactionOrder,
    cancel: &CancellationToken,
) -> Result<Resume, SubmitError> {
    let order_hash: OrderHash = tx.hash();
    match submitter.wait_for_proof(&order_hash, tx.timeout, cancel).await? {
        Some(proof) => Ok(Resume::Confirmed(proof)),
        None => Ok(Resume::TimedOut),
    }
}
