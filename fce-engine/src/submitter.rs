//! Component B: submit a signed order, then poll for its proof until
//! confirmation or on-chain timeout. Round number is always fetched before
//! the proof lookup, on every iteration, so a round that crosses the
//! timeout between the two checks can never be mistaken for "timed out
//! without a proof" when a proof was in fact produced (spec §4.B point 5).

use std::time::Duration;

use fce_model::{Proof, SubmitError, TransactionOrder};
use log::{debug, trace, warn};
use tokio_util::sync::CancellationToken;

use crate::client::PartitionClient;

/// Outcome of one order within a submitted batch (spec §4.B "Batching").
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Successful(Proof),
    OutOfGas(Proof),
    /// The partition executed and rejected it; still carries a proof. Not
    /// retried — a failed transaction is a final outcome.
    Failed(Proof),
    /// No proof was ever observed before every order in the batch timed out.
    UnknownStatus,
}

pub struct Submitter<'a> {
    client: &'a dyn PartitionClient,
    poll_interval: Duration,
}

impl<'a> Submitter<'a> {
    pub fn new(client: &'a dyn PartitionClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    /// Submit `order` and poll until its proof appears or `order.timeout`
    /// has passed. `Ok(None)` is the "timed out, no proof" signal the state
    /// machines treat as "rebuild and retry", not an error.
    pub async fn submit_and_confirm(
        &self,
        order: &TransactionOrder,
        cancel: &CancellationToken,
    ) -> Result<Option<Proof>, SubmitError> {
        let order_hash = self.client.send_transaction(order).await?;
        if log::log_enabled!(log::Level::Trace) {
            trace!("submitted {} ({order_hash}), polling for proof", order.kind);
        }
        self.poll_for_proof(&order_hash, order.timeout, cancel).await
    }

    /// Resume waiting on an order already submitted in a previous call
    /// (its hash and timeout are whatever was persisted in the WAL). Used by
    /// every leg's "tx set but no proof yet" branch.
    pub async fn wait_for_proof(
        &self,
        order_hash: &fce_model::OrderHash,
        timeout: u64,
        cancel: &CancellationToken,
    ) -> Result<Option<Proof>, SubmitError> {
        self.poll_for_proof(order_hash, timeout, cancel).await
    }

    async fn poll_for_proof(
        &self,
        order_hash: &fce_model::OrderHash,
        timeout: u64,
        cancel: &CancellationToken,
    ) -> Result<Option<Proof>, SubmitError> {
        loop {
            if cancel.is_cancelled() {
                return Err(SubmitError::Canceled);
            }

            // Round fetched before proof on every iteration: see module docs.
            let round = self.client.get_round_number().await?;
            if let Some(proof) = self.client.get_transaction_proof(order_hash).await? {
                return Ok(Some(proof));
            }

            if round >= timeout {
                debug!("order {order_hash} timed out at round {round} with no proof");
                return Ok(None);
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(SubmitError::Canceled),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Submit every order in `orders`, in order, then confirm all of them in
    /// one shared round-polling loop.
    pub async fn submit_batch_and_confirm(
        &self,
        orders: &[TransactionOrder],
        cancel: &CancellationToken,
    ) -> Result<Vec<BatchOutcome>, SubmitError> {
        let mut hashes = Vec::with_capacity(orders.len());
        for order in orders {
            hashes.push(self.client.send_transaction(order).await?);
        }

        let max_timeout = orders.iter().map(|o| o.timeout).max().unwrap_or(0);
        let mut outcomes: Vec<Option<Proof>> = vec![None; orders.len()];

        loop {
            if cancel.is_cancelled() {
                return Err(SubmitError::Canceled);
            }

            let round = self.client.get_round_number().await?;
            let mut all_resolved = true;
            for (i, hash) in hashes.iter().enumerate() {
                if outcomes[i].is_some() {
                    continue;
                }
                if let Some(proof) = self.client.get_transaction_proof(hash).await? {
                    outcomes[i] = Some(proof);
                } else {
                    all_resolved = false;
                }
            }

            if all_resolved {
                break;
            }
            if round >= max_timeout {
                warn!("batch confirm timed out at round {round}; some orders have no proof");
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(SubmitError::Canceled),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        Ok(outcomes
            .into_iter()
            .map(|maybe_proof| match maybe_proof {
                None => BatchOutcome::UnknownStatus,
                Some(proof) => match proof.status() {
                    fce_model::TransactionStatus::Successful => BatchOutcome::Successful(proof),
                    fce_model::TransactionStatus::OutOfGas => BatchOutcome::OutOfGas(proof),
                    fce_model::TransactionStatus::Failed => BatchOutcome::Failed(proof),
                },
            })
            .collect())
    }
}
