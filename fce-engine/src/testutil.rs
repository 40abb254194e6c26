//! Minimal scripted [`PartitionClient`] used by this crate's own
//! `#[cfg(test)]` modules (submitter, leg, selector). The richer
//! scenario-level fake lives in `tests/common` since integration tests
//! cannot see `pub(crate)` items.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use fce_model::{
    AccountId, Bill, FeeCreditRecord, OrderAttributes, OrderHash, PartitionId, Proof, ServerMetadata,
    SubmitError, TransactionOrder, TransactionRecord, TransactionStatus, TransactionType, UnitId,
};

use crate::client::{PartitionClient, PartitionDescription};

pub struct FakeClient {
    round: Mutex<u64>,
    bills: Mutex<HashMap<Vec<u8>, Bill>>,
    fcrs: Mutex<HashMap<Vec<u8>, FeeCreditRecord>>,
    /// order hash -> (polls remaining before the proof becomes visible, proof)
    pending_proofs: Mutex<HashMap<OrderHash, (u32, Proof)>>,
    sent: Mutex<Vec<TransactionOrder>>,
}

impl FakeClient {
    pub fn new(round: u64) -> Self {
        Self {
            round: Mutex::new(round),
            bills: Mutex::new(HashMap::new()),
            fcrs: Mutex::new(HashMap::new()),
            pending_proofs: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_round(&self, round: u64) {
        *self.round.lock().unwrap() = round;
    }

    pub fn put_bill(&self, bill: Bill) {
        self.bills.lock().unwrap().insert(bill.id.as_bytes().to_vec(), bill);
    }

    pub fn put_fcr(&self, owner: &AccountId, fcr: FeeCreditRecord) {
        self.fcrs.lock().unwrap().insert(owner.as_bytes().to_vec(), fcr);
    }

    /// A throwaway order carrying `timeout`, distinct enough that
    /// `order.hash()` can be queued and later matched.
    pub fn sample_order(&self, timeout: u64) -> TransactionOrder {
        TransactionOrder {
            kind: TransactionType::Lock,
            unit_id: UnitId::new(vec![0xAB]),
            partition_id: PartitionId(1),
            attributes: OrderAttributes::Lock {
                lock_status: 1,
                fee_credit_record_id: None,
            },
            timeout,
            max_fee: 3,
            fee_credit_record_id: None,
            reference_number: None,
            owner_proof: vec![0u8; 4],
        }
    }

    /// Queue a proof that becomes visible after `polls` calls to
    /// `get_transaction_proof` for this hash (1 == visible immediately).
    pub fn queue_proof_after(&self, hash: OrderHash, polls: u32, success: bool) {
        let status = if success {
            TransactionStatus::Successful
        } else {
            TransactionStatus::Failed
        };
        let proof = Proof {
            transaction_record: TransactionRecord {
                transaction_order: self.sample_order(0),
                server_metadata: ServerMetadata {
                    actual_fee: 1,
                    status,
                },
            },
            inclusion_proof: fce_model::InclusionProof(vec![1, 2, 3]),
        };
        self.pending_proofs
            .lock()
            .unwrap()
            .insert(hash, (polls.max(1), proof));
    }

    pub fn sent_orders(&self) -> Vec<TransactionOrder> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PartitionClient for FakeClient {
    async fn get_round_number(&self) -> Result<u64, SubmitError> {
        Ok(*self.round.lock().unwrap())
    }

    async fn get_bill(&self, unit_id: &UnitId) -> Result<Option<Bill>, SubmitError> {
        Ok(self.bills.lock().unwrap().get(unit_id.as_bytes()).cloned())
    }

    async fn get_bills(&self, _owner_id: &AccountId) -> Result<Vec<Bill>, SubmitError> {
        Ok(self.bills.lock().unwrap().values().cloned().collect())
    }

    async fn get_fee_credit_record_by_owner(
        &self,
        owner_id: &AccountId,
    ) -> Result<Option<FeeCreditRecord>, SubmitError> {
        Ok(self.fcrs.lock().unwrap().get(owner_id.as_bytes()).cloned())
    }

    async fn send_transaction(&self, order: &TransactionOrder) -> Result<OrderHash, SubmitError> {
        self.sent.lock().unwrap().push(order.clone());
        Ok(order.hash())
    }

    async fn get_transaction_proof(
        &self,
        order_hash: &OrderHash,
    ) -> Result<Option<Proof>, SubmitError> {
        let mut pending = self.pending_proofs.lock().unwrap();
        if let Some((remaining, proof)) = pending.get_mut(order_hash) {
            *remaining -= 1;
            if *remaining == 0 {
                return Ok(Some(proof.clone()));
            }
        }
        Ok(None)
    }

    async fn confirm_transaction(
        &self,
        order: &TransactionOrder,
    ) -> Result<Option<Proof>, SubmitError> {
        self.send_transaction(order).await?;
        self.get_transaction_proof(&order.hash()).await
    }

    fn partition_description(&self) -> PartitionDescription {
        PartitionDescription {
            partition_id: PartitionId(1),
            partition_type_id: 0,
            network_id: 0,
            shard: 0,
        }
    }
}
