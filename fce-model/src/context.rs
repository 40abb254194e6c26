use serde::{Deserialize, Serialize};

use crate::ids::{PartitionId, UnitId};
use crate::order::TransactionOrder;
use crate::proof::Proof;

/// Persistent context for one in-flight `AddFeeCredit` call, keyed by account
/// identity in the WAL.
///
/// Invariant: for each `*_proof` slot, if it is `Some` then the matching
/// `*_tx` slot is also `Some` and `proof.order_hash() == tx.hash()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddFeeContext {
    pub target_partition_id: PartitionId,
    pub target_bill_id: UnitId,
    pub target_bill_counter: u64,
    pub target_amount: u64,
    pub locking_disabled: bool,
    pub fee_credit_record_id: Option<UnitId>,

    pub lock_fc_tx: Option<TransactionOrder>,
    pub lock_fc_proof: Option<Proof>,
    pub transfer_fc_tx: Option<TransactionOrder>,
    pub transfer_fc_proof: Option<Proof>,
    pub add_fc_tx: Option<TransactionOrder>,
    pub add_fc_proof: Option<Proof>,
}

impl AddFeeContext {
    pub fn new(
        target_partition_id: PartitionId,
        target_bill_id: UnitId,
        target_bill_counter: u64,
        target_amount: u64,
        locking_disabled: bool,
    ) -> Self {
        Self {
            target_partition_id,
            target_bill_id,
            target_bill_counter,
            target_amount,
            locking_disabled,
            fee_credit_record_id: None,
            lock_fc_tx: None,
            lock_fc_proof: None,
            transfer_fc_tx: None,
            transfer_fc_proof: None,
            add_fc_tx: None,
            add_fc_proof: None,
        }
    }

    pub fn set_lock_fc_proof(&mut self, proof: Proof) {
        debug_assert!(self
            .lock_fc_tx
            .as_ref()
            .is_some_and(|tx| tx.hash() == proof.order_hash()));
        self.lock_fc_proof = Some(proof);
    }

    pub fn set_transfer_fc_proof(&mut self, proof: Proof) {
        debug_assert!(self
            .transfer_fc_tx
            .as_ref()
            .is_some_and(|tx| tx.hash() == proof.order_hash()));
        self.transfer_fc_proof = Some(proof);
    }

    pub fn set_add_fc_proof(&mut self, proof: Proof) {
        debug_assert!(self
            .add_fc_tx
            .as_ref()
            .is_some_and(|tx| tx.hash() == proof.order_hash()));
        self.add_fc_proof = Some(proof);
    }
}

/// Persistent context for one in-flight `ReclaimFeeCredit` call, keyed by
/// account identity in the WAL. Same invariant as [`AddFeeContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclaimFeeContext {
    pub target_partition_id: PartitionId,
    pub target_bill_id: UnitId,
    pub target_bill_counter: u64,
    pub locking_disabled: bool,

    pub lock_tx: Option<TransactionOrder>,
    pub lock_proof: Option<Proof>,
    pub close_fc_tx: Option<TransactionOrder>,
    pub close_fc_proof: Option<Proof>,
    pub reclaim_fc_tx: Option<TransactionOrder>,
    pub reclaim_fc_proof: Option<Proof>,
}

impl ReclaimFeeContext {
    pub fn new(
        target_partition_id: PartitionId,
        target_bill_id: UnitId,
        target_bill_counter: u64,
        locking_disabled: bool,
    ) -> Self {
        Self {
            target_partition_id,
            target_bill_id,
            target_bill_counter,
            locking_disabled,
            lock_tx: None,
            lock_proof: None,
            close_fc_tx: None,
            close_fc_proof: None,
            reclaim_fc_tx: None,
            reclaim_fc_proof: None,
        }
    }

    pub fn set_lock_proof(&mut self, proof: Proof) {
        debug_assert!(self
            .lock_tx
            .as_ref()
            .is_some_and(|tx| tx.hash() == proof.order_hash()));
        self.lock_proof = Some(proof);
    }

    pub fn set_close_fc_proof(&mut self, proof: Proof) {
        debug_assert!(self
            .close_fc_tx
            .as_ref()
            .is_some_and(|tx| tx.hash() == proof.order_hash()));
        self.close_fc_proof = Some(proof);
    }

    pub fn set_reclaim_fc_proof(&mut self, proof: Proof) {
        debug_assert!(self
            .reclaim_fc_tx
            .as_ref()
            .is_some_and(|tx| tx.hash() == proof.order_hash()));
        self.reclaim_fc_proof = Some(proof);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid() -> PartitionId {
        PartitionId(1)
    }

    fn uid(b: u8) -> UnitId {
        UnitId::new(vec![b])
    }

    #[test]
    fn round_trip_add_fee_context() {
        let ctx = AddFeeContext::new(pid(), uid(1), 7, 100, false);
        let bytes = bincode::serialize(&ctx).unwrap();
        let back: AddFeeContext = bincode::deserialize(&bytes).unwrap();
        assert_eq!(ctx, back);
    }

    #[test]
    fn round_trip_reclaim_fee_context() {
        let ctx = ReclaimFeeContext::new(pid(), uid(2), 3, true);
        let bytes = bincode::serialize(&ctx).unwrap();
        let back: ReclaimFeeContext = bincode::deserialize(&bytes).unwrap();
        assert_eq!(ctx, back);
    }
}
