use serde::{Deserialize, Serialize};

use crate::ids::{PartitionId, UnitId};

/// A balance-bearing unit on a partition that pays for transactions on that
/// partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCreditRecord {
    pub id: UnitId,
    pub partition_id: PartitionId,
    pub balance: u64,
    /// Absent before the record is created on-chain.
    pub counter: Option<u64>,
    /// `0` means unlocked; a non-zero value is a lock reason code.
    pub lock_status: u64,
}

impl FeeCreditRecord {
    pub fn is_locked(&self) -> bool {
        self.lock_status != 0
    }

    pub fn is_empty(&self) -> bool {
        self.balance == 0
    }
}
