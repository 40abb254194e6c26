use serde::{Deserialize, Serialize};

use crate::ids::{PartitionId, UnitId};

/// A value-bearing unit on the money partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: UnitId,
    pub partition_id: PartitionId,
    pub value: u64,
    /// Monotonically increases on every successful state-changing
    /// transaction touching this unit.
    pub counter: u64,
    /// `0` means unlocked; a non-zero value is a lock reason code.
    pub lock_status: u64,
}

impl Bill {
    pub fn is_locked(&self) -> bool {
        self.lock_status != 0
    }
}
