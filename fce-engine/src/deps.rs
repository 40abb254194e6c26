//! The external collaborators (spec §6) bundled into one borrow so the state
//! machines (D, E, F) don't each carry five separate parameters.

use fce_model::PartitionId;

use crate::client::{AccountManager, FcrIdGenerator, PartitionClient};
use crate::config::FeeCreditConfig;
use crate::wal::FeeManagerDb;

/// Borrowed view of everything a protocol run needs. The façade owns these
/// for the engine's lifetime; each call borrows them for its duration.
pub(crate) struct Deps<'a> {
    pub money: &'a dyn PartitionClient,
    pub target: &'a dyn PartitionClient,
    pub wal: &'a dyn FeeManagerDb,
    pub accounts: &'a dyn AccountManager,
    pub fcr_ids: &'a dyn FcrIdGenerator,
    pub config: &'a FeeCreditConfig,
}

impl<'a> Deps<'a> {
    pub fn target_partition_id(&self) -> PartitionId {
        self.target.partition_description().partition_id
    }

    pub fn money_partition_id(&self) -> PartitionId {
        self.money.partition_description().partition_id
    }
}
