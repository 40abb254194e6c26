use serde::{Deserialize, Serialize};

use crate::order::{OrderHash, TransactionOrder};

/// Execution outcome of one transaction, as attached by the partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Successful,
    OutOfGas,
    Failed,
}

impl TransactionStatus {
    pub fn is_successful(&self) -> bool {
        matches!(self, TransactionStatus::Successful)
    }
}

/// Metadata the partition attaches once a transaction is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMetadata {
    /// The fee actually charged, which may be less than `max_fee`.
    pub actual_fee: u64,
    pub status: TransactionStatus,
}

/// Record of a transaction's execution. Carries the order itself (not just
/// its hash) so a confirmed proof remains inspectable downstream — e.g.
/// addFC needs to read `latest_addition_time` back out of a confirmed
/// transferFC's attributes when deciding whether that proof can still be
/// consumed (spec §4.D leg 3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_order: TransactionOrder,
    pub server_metadata: ServerMetadata,
}

impl TransactionRecord {
    pub fn order_hash(&self) -> OrderHash {
        self.transaction_order.hash()
    }
}

/// Opaque proof that a block containing a transaction record is final. This
/// crate never verifies inclusion proofs (out of scope, see spec.md §1); it
/// only carries them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof(pub Vec<u8>);

/// Pairs a transaction record with its inclusion proof. Presence of a proof
/// for a given order hash means on-chain confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub transaction_record: TransactionRecord,
    pub inclusion_proof: InclusionProof,
}

impl Proof {
    pub fn order_hash(&self) -> OrderHash {
        self.transaction_record.order_hash()
    }

    pub fn actual_fee(&self) -> u64 {
        self.transaction_record.server_metadata.actual_fee
    }

    pub fn status(&self) -> TransactionStatus {
        self.transaction_record.server_metadata.status
    }

    pub fn is_successful(&self) -> bool {
        self.status().is_successful()
    }
}
