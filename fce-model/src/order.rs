use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::ids::{PartitionId, UnitId};
use crate::proof::Proof;

/// The canonical hash of a [`TransactionOrder`]; its identity for proof
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderHash(pub [u8; 32]);

impl std::fmt::Display for OrderHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// The transaction kinds this engine builds and submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum TransactionType {
    LockFc,
    UnlockFc,
    TransferFc,
    AddFc,
    CloseFc,
    ReclaimFc,
    Lock,
    Unlock,
    Transfer,
    Split,
    TransferDc,
    Swap,
}

/// Type-specific payload of a [`TransactionOrder`]. Field names follow the
/// glossary in spec.md.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderAttributes {
    LockFc {
        lock_status: u64,
    },
    UnlockFc,
    TransferFc {
        amount: u64,
        target_system: PartitionId,
        target_record_id: UnitId,
        earliest_addition_time: u64,
        latest_addition_time: u64,
        target_unit_counter: Option<u64>,
        /// Counter of the source bill at submission time.
        counter: u64,
    },
    AddFc {
        transfer_fc_proof: Box<Proof>,
        owner_predicate: Vec<u8>,
    },
    CloseFc {
        amount: u64,
        target_unit_id: UnitId,
        target_unit_counter: u64,
    },
    ReclaimFc {
        close_fc_proof: Box<Proof>,
    },
    Lock {
        lock_status: u64,
        fee_credit_record_id: Option<UnitId>,
    },
    Unlock,
    Transfer {
        amount: u64,
        target_owner_predicate: Vec<u8>,
    },
    Split {
        amount: u64,
        target_owner_predicate: Vec<u8>,
        remaining_owner_predicate: Vec<u8>,
    },
    TransferDc {
        target_unit_id: UnitId,
        target_unit_counter: u64,
    },
    Swap {
        transfer_dc_proofs: Vec<Proof>,
    },
}

/// A signed, typed instruction addressed to a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOrder {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub unit_id: UnitId,
    pub partition_id: PartitionId,
    pub attributes: OrderAttributes,
    /// Absolute target-partition round at which the order stops being valid.
    pub timeout: u64,
    pub max_fee: u64,
    pub fee_credit_record_id: Option<UnitId>,
    pub reference_number: Option<Vec<u8>>,
    /// Signature of the payload under the owning key.
    pub owner_proof: Vec<u8>,
}

impl TransactionOrder {
    /// Canonical hash of the order; its identity for proof lookup.
    pub fn hash(&self) -> OrderHash {
        let bytes = bincode::serialize(self).expect("TransactionOrder always serializes");
        let mut hasher = Sha3_256::new();
        hasher.update(&bytes);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        OrderHash(out)
    }
}

/// Options common to every order-building function, supplied by the caller
/// (the signing/account-manager layer lives outside this crate).
#[derive(Debug, Clone)]
pub struct BuilderOptions {
    pub timeout: u64,
    pub max_fee: u64,
    pub fee_credit_record_id: Option<UnitId>,
    pub owner_proof: Vec<u8>,
    pub reference_number: Option<Vec<u8>>,
}
