//! External collaborators the engine consumes (spec §6). Everything in this
//! module is a trait: the RPC transport, signing, and account storage are
//! owned elsewhere.

use async_trait::async_trait;
use fce_model::{AccountId, Bill, FeeCreditError, FeeCreditRecord, OrderHash, PartitionId, Proof, SubmitError, TransactionOrder, UnitId};

/// Static description of a partition, as returned by its client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionDescription {
    pub partition_id: PartitionId,
    pub partition_type_id: u32,
    pub network_id: u32,
    pub shard: u32,
}

/// A partition's RPC surface, as consumed by the engine. One instance per
/// partition (money, target — possibly the same partition for both).
#[async_trait]
pub trait PartitionClient: Send + Sync {
    async fn get_round_number(&self) -> Result<u64, SubmitError>;

    async fn get_bill(&self, unit_id: &UnitId) -> Result<Option<Bill>, SubmitError>;

    async fn get_bills(&self, owner_id: &AccountId) -> Result<Vec<Bill>, SubmitError>;

    async fn get_fee_credit_record_by_owner(
        &self,
        owner_id: &AccountId,
    ) -> Result<Option<FeeCreditRecord>, SubmitError>;

    /// Submit a signed order. Returns the order's hash, which is also
    /// `order.hash()` — callers use whichever is convenient.
    async fn send_transaction(&self, order: &TransactionOrder) -> Result<OrderHash, SubmitError>;

    async fn get_transaction_proof(
        &self,
        order_hash: &OrderHash,
    ) -> Result<Option<Proof>, SubmitError>;

    /// Convenience single-call submit-then-poll offered by some RPC
    /// backends. The engine's own submitter (component B) does not rely on
    /// this — it drives round-then-proof polling itself so cancellation and
    /// the lost-update race (spec §4.B point 5) stay under the engine's
    /// control.
    async fn confirm_transaction(
        &self,
        order: &TransactionOrder,
    ) -> Result<Option<Proof>, SubmitError>;

    fn partition_description(&self) -> PartitionDescription;
}

/// A signing key the engine never inspects; it only asks it to sign
/// payloads. Key derivation and the actual cryptography are out of scope
/// (spec §1) — this trait is the seam.
pub trait Signer: Send + Sync {
    fn sign(&self, message: &[u8]) -> Vec<u8>;
}

/// The keys for one wallet account, as handed back by the account manager.
pub struct AccountKey {
    pub private_key: std::sync::Arc<dyn Signer>,
    pub public_key: Vec<u8>,
    pub public_key_hash: Vec<u8>,
}

/// Storage and derivation of wallet account keys, owned elsewhere.
#[async_trait]
pub trait AccountManager: Send + Sync {
    async fn get_account_key(&self, index: u32) -> Result<AccountKey, FeeCreditError>;

    async fn get_public_key(&self, index: u32) -> Result<Vec<u8>, FeeCreditError>;

    async fn get_account_keys(&self) -> Result<Vec<AccountKey>, FeeCreditError>;
}

/// Pure derivation of a not-yet-created fee credit record's unit id from the
/// owner's public key and the `latest_addition_time` that will be embedded
/// in the transferFC that creates it. The exact bit layout is the target
/// partition's concern (spec §9 open question #3); this crate only needs the
/// function to be deterministic and injectable.
pub trait FcrIdGenerator: Send + Sync {
    fn generate(&self, shard: u32, public_key: &[u8], latest_addition_time: u64) -> UnitId;
}

/// Sign `unit_id` under `key`, the owner proof every builder function
/// embeds. The wire format of the signed payload is the signer's concern;
/// this crate only needs something deterministic to attach.
pub(crate) fn owner_proof(key: &AccountKey, unit_id: &UnitId) -> Vec<u8> {
    key.private_key.sign(unit_id.as_bytes())
}
