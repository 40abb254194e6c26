//! Scripted test doubles shared by the integration tests (spec.md §8 literal
//! scenarios, SPEC_FULL.md §D). Not exported by the library — integration
//! tests can't see `pub(crate)` items, so this is its own small fake.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use fce_model::{
    AccountId, Bill, FeeCreditRecord, InclusionProof, OrderHash, PartitionId, Proof, ServerMetadata,
    SubmitError, TransactionOrder, TransactionRecord, TransactionStatus, UnitId,
};
use fce_engine::client::{AccountKey, AccountManager, FcrIdGenerator, PartitionClient, PartitionDescription, Signer};

/// A [`PartitionClient`] that confirms every submitted order immediately
/// (as though it landed in the very next block) unless the test explicitly
/// marks its hash as "never confirms", the scenario-level stand-in for an
/// order that times out.
pub struct ScriptedClient {
    partition_id: PartitionId,
    round: Mutex<u64>,
    bills: Mutex<HashMap<Vec<u8>, Bill>>,
    fcrs: Mutex<HashMap<Vec<u8>, FeeCreditRecord>>,
    sent: Mutex<HashMap<OrderHash, TransactionOrder>>,
    never_confirm: Mutex<HashSet<OrderHash>>,
}

impl ScriptedClient {
    pub fn new(partition_id: u32, round: u64) -> Self {
        Self {
            partition_id: PartitionId(partition_id),
            round: Mutex::new(round),
            bills: Mutex::new(HashMap::new()),
            fcrs: Mutex::new(HashMap::new()),
            sent: Mutex::new(HashMap::new()),
            never_confirm: Mutex::new(HashSet::new()),
        }
    }

    pub fn set_round(&self, round: u64) {
        *self.round.lock().unwrap() = round;
    }

    pub fn put_bill(&self, bill: Bill) {
        self.bills.lock().unwrap().insert(bill.id.as_bytes().to_vec(), bill);
    }

    pub fn remove_bill(&self, id: &UnitId) {
        self.bills.lock().unwrap().remove(id.as_bytes());
    }

    pub fn put_fcr(&self, owner: &AccountId, fcr: FeeCreditRecord) {
        self.fcrs.lock().unwrap().insert(owner.as_bytes().to_vec(), fcr);
    }

    /// Pre-register an order as already-sent, without a proof: the next
    /// `resume` will see it as "submitted, still pending" until either
    /// `never_confirm` it or the round clears its timeout.
    pub fn register_sent(&self, order: &TransactionOrder) {
        self.sent.lock().unwrap().insert(order.hash(), order.clone());
    }

    pub fn never_confirm(&self, hash: OrderHash) {
        self.never_confirm.lock().unwrap().insert(hash);
    }

    pub fn sent_orders(&self) -> Vec<TransactionOrder> {
        self.sent.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl PartitionClient for ScriptedClient {
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
        let hash = order.hash();
        self.sent.lock().unwrap().insert(hash, order.clone());
        Ok(hash)
    }

    async fn get_transaction_proof(
        &self,
        order_hash: &OrderHash,
    ) -> Result<Option<Proof>, SubmitError> {
        if self.never_confirm.lock().unwrap().contains(order_hash) {
            return Ok(None);
        }
        let sent = self.sent.lock().unwrap();
        Ok(sent.get(order_hash).map(|order| Proof {
            transaction_record: TransactionRecord {
                transaction_order: order.clone(),
                server_metadata: ServerMetadata {
                    actual_fee: 1,
                    status: TransactionStatus::Successful,
                },
            },
            inclusion_proof: InclusionProof(vec![0xAA]),
        }))
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
            partition_id: self.partition_id,
            partition_type_id: 0,
            network_id: 0,
            shard: self.partition_id.0,
        }
    }
}

pub struct FakeSigner;

impl Signer for FakeSigner {
    fn sign(&self, message: &[u8]) -> Vec<u8> {
        let mut sig = message.to_vec();
        sig.push(0xFF);
        sig
    }
}

pub struct FakeAccountManager;

#[async_trait]
impl AccountManager for FakeAccountManager {
    async fn get_account_key(&self, index: u32) -> Result<AccountKey, fce_model::FeeCreditError> {
        Ok(AccountKey {
            private_key: std::sync::Arc::new(FakeSigner),
            public_key: vec![index as u8; 4],
            public_key_hash: vec![index as u8; 8],
        })
    }

    async fn get_public_key(&self, index: u32) -> Result<Vec<u8>, fce_model::FeeCreditError> {
        Ok(vec![index as u8; 4])
    }

    async fn get_account_keys(&self) -> Result<Vec<AccountKey>, fce_model::FeeCreditError> {
        Ok(vec![self.get_account_key(0).await?])
    }
}

pub struct SequentialFcrIdGen;

impl FcrIdGenerator for SequentialFcrIdGen {
    fn generate(&self, shard: u32, public_key: &[u8], latest_addition_time: u64) -> UnitId {
        let mut bytes = vec![shard as u8];
        bytes.extend_from_slice(public_key);
        bytes.extend_from_slice(&latest_addition_time.to_be_bytes());
        UnitId::new(bytes)
    }
}

pub fn account() -> AccountId {
    AccountId::new(vec![0x42])
}

pub fn bill(id: u8, value: u64, counter: u64, partition: u32) -> Bill {
    Bill {
        id: UnitId::new(vec![id]),
        partition_id: PartitionId(partition),
        value,
        counter,
        lock_status: 0,
    }
}

pub fn fcr(id: u8, balance: u64, counter: Option<u64>, partition: u32) -> FeeCreditRecord {
    FeeCreditRecord {
        id: UnitId::new(vec![id]),
        partition_id: PartitionId(partition),
        balance,
        counter,
        lock_status: 0,
    }
}
