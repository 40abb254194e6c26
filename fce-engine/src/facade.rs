//! Component G: the façade (spec.md §4.G). Exposes the six public commands
//! and enforces the pre-flight checks that don't belong to any single
//! state machine: per-account serialization and amount validation.

use std::sync::Arc;

use dashmap::DashMap;
use fce_model::{AccountId, FeeCreditError, FeeCreditRecord, Proof};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use crate::add_fee::{self, AddFeeTxProofs};
use crate::builder;
use crate::client::{owner_proof, AccountManager, FcrIdGenerator, PartitionClient};
use crate::config::FeeCreditConfig;
use crate::deps::Deps;
use crate::dust::{self, DustCollectionResult};
use crate::reclaim_fee::{self, ReclaimFeeTxProofs};
use crate::selector;
use crate::submitter::Submitter;
use crate::wal::FeeManagerDb;

/// The fee-credit lifecycle engine, assembled from its external
/// collaborators (spec §6). One instance serves every account on this
/// (money, target) partition pair.
pub struct FeeCreditFacade {
    money_client: Arc<dyn PartitionClient>,
    target_client: Arc<dyn PartitionClient>,
    wal: Arc<dyn FeeManagerDb>,
    account_manager: Arc<dyn AccountManager>,
    fcr_id_gen: Arc<dyn FcrIdGenerator>,
    config: FeeCreditConfig,
    /// Per-account serialization so two concurrent calls for the same
    /// account queue instead of racing on the WAL (spec §5, §4.G′).
    locks: DashMap<AccountId, Arc<AsyncMutex<()>>>,
}

impl FeeCreditFacade {
    fn deps(&self) -> Deps<'_> {
        Deps {
            money: self.money_client.as_ref(),
            target: self.target_client.as_ref(),
            wal: self.wal.as_ref(),
            accounts: self.account_manager.as_ref(),
            fcr_ids: self.fcr_id_gen.as_ref(),
            config: &self.config,
        }
    }

    fn account_lock(&self, account_id: &AccountId) -> Arc<AsyncMutex<()>> {
        self.locks
            .entry(account_id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    pub async fn add_fee_credit(
        &self,
        account_index: u32,
        account_id: &AccountId,
        amount: u64,
        disable_locking: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<AddFeeTxProofs>, FeeCreditError> {
        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;
        let key = self.account_manager.get_account_key(account_index).await?;
        add_fee::add_fee_credit(
            &self.deps(),
            account_id,
            &key,
            amount,
            disable_locking,
            cancel,
        )
        .await
    }

    pub async fn reclaim_fee_credit(
        &self,
        account_index: u32,
        account_id: &AccountId,
        disable_locking: bool,
        cancel: &CancellationToken,
    ) -> Result<ReclaimFeeTxProofs, FeeCreditError> {
        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;
        let key = self.account_manager.get_account_key(account_index).await?;
        reclaim_fee::reclaim_fee_credit(&self.deps(), account_id, &key, disable_locking, cancel).await
    }

    pub async fn collect_dust(
        &self,
        account_index: u32,
        account_id: &AccountId,
        cancel: &CancellationToken,
    ) -> Result<Option<DustCollectionResult>, FeeCreditError> {
        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;
        let key = self.account_manager.get_account_key(account_index).await?;
        dust::collect_dust(&self.deps(), account_id, &key, cancel).await
    }

    /// `LockFeeCredit{account, lock_status}` (spec §4.D). Single-leg,
    /// standalone: requires `balance >= 2*max_fee` and the FCR unlocked.
    pub async fn lock_fee_credit(
        &self,
        account_index: u32,
        account_id: &AccountId,
        lock_status: u64,
        cancel: &CancellationToken,
    ) -> Result<Proof, FeeCreditError> {
        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;
        let key = self.account_manager.get_account_key(account_index).await?;
        let deps = self.deps();

        let fcr = selector::fetch_fcr(deps.target, account_id, deps.target_partition_id())
            .await?
            .ok_or(FeeCreditError::NoFeeCredit)?;
        if fcr.is_locked() {
            return Err(FeeCreditError::FcrAlreadyLocked);
        }
        if fcr.balance < 2 * deps.config.max_fee {
            return Err(FeeCreditError::NotEnoughFeeCredit);
        }

        let round = deps
            .target
            .get_round_number()
            .await
            .map_err(FeeCreditError::from)?;
        let opts = fce_model::BuilderOptions {
            timeout: round + deps.config.lock_fc_timeout_rounds,
            max_fee: deps.config.max_fee,
            fee_credit_record_id: Some(fcr.id.clone()),
            owner_proof: owner_proof(&key, &fcr.id),
            reference_number: None,
        };
        let order = builder::build_lock_fc(fcr.id.clone(), deps.target_partition_id(), lock_status, &opts);
        let submitter = Submitter::new(deps.target, deps.config.poll_interval);
        submitter
            .submit_and_confirm(&order, cancel)
            .await?
            .ok_or_else(|| FeeCreditError::internal("lockFC did not confirm before timeout"))
    }

    /// `UnlockFeeCredit{account}` (spec §4.D). Requires `balance > 0` and
    /// the FCR locked.
    pub async fn unlock_fee_credit(
        &self,
        account_index: u32,
        account_id: &AccountId,
        cancel: &CancellationToken,
    ) -> Result<Proof, FeeCreditError> {
        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;
        let key = self.account_manager.get_account_key(account_index).await?;
        let deps = self.deps();

        let fcr = selector::fetch_fcr(deps.target, account_id, deps.target_partition_id())
            .await?
            .ok_or(FeeCreditError::NoFeeCredit)?;
        if !fcr.is_locked() {
            return Err(FeeCreditError::FcrAlreadyUnlocked);
        }
        if fcr.is_empty() {
            return Err(FeeCreditError::NotEnoughFeeCredit);
        }

        let round = deps
            .target
            .get_round_number()
            .await
            .map_err(FeeCreditError::from)?;
        let opts = fce_model::BuilderOptions {
            timeout: round + deps.config.lock_fc_timeout_rounds,
            max_fee: deps.config.max_fee,
            fee_credit_record_id: Some(fcr.id.clone()),
            owner_proof: owner_proof(&key, &fcr.id),
            reference_number: None,
        };
        let order = builder::build_unlock_fc(fcr.id.clone(), deps.target_partition_id(), &opts);
        let submitter = Submitter::new(deps.target, deps.config.poll_interval);
        submitter
            .submit_and_confirm(&order, cancel)
            .await?
            .ok_or_else(|| FeeCreditError::internal("unlockFC did not confirm before timeout"))
    }

    /// `GetFeeCredit{account}` (spec §4.G).
    pub async fn get_fee_credit(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<FeeCreditRecord>, FeeCreditError> {
        let deps = self.deps();
        selector::fetch_fcr(deps.target, account_id, deps.target_partition_id()).await
    }
}

pub struct FeeCreditFacadeBuilder {
    money_client: Option<Arc<dyn PartitionClient>>,
    target_client: Option<Arc<dyn PartitionClient>>,
    wal: Option<Arc<dyn FeeManagerDb>>,
    account_manager: Option<Arc<dyn AccountManager>>,
    fcr_id_gen: Option<Arc<dyn FcrIdGenerator>>,
    config: Option<FeeCreditConfig>,
}

impl Default for FeeCreditFacadeBuilder {
    fn default() -> Self {
        Self {
            money_client: None,
            target_client: None,
            wal: None,
            account_manager: None,
            fcr_id_gen: None,
            config: None,
        }
    }
}

impl FeeCreditFacadeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn money_client(mut self, client: Arc<dyn PartitionClient>) -> Self {
        self.money_client = Some(client);
        self
    }

    pub fn target_client(mut self, client: Arc<dyn PartitionClient>) -> Self {
        self.target_client = Some(client);
        self
    }

    pub fn wal(mut self, wal: Arc<dyn FeeManagerDb>) -> Self {
        self.wal = Some(wal);
        self
    }

    pub fn account_manager(mut self, account_manager: Arc<dyn AccountManager>) -> Self {
        self.account_manager = Some(account_manager);
        self
    }

    pub fn fcr_id_gen(mut self, fcr_id_gen: Arc<dyn FcrIdGenerator>) -> Self {
        self.fcr_id_gen = Some(fcr_id_gen);
        self
    }

    pub fn config(mut self, config: FeeCreditConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<FeeCreditFacade, FeeCreditError> {
        Ok(FeeCreditFacade {
            money_client: self
                .money_client
                .ok_or_else(|| FeeCreditError::internal("money_client not set"))?,
            target_client: self
                .target_client
                .ok_or_else(|| FeeCreditError::internal("target_client not set"))?,
            wal: self
                .wal
                .ok_or_else(|| FeeCreditError::internal("wal not set"))?,
            account_manager: self
                .account_manager
                .ok_or_else(|| FeeCreditError::internal("account_manager not set"))?,
            fcr_id_gen: self
                .fcr_id_gen
                .ok_or_else(|| FeeCreditError::internal("fcr_id_gen not set"))?,
            config: self
                .config
                .ok_or_else(|| FeeCreditError::internal("config not set"))?,
            locks: DashMap::new(),
        })
    }
}
