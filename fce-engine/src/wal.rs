//! Component A: the write-ahead log. A keyed, durable store of in-flight
//! protocol contexts, one per (account, direction). Grounded on
//! `chronx-state`'s `StateDb` (sled tree per namespace, `bincode` values) and
//! the teacher wallet's `EncryptedStorage::flush` (`flush_async` before
//! returning, so a write is durable before the caller submits anything).

use async_trait::async_trait;
use fce_model::{AccountId, AddFeeContext, FeeCreditError, ReclaimFeeContext};
use log::trace;
use std::path::Path;

#[async_trait]
pub trait FeeManagerDb: Send + Sync {
    async fn get_add_fee_context(
        &self,
        account: &AccountId,
    ) -> Result<Option<AddFeeContext>, FeeCreditError>;

    async fn set_add_fee_context(
        &self,
        account: &AccountId,
        ctx: &AddFeeContext,
    ) -> Result<(), FeeCreditError>;

    async fn delete_add_fee_context(&self, account: &AccountId) -> Result<(), FeeCreditError>;

    async fn get_reclaim_fee_context(
        &self,
        account: &AccountId,
    ) -> Result<Option<ReclaimFeeContext>, FeeCreditError>;

    async fn set_reclaim_fee_context(
        &self,
        account: &AccountId,
        ctx: &ReclaimFeeContext,
    ) -> Result<(), FeeCreditError>;

    async fn delete_reclaim_fee_context(&self, account: &AccountId) -> Result<(), FeeCreditError>;

    async fn close(&self) -> Result<(), FeeCreditError>;
}

fn storage_err(e: impl std::fmt::Display) -> FeeCreditError {
    FeeCreditError::internal(format!("WAL storage error: {e}"))
}

fn serialization_err(e: impl std::fmt::Display) -> FeeCreditError {
    FeeCreditError::internal(format!("WAL serialization error: {e}"))
}

/// sled-backed implementation. Two named trees, one per context namespace,
/// keyed by raw account identity bytes.
pub struct SledFeeManagerDb {
    db: sled::Db,
    add_fee: sled::Tree,
    reclaim_fee: sled::Tree,
}

impl SledFeeManagerDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FeeCreditError> {
        let db = sled::open(path).map_err(storage_err)?;
        let add_fee = db.open_tree("add_fee_contexts").map_err(storage_err)?;
        let reclaim_fee = db.open_tree("reclaim_fee_contexts").map_err(storage_err)?;
        Ok(Self {
            db,
            add_fee,
            reclaim_fee,
        })
    }
}

#[async_trait]
impl FeeManagerDb for SledFeeManagerDb {
    async fn get_add_fee_context(
        &self,
        account: &AccountId,
    ) -> Result<Option<AddFeeContext>, FeeCreditError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get_add_fee_context({account})");
        }
        match self.add_fee.get(account.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(serialization_err)?)),
            None => Ok(None),
        }
    }

    async fn set_add_fee_context(
        &self,
        account: &AccountId,
        ctx: &AddFeeContext,
    ) -> Result<(), FeeCreditError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("set_add_fee_context({account})");
        }
        let bytes = bincode::serialize(ctx).map_err(serialization_err)?;
        self.add_fee
            .insert(account.as_bytes(), bytes)
            .map_err(storage_err)?;
        self.db.flush_async().await.map_err(storage_err)?;
        Ok(())
    }

    async fn delete_add_fee_context(&self, account: &AccountId) -> Result<(), FeeCreditError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("delete_add_fee_context({account})");
        }
        self.add_fee.remove(account.as_bytes()).map_err(storage_err)?;
        self.db.flush_async().await.map_err(storage_err)?;
        Ok(())
    }

    async fn get_reclaim_fee_context(
        &self,
        account: &AccountId,
    ) -> Result<Option<ReclaimFeeContext>, FeeCreditError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get_reclaim_fee_context({account})");
        }
        match self.reclaim_fee.get(account.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(serialization_err)?)),
            None => Ok(None),
        }
    }

    async fn set_reclaim_fee_context(
        &self,
        account: &AccountId,
        ctx: &ReclaimFeeContext,
    ) -> Result<(), FeeCreditError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("set_reclaim_fee_context({account})");
        }
        let bytes = bincode::serialize(ctx).map_err(serialization_err)?;
        self.reclaim_fee
            .insert(account.as_bytes(), bytes)
            .map_err(storage_err)?;
        self.db.flush_async().await.map_err(storage_err)?;
        Ok(())
    }

    async fn delete_reclaim_fee_context(&self, account: &AccountId) -> Result<(), FeeCreditError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("delete_reclaim_fee_context({account})");
        }
        self.reclaim_fee
            .remove(account.as_bytes())
            .map_err(storage_err)?;
        self.db.flush_async().await.map_err(storage_err)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), FeeCreditError> {
        self.db.flush_async().await.map_err(storage_err)?;
        Ok(())
    }
}

/// In-memory test double implementing the same trait. Not a production
/// backend: nothing here survives a process restart, which is the entire
/// property the WAL exists to provide.
pub mod in_memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryFeeManagerDb {
        add_fee: Mutex<HashMap<AccountId, AddFeeContext>>,
        reclaim_fee: Mutex<HashMap<AccountId, ReclaimFeeContext>>,
    }

    impl InMemoryFeeManagerDb {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl FeeManagerDb for InMemoryFeeManagerDb {
        async fn get_add_fee_context(
            &self,
            account: &AccountId,
        ) -> Result<Option<AddFeeContext>, FeeCreditError> {
            Ok(self.add_fee.lock().await.get(account).cloned())
        }

        async fn set_add_fee_context(
            &self,
            account: &AccountId,
            ctx: &AddFeeContext,
        ) -> Result<(), FeeCreditError> {
            self.add_fee.lock().await.insert(account.clone(), ctx.clone());
            Ok(())
        }

        async fn delete_add_fee_context(&self, account: &AccountId) -> Result<(), FeeCreditError> {
            self.add_fee.lock().await.remove(account);
            Ok(())
        }

        async fn get_reclaim_fee_context(
            &self,
            account: &AccountId,
        ) -> Result<Option<ReclaimFeeContext>, FeeCreditError> {
            Ok(self.reclaim_fee.lock().await.get(account).cloned())
        }

        async fn set_reclaim_fee_context(
            &self,
            account: &AccountId,
            ctx: &ReclaimFeeContext,
        ) -> Result<(), FeeCreditError> {
            self.reclaim_fee
                .lock()
                .await
                .insert(account.clone(), ctx.clone());
            Ok(())
        }

        async fn delete_reclaim_fee_context(
            &self,
            account: &AccountId,
        ) -> Result<(), FeeCreditError> {
            self.reclaim_fee.lock().await.remove(account);
            Ok(())
        }

        async fn close(&self) -> Result<(), FeeCreditError> {
            Ok(())
        }
    }
}
