//! End-to-end scenarios for ReclaimFeeCredit (spec.md §8), driven entirely
//! through the public [`fce_engine::FeeCreditFacade`].

mod common;

use std::sync::Arc;

use common::{account, bill, fcr, FakeAccountManager, ScriptedClient, SequentialFcrIdGen};
use fce_engine::client::PartitionClient;
use fce_engine::config::FeeCreditConfig;
use fce_engine::wal::in_memory::InMemoryFeeManagerDb;
use fce_engine::wal::FeeManagerDb;
use fce_engine::FeeCreditFacadeBuilder;
use fce_model::{AddFeeContext, FeeCreditError, OrderAttributes, PartitionId, UnitId};
use tokio_util::sync::CancellationToken;

const MONEY_PARTITION: u32 = 1;
const TARGET_PARTITION: u32 = 2;
const MAX_FEE: u64 = 10;

fn build(
    money: &Arc<ScriptedClient>,
    target: &Arc<ScriptedClient>,
    wal: &Arc<InMemoryFeeManagerDb>,
) -> fce_engine::FeeCreditFacade {
    FeeCreditFacadeBuilder::new()
        .money_client(money.clone() as Arc<dyn PartitionClient>)
        .target_client(target.clone() as Arc<dyn PartitionClient>)
        .wal(wal.clone() as Arc<dyn FeeManagerDb>)
        .account_manager(Arc::new(FakeAccountManager))
        .fcr_id_gen(Arc::new(SequentialFcrIdGen))
        .config(FeeCreditConfig::new(MAX_FEE))
        .build()
        .unwrap()
}

#[tokio::test]
async fn scenario_6_happy_path_counter_bumped_by_the_lock() {
    let money = Arc::new(ScriptedClient::new(MONEY_PARTITION, 100));
    let target = Arc::new(ScriptedClient::new(TARGET_PARTITION, 100));
    let wal = Arc::new(InMemoryFeeManagerDb::new());

    money.put_fcr(&account(), fcr(50, 1_000, Some(0), MONEY_PARTITION));
    target.put_fcr(&account(), fcr(60, 100, Some(0), TARGET_PARTITION));
    money.put_bill(bill(3, 5_000_000, 5, MONEY_PARTITION));

    let facade = build(&money, &target, &wal);
    let proofs = facade
        .reclaim_fee_credit(0, &account(), false, &CancellationToken::new())
        .await
        .unwrap();

    assert!(proofs.lock.is_some());
    match &proofs.close_fc.transaction_record.transaction_order.attributes {
        OrderAttributes::CloseFc {
            target_unit_counter,
            ..
        } => assert_eq!(*target_unit_counter, 6, "the lock itself bumps the bill's counter"),
        other => panic!("unexpected attributes: {other:?}"),
    }
    assert!(wal
        .get_reclaim_fee_context(&account())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn no_fee_credit_when_target_fcr_absent() {
    let money = Arc::new(ScriptedClient::new(MONEY_PARTITION, 1));
    let target = Arc::new(ScriptedClient::new(TARGET_PARTITION, 1));
    let wal = Arc::new(InMemoryFeeManagerDb::new());
    let facade = build(&money, &target, &wal);

    let err = facade
        .reclaim_fee_credit(0, &account(), false, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FeeCreditError::NoFeeCredit));
}

#[tokio::test]
async fn fcr_locked_on_target_rejects_reclaim() {
    let money = Arc::new(ScriptedClient::new(MONEY_PARTITION, 1));
    let target = Arc::new(ScriptedClient::new(TARGET_PARTITION, 1));
    let wal = Arc::new(InMemoryFeeManagerDb::new());
    let mut locked = fcr(60, 100, Some(0), TARGET_PARTITION);
    locked.lock_status = 1;
    target.put_fcr(&account(), locked);
    let facade = build(&money, &target, &wal);

    let err = facade
        .reclaim_fee_credit(0, &account(), false, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FeeCreditError::FcrLocked));
}

#[tokio::test]
async fn balance_below_floor_rejects_reclaim() {
    let money = Arc::new(ScriptedClient::new(MONEY_PARTITION, 1));
    let target = Arc::new(ScriptedClient::new(TARGET_PARTITION, 1));
    let wal = Arc::new(InMemoryFeeManagerDb::new());
    // MinAddFeeAmount(10) = 21; balance 5 is below it.
    target.put_fcr(&account(), fcr(60, 5, Some(0), TARGET_PARTITION));
    let facade = build(&money, &target, &wal);

    let err = facade
        .reclaim_fee_credit(0, &account(), false, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FeeCreditError::NotEnoughFeeCredit));
}

#[tokio::test]
async fn add_in_flight_blocks_reclaim_fee_credit() {
    let money = Arc::new(ScriptedClient::new(MONEY_PARTITION, 1));
    let target = Arc::new(ScriptedClient::new(TARGET_PARTITION, 1));
    let wal = Arc::new(InMemoryFeeManagerDb::new());
    wal.set_add_fee_context(
        &account(),
        &AddFeeContext::new(PartitionId(TARGET_PARTITION), UnitId::new(vec![1]), 0, 100, false),
    )
    .await
    .unwrap();
    let facade = build(&money, &target, &wal);

    let err = facade
        .reclaim_fee_credit(0, &account(), false, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FeeCreditError::UnaddedFeeCreditPending));
}
