//! Dust collection (spec.md §4.F), driven through the public façade.

mod common;

use std::sync::Arc;

use common::{account, bill, fcr, FakeAccountManager, ScriptedClient, SequentialFcrIdGen};
use fce_engine::client::PartitionClient;
use fce_engine::config::FeeCreditConfig;
use fce_engine::wal::in_memory::InMemoryFeeManagerDb;
use fce_engine::wal::FeeManagerDb;
use fce_engine::FeeCreditFacadeBuilder;
use fce_model::{FeeCreditError, OrderAttributes};
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
async fn merges_small_bills_into_the_largest() {
    let money = Arc::new(ScriptedClient::new(MONEY_PARTITION, 100));
    let target = Arc::new(ScriptedClient::new(TARGET_PARTITION, 100));
    let wal = Arc::new(InMemoryFeeManagerDb::new());

    money.put_bill(bill(1, 10, 0, MONEY_PARTITION));
    money.put_bill(bill(2, 20, 0, MONEY_PARTITION));
    money.put_bill(bill(3, 90, 2, MONEY_PARTITION));
    money.put_fcr(&account(), fcr(50, 1_000, Some(0), MONEY_PARTITION));

    let facade = build(&money, &target, &wal);
    let result = facade
        .collect_dust(0, &account(), &CancellationToken::new())
        .await
        .unwrap()
        .expect("two or more bills should trigger a collection run");

    match &result.lock_proof.transaction_record.transaction_order.attributes {
        OrderAttributes::Lock { .. } => {}
        other => panic!("unexpected lock attributes: {other:?}"),
    }
    match &result.swap_proof.transaction_record.transaction_order.attributes {
        OrderAttributes::Swap { transfer_dc_proofs } => assert_eq!(transfer_dc_proofs.len(), 2),
        other => panic!("unexpected swap attributes: {other:?}"),
    }
}

#[tokio::test]
async fn fewer_than_two_bills_is_a_no_op() {
    let money = Arc::new(ScriptedClient::new(MONEY_PARTITION, 100));
    let target = Arc::new(ScriptedClient::new(TARGET_PARTITION, 100));
    let wal = Arc::new(InMemoryFeeManagerDb::new());
    money.put_bill(bill(1, 10, 0, MONEY_PARTITION));

    let facade = build(&money, &target, &wal);
    let result = facade
        .collect_dust(0, &account(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn no_money_fcr_blocks_collection() {
    let money = Arc::new(ScriptedClient::new(MONEY_PARTITION, 100));
    let target = Arc::new(ScriptedClient::new(TARGET_PARTITION, 100));
    let wal = Arc::new(InMemoryFeeManagerDb::new());
    money.put_bill(bill(1, 10, 0, MONEY_PARTITION));
    money.put_bill(bill(2, 20, 0, MONEY_PARTITION));

    let facade = build(&money, &target, &wal);
    let err = facade
        .collect_dust(0, &account(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FeeCreditError::NoFeeCredit));
}

#[tokio::test]
async fn fcr_balance_below_required_fee_blocks_collection() {
    let money = Arc::new(ScriptedClient::new(MONEY_PARTITION, 100));
    let target = Arc::new(ScriptedClient::new(TARGET_PARTITION, 100));
    let wal = Arc::new(InMemoryFeeManagerDb::new());
    money.put_bill(bill(1, 10, 0, MONEY_PARTITION));
    money.put_bill(bill(2, 20, 0, MONEY_PARTITION));
    // required = max_fee * (k+2) = 10 * 4 = 40; balance 5 is far below it.
    money.put_fcr(&account(), fcr(50, 5, Some(0), MONEY_PARTITION));

    let facade = build(&money, &target, &wal);
    let err = facade
        .collect_dust(0, &account(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FeeCreditError::NotEnoughFeeCredit));
}
