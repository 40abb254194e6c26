//! Component D: the AddFeeCredit state machine (spec.md §4.D).
//!
//! Drives lockFC → transferFC → addFC to completion for one
//! [`AddFeeContext`], resuming from whatever slots the WAL already holds.

use fce_model::{
    AccountId, AddFeeContext, FeeCreditError, Proof, UnitId,
};
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::builder;
use crate::client::{owner_proof, AccountKey};
use crate::deps::Deps;
use crate::leg::{self, Resume};
use crate::selector;
use crate::submitter::Submitter;

/// Proofs produced by one successful run of the state machine. `lock_fc` is
/// absent when the leg was skipped (locking disabled, or no FCR to lock).
#[derive(Debug, Clone)]
pub struct AddFeeTxProofs {
    pub lock_fc: Option<Proof>,
    pub transfer_fc: Proof,
    pub add_fc: Proof,
}

/// `AddFeeCredit{account, amount, disable_locking}` (spec §4.D public
/// contract). Returns one [`AddFeeTxProofs`] per bill consumed to reach
/// `amount`.
pub async fn add_fee_credit(
    deps: &Deps<'_>,
    account_id: &AccountId,
    key: &AccountKey,
    amount: u64,
    disable_locking: bool,
    cancel: &CancellationToken,
) -> Result<Vec<AddFeeTxProofs>, FeeCreditError> {
    let floor = deps.config.min_add_fee_amount();
    if amount < floor {
        return Err(FeeCreditError::MinimumFeeAmount { minimum: floor });
    }

    if deps.wal.get_reclaim_fee_context(account_id).await?.is_some() {
        return Err(FeeCreditError::UnreclaimedFeeCreditPending);
    }

    let target_partition_id = deps.target_partition_id();

    if let Some(mut ctx) = deps.wal.get_add_fee_context(account_id).await? {
        if ctx.target_partition_id != target_partition_id {
            return Err(FeeCreditError::InvalidPartition {
                context: ctx.target_partition_id.0,
                requested: target_partition_id.0,
            });
        }
        let proofs = run_machine(&mut ctx, deps, account_id, key, cancel).await?;
        deps.wal.delete_add_fee_context(account_id).await?;
        return Ok(vec![proofs]);
    }

    let bills = selector::fetch_bills(deps.money, account_id).await?;
    let eligible = selector::eligible_add_fee_bills(&bills, deps.config.max_fee);
    selector::check_sufficient_balance(&eligible, amount)?;

    let mut results = Vec::new();
    let mut remaining = amount;
    for bill in eligible {
        if remaining == 0 {
            break;
        }
        let target_amount = bill.value.min(remaining);
        let mut ctx = AddFeeContext::new(
            target_partition_id,
            bill.id.clone(),
            bill.counter,
            target_amount,
            disable_locking,
        );
        let proofs = run_machine(&mut ctx, deps, account_id, key, cancel).await?;
        deps.wal.delete_add_fee_context(account_id).await?;
        results.push(proofs);
        remaining -= target_amount;
    }

    Ok(results)
}

async fn run_machine(
    ctx: &mut AddFeeContext,
    deps: &Deps<'_>,
    account_id: &AccountId,
    key: &AccountKey,
    cancel: &CancellationToken,
) -> Result<AddFeeTxProofs, FeeCreditError> {
    run_lock_fc(ctx, deps, account_id, key, cancel).await?;
    run_transfer_fc(ctx, deps, account_id, key, cancel).await?;
    run_add_fc(ctx, deps, account_id, key, cancel).await?;

    Ok(AddFeeTxProofs {
        lock_fc: ctx.lock_fc_proof.clone(),
        transfer_fc: ctx
            .transfer_fc_proof
            .clone()
            .expect("run_transfer_fc always leaves a proof on success"),
        add_fc: ctx
            .add_fc_proof
            .clone()
            .expect("run_add_fc always leaves a proof on success"),
    })
}

/// Leg 1 — lockFC. Skipped if locking is disabled, or the FCR is absent or
/// empty (spec §4.D leg 1).
async fn run_lock_fc(
    ctx: &mut AddFeeContext,
    deps: &Deps<'_>,
    account_id: &AccountId,
    key: &AccountKey,
    cancel: &CancellationToken,
) -> Result<(), FeeCreditError> {
    if ctx.locking_disabled || ctx.lock_fc_proof.is_some() {
        return Ok(());
    }

    let submitter = Submitter::new(deps.target, deps.config.poll_interval);

    loop {
        if let Some(tx) = ctx.lock_fc_tx.clone() {
            match leg::resume(&submitter, &tx, cancel).await? {
                Resume::Confirmed(proof) => {
                    ctx.set_lock_fc_proof(proof);
                    deps.wal.set_add_fee_context(account_id, ctx).await?;
                    if log::log_enabled!(log::Level::Debug) {
                        debug!("lockFC confirmed for {account_id}");
                    }
                    return Ok(());
                }
                Resume::TimedOut => {
                    ctx.lock_fc_tx = None;
                    // fall through to rebuild below
                }
            }
        }

        let fcr = selector::fetch_fcr(deps.target, account_id, ctx.target_partition_id).await?;
        let fcr = match fcr {
            None => return Ok(()),
            Some(f) if f.is_empty() => return Ok(()),
            Some(f) => f,
        };
        if fcr.is_locked() {
            return Err(FeeCreditError::FcrLocked);
        }

        ctx.fee_credit_record_id = Some(fcr.id.clone());
        let round = deps
            .target
            .get_round_number()
            .await
            .map_err(FeeCreditError::from)?;
        let opts = fce_model::BuilderOptions {
            timeout: round + deps.config.lock_fc_timeout_rounds,
            max_fee: deps.config.max_fee,
            fee_credit_record_id: Some(fcr.id.clone()),
            owner_proof: owner_proof(key, &fcr.id),
            reference_number: None,
        };
        let order = builder::build_lock_fc(
            fcr.id.clone(),
            ctx.target_partition_id,
            builder::lock_reason::ADD_FEE_CREDIT,
            &opts,
        );
        ctx.lock_fc_tx = Some(order.clone());
        deps.wal.set_add_fee_context(account_id, ctx).await?;

        match submitter.submit_and_confirm(&order, cancel).await? {
            Some(proof) => {
                ctx.set_lock_fc_proof(proof);
                deps.wal.set_add_fee_context(account_id, ctx).await?;
                return Ok(());
            }
            None => continue,
        }
    }
}

/// Leg 2 — transferFC (money partition).
async fn run_transfer_fc(
    ctx: &mut AddFeeContext,
    deps: &Deps<'_>,
    account_id: &AccountId,
    key: &AccountKey,
    cancel: &CancellationToken,
) -> Result<(), FeeCreditError> {
    if ctx.transfer_fc_proof.is_some() {
        return Ok(());
    }

    let submitter = Submitter::new(deps.money, deps.config.poll_interval);

    loop {
        if let Some(tx) = ctx.transfer_fc_tx.clone() {
            match leg::resume(&submitter, &tx, cancel).await? {
                Resume::Confirmed(proof) => {
                    ctx.set_transfer_fc_proof(proof);
                    deps.wal.set_add_fee_context(account_id, ctx).await?;
                    if log::log_enabled!(log::Level::Debug) {
                        debug!("transferFC confirmed for {account_id}");
                    }
                    return Ok(());
                }
                Resume::TimedOut => {
                    let bill = deps
                        .money
                        .get_bill(&ctx.target_bill_id)
                        .await
                        .map_err(FeeCreditError::from)?;
                    match bill {
                        Some(b) if b.counter == ctx.target_bill_counter => {
                            ctx.transfer_fc_tx = None;
                            // fall through to rebuild below
                        }
                        _ => {
                            if log::log_enabled!(log::Level::Warn) {
                                warn!(
                                    "transferFC target bill changed or vanished for {account_id}; compensating"
                                );
                            }
                            return compensate_unlock_fc(ctx, deps, account_id, key, cancel)
                                .await
                                .and(Err(FeeCreditError::TransferFcTargetInvalid));
                        }
                    }
                }
            }
        }

        let money_round = deps
            .money
            .get_round_number()
            .await
            .map_err(FeeCreditError::from)?;
        let target_round = deps
            .target
            .get_round_number()
            .await
            .map_err(FeeCreditError::from)?;
        let latest_addition_time = target_round + deps.config.latest_addition_time_window;

        let existing_fcr =
            selector::fetch_fcr(deps.target, account_id, ctx.target_partition_id).await?;
        let fcr_id = match &existing_fcr {
            Some(f) => f.id.clone(),
            None => {
                let shard = deps.target.partition_description().shard;
                deps.fcr_ids
                    .generate(shard, &key.public_key, latest_addition_time)
            }
        };
        ctx.fee_credit_record_id = Some(fcr_id.clone());

        let opts = fce_model::BuilderOptions {
            timeout: money_round + deps.config.transfer_fc_timeout_rounds,
            max_fee: deps.config.max_fee,
            fee_credit_record_id: None,
            owner_proof: owner_proof(key, &ctx.target_bill_id),
            reference_number: None,
        };
        let order = builder::build_transfer_fc(
            ctx.target_bill_id.clone(),
            deps.money_partition_id(),
            ctx.target_amount,
            ctx.target_partition_id,
            fcr_id,
            money_round,
            latest_addition_time,
            existing_fcr.and_then(|f| f.counter),
            ctx.target_bill_counter,
            &opts,
        );
        ctx.transfer_fc_tx = Some(order.clone());
        deps.wal.set_add_fee_context(account_id, ctx).await?;

        match submitter.submit_and_confirm(&order, cancel).await? {
            Some(proof) => {
                ctx.set_transfer_fc_proof(proof);
                deps.wal.set_add_fee_context(account_id, ctx).await?;
                return Ok(());
            }
            None => continue,
        }
    }
}

/// Leg 3 — addFC (target partition).
async fn run_add_fc(
    ctx: &mut AddFeeContext,
    deps: &Deps<'_>,
    account_id: &AccountId,
    key: &AccountKey,
    cancel: &CancellationToken,
) -> Result<(), FeeCreditError> {
    if ctx.add_fc_proof.is_some() {
        return Ok(());
    }

    let submitter = Submitter::new(deps.target, deps.config.poll_interval);
    let transfer_fc_proof = ctx
        .transfer_fc_proof
        .clone()
        .expect("run_transfer_fc runs before run_add_fc");
    let latest_addition_time = match &transfer_fc_proof.transaction_record.transaction_order.attributes
    {
        fce_model::OrderAttributes::TransferFc {
            latest_addition_time,
            ..
        } => *latest_addition_time,
        _ => {
            return Err(FeeCreditError::internal(
                "transfer_fc_proof does not carry TransferFc attributes",
            ))
        }
    };

    loop {
        if let Some(tx) = ctx.add_fc_tx.clone() {
            match leg::resume(&submitter, &tx, cancel).await? {
                Resume::Confirmed(proof) => {
                    ctx.set_add_fc_proof(proof);
                    deps.wal.set_add_fee_context(account_id, ctx).await?;
                    if log::log_enabled!(log::Level::Debug) {
                        debug!("addFC confirmed for {account_id}");
                    }
                    return Ok(());
                }
                Resume::TimedOut => {
                    let round = deps
                        .target
                        .get_round_number()
                        .await
                        .map_err(FeeCreditError::from)?;
                    if round >= latest_addition_time {
                        if log::log_enabled!(log::Level::Warn) {
                            warn!("addFC window expired for {account_id}; money is trapped off-chain");
                        }
                        return compensate_unlock_fc(ctx, deps, account_id, key, cancel)
                            .await
                            .and(Err(FeeCreditError::MoneyLost));
                    }
                    ctx.add_fc_tx = None;
                    // fall through to rebuild below, same transfer_fc_proof
                }
            }
        }

        let round = deps
            .target
            .get_round_number()
            .await
            .map_err(FeeCreditError::from)?;
        let fcr_id = ctx
            .fee_credit_record_id
            .clone()
            .expect("run_transfer_fc always sets fee_credit_record_id");
        let opts = fce_model::BuilderOptions {
            timeout: round + deps.config.add_fc_timeout_rounds,
            max_fee: deps.config.max_fee,
            fee_credit_record_id: Some(fcr_id.clone()),
            owner_proof: owner_proof(key, &fcr_id),
            reference_number: None,
        };
        let order = builder::build_add_fc(
            fcr_id,
            ctx.target_partition_id,
            transfer_fc_proof.clone(),
            key.public_key_hash.clone(),
            &opts,
        );
        ctx.add_fc_tx = Some(order.clone());
        deps.wal.set_add_fee_context(account_id, ctx).await?;

        match submitter.submit_and_confirm(&order, cancel).await? {
            Some(proof) => {
                ctx.set_add_fc_proof(proof);
                deps.wal.set_add_fee_context(account_id, ctx).await?;
                return Ok(());
            }
            None => continue,
        }
    }
}

/// Best-effort compensation: unlock the FCR if a lockFC was confirmed, then
/// delete the context (spec §4.2/§8: every terminal compensation path ends
/// with the context absent).
async fn compensate_unlock_fc(
    ctx: &AddFeeContext,
    deps: &Deps<'_>,
    account_id: &AccountId,
    key: &AccountKey,
    cancel: &CancellationToken,
) -> Result<(), FeeCreditError> {
    if let Some(lock_proof) = &ctx.lock_fc_proof {
        if let Some(fcr_id) = unlock_target(lock_proof) {
            let round = deps
                .target
                .get_round_number()
                .await
                .map_err(FeeCreditError::from)?;
            let opts = fce_model::BuilderOptions {
                timeout: round + deps.config.lock_fc_timeout_rounds,
                max_fee: deps.config.max_fee,
                fee_credit_record_id: Some(fcr_id.clone()),
                owner_proof: owner_proof(key, &fcr_id),
                reference_number: None,
            };
            let order = builder::build_unlock_fc(fcr_id, ctx.target_partition_id, &opts);
            let submitter = Submitter::new(deps.target, deps.config.poll_interval);
            let _ = submitter.submit_and_confirm(&order, cancel).await?;
        }
    }
    deps.wal.delete_add_fee_context(account_id).await?;
    Ok(())
}

fn unlock_target(lock_proof: &Proof) -> Option<UnitId> {
    Some(lock_proof.transaction_record.transaction_order.unit_id.clone())
}
