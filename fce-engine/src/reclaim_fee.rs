//! Component E: the ReclaimFeeCredit state machine (spec.md §4.E).
//!
//! Drives lock → closeFC → reclaimFC to completion for one
//! [`ReclaimFeeContext`], resuming from whatever slots the WAL already
//! holds.

use fce_model::{AccountId, FeeCreditError, Proof, ReclaimFeeContext};
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::builder;
use crate::client::{owner_proof, AccountKey};
use crate::deps::Deps;
use crate::leg::{self, Resume};
use crate::selector;
use crate::submitter::Submitter;

#[derive(Debug, Clone)]
pub struct ReclaimFeeTxProofs {
    pub lock: Option<Proof>,
    pub close_fc: Proof,
    pub reclaim_fc: Proof,
}

/// `ReclaimFeeCredit{account, disable_locking}` (spec §4.E public contract).
pub async fn reclaim_fee_credit(
    deps: &Deps<'_>,
    account_id: &AccountId,
    key: &AccountKey,
    disable_locking: bool,
    cancel: &CancellationToken,
) -> Result<ReclaimFeeTxProofs, FeeCreditError> {
    if deps.wal.get_add_fee_context(account_id).await?.is_some() {
        return Err(FeeCreditError::UnaddedFeeCreditPending);
    }

    let target_partition_id = deps.target_partition_id();

    if let Some(mut ctx) = deps.wal.get_reclaim_fee_context(account_id).await? {
        if ctx.target_partition_id != target_partition_id {
            return Err(FeeCreditError::InvalidPartition {
                context: ctx.target_partition_id.0,
                requested: target_partition_id.0,
            });
        }
        let proofs = run_machine(&mut ctx, deps, account_id, key, cancel).await?;
        deps.wal.delete_reclaim_fee_context(account_id).await?;
        return Ok(proofs);
    }

    let fcr = selector::fetch_fcr(deps.target, account_id, target_partition_id)
        .await?
        .ok_or(FeeCreditError::NoFeeCredit)?;
    if fcr.is_locked() {
        return Err(FeeCreditError::FcrLocked);
    }
    if fcr.balance < deps.config.min_add_fee_amount() {
        return Err(FeeCreditError::NotEnoughFeeCredit);
    }

    let money_bills = selector::fetch_bills(deps.money, account_id).await?;
    let target_bill = selector::largest_unlocked_bill(&money_bills).ok_or_else(|| {
        FeeCreditError::internal("no unlocked money-partition bill to use as reclaim target")
    })?;

    let mut ctx = ReclaimFeeContext::new(
        target_partition_id,
        target_bill.id.clone(),
        target_bill.counter,
        disable_locking,
    );
    let proofs = run_machine(&mut ctx, deps, account_id, key, cancel).await?;
    deps.wal.delete_reclaim_fee_context(account_id).await?;
    Ok(proofs)
}

async fn run_machine(
    ctx: &mut ReclaimFeeContext,
    deps: &Deps<'_>,
    account_id: &AccountId,
    key: &AccountKey,
    cancel: &CancellationToken,
) -> Result<ReclaimFeeTxProofs, FeeCreditError> {
    run_lock(ctx, deps, account_id, key, cancel).await?;
    run_close_fc(ctx, deps, account_id, key, cancel).await?;
    run_reclaim_fc(ctx, deps, account_id, key, cancel).await?;

    Ok(ReclaimFeeTxProofs {
        lock: ctx.lock_proof.clone(),
        close_fc: ctx
            .close_fc_proof
            .clone()
            .expect("run_close_fc always leaves a proof on success"),
        reclaim_fc: ctx
            .reclaim_fc_proof
            .clone()
            .expect("run_reclaim_fc always leaves a proof on success"),
    })
}

/// Leg 1 — lock the target bill on the money partition (optional).
async fn run_lock(
    ctx: &mut ReclaimFeeContext,
    deps: &Deps<'_>,
    account_id: &AccountId,
    key: &AccountKey,
    cancel: &CancellationToken,
) -> Result<(), FeeCreditError> {
    if ctx.locking_disabled || ctx.lock_proof.is_some() {
        return Ok(());
    }

    let money_fcr = selector::fetch_fcr(deps.money, account_id, deps.money_partition_id()).await?;
    let money_fcr = match money_fcr {
        None => return Ok(()),
        Some(f) if f.is_empty() => return Ok(()),
        Some(f) => f,
    };

    let submitter = Submitter::new(deps.money, deps.config.poll_interval);

    loop {
        if let Some(tx) = ctx.lock_tx.clone() {
            match leg::resume(&submitter, &tx, cancel).await? {
                Resume::Confirmed(proof) => {
                    ctx.set_lock_proof(proof);
                    ctx.target_bill_counter += 1;
                    deps.wal.set_reclaim_fee_context(account_id, ctx).await?;
                    if log::log_enabled!(log::Level::Debug) {
                        debug!("reclaim lock confirmed for {account_id}");
                    }
                    return Ok(());
                }
                Resume::TimedOut => {
                    ctx.lock_tx = None;
                }
            }
        }

        let round = deps
            .money
            .get_round_number()
            .await
            .map_err(FeeCreditError::from)?;
        let opts = fce_model::BuilderOptions {
            timeout: round + deps.config.reclaim_leg_timeout_rounds,
            max_fee: deps.config.max_fee,
            fee_credit_record_id: Some(money_fcr.id.clone()),
            owner_proof: owner_proof(key, &ctx.target_bill_id),
            reference_number: None,
        };
        let order = builder::build_lock(
            ctx.target_bill_id.clone(),
            deps.money_partition_id(),
            builder::lock_reason::RECLAIM_FEES,
            Some(money_fcr.id.clone()),
            &opts,
        );
        ctx.lock_tx = Some(order.clone());
        deps.wal.set_reclaim_fee_context(account_id, ctx).await?;

        match submitter.submit_and_confirm(&order, cancel).await? {
            Some(proof) => {
                ctx.set_lock_proof(proof);
                ctx.target_bill_counter += 1;
                deps.wal.set_reclaim_fee_context(account_id, ctx).await?;
                return Ok(());
            }
            None => continue,
        }
    }
}

/// Leg 2 — closeFC (target partition). No compensation path on timeout: the
/// leg simply rebuilds with a fresh timeout and keeps trying (spec §4.E).
async fn run_close_fc(
    ctx: &mut ReclaimFeeContext,
    deps: &Deps<'_>,
    account_id: &AccountId,
    key: &AccountKey,
    cancel: &CancellationToken,
) -> Result<(), FeeCreditError> {
    if ctx.close_fc_proof.is_some() {
        return Ok(());
    }

    let submitter = Submitter::new(deps.target, deps.config.poll_interval);

    loop {
        if let Some(tx) = ctx.close_fc_tx.clone() {
            match leg::resume(&submitter, &tx, cancel).await? {
                Resume::Confirmed(proof) => {
                    ctx.set_close_fc_proof(proof);
                    deps.wal.set_reclaim_fee_context(account_id, ctx).await?;
                    if log::log_enabled!(log::Level::Debug) {
                        debug!("closeFC confirmed for {account_id}");
                    }
                    return Ok(());
                }
                Resume::TimedOut => {
                    ctx.close_fc_tx = None;
                }
            }
        }

        let fcr = selector::fetch_fcr(deps.target, account_id, ctx.target_partition_id)
            .await?
            .ok_or(FeeCreditError::NoFeeCredit)?;
        let round = deps
            .target
            .get_round_number()
            .await
            .map_err(FeeCreditError::from)?;
        let opts = fce_model::BuilderOptions {
            timeout: round + deps.config.reclaim_leg_timeout_rounds,
            max_fee: deps.config.max_fee,
            fee_credit_record_id: Some(fcr.id.clone()),
            owner_proof: owner_proof(key, &fcr.id),
            reference_number: None,
        };
        let order = builder::build_close_fc(
            fcr.id.clone(),
            ctx.target_partition_id,
            fcr.balance,
            ctx.target_bill_id.clone(),
            ctx.target_bill_counter,
            &opts,
        );
        ctx.close_fc_tx = Some(order.clone());
        deps.wal.set_reclaim_fee_context(account_id, ctx).await?;

        match submitter.submit_and_confirm(&order, cancel).await? {
            Some(proof) => {
                ctx.set_close_fc_proof(proof);
                deps.wal.set_reclaim_fee_context(account_id, ctx).await?;
                return Ok(());
            }
            None => continue,
        }
    }
}

/// Leg 3 — reclaimFC (money partition).
async fn run_reclaim_fc(
    ctx: &mut ReclaimFeeContext,
    deps: &Deps<'_>,
    account_id: &AccountId,
    key: &AccountKey,
    cancel: &CancellationToken,
) -> Result<(), FeeCreditError> {
    if ctx.reclaim_fc_proof.is_some() {
        return Ok(());
    }

    let submitter = Submitter::new(deps.money, deps.config.poll_interval);
    let close_fc_proof = ctx
        .close_fc_proof
        .clone()
        .expect("run_close_fc runs before run_reclaim_fc");

    loop {
        if let Some(tx) = ctx.reclaim_fc_tx.clone() {
            match leg::resume(&submitter, &tx, cancel).await? {
                Resume::Confirmed(proof) => {
                    ctx.set_reclaim_fc_proof(proof);
                    deps.wal.set_reclaim_fee_context(account_id, ctx).await?;
                    if log::log_enabled!(log::Level::Debug) {
                        debug!("reclaimFC confirmed for {account_id}");
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
                            ctx.reclaim_fc_tx = None;
                        }
                        _ => {
                            if log::log_enabled!(log::Level::Warn) {
                                warn!(
                                    "reclaimFC target bill changed or vanished for {account_id}; compensating"
                                );
                            }
                            return compensate_unlock_bill(ctx, deps, account_id, key, cancel)
                                .await
                                .and(Err(FeeCreditError::ReclaimFcTargetInvalid));
                        }
                    }
                }
            }
        }

        let round = deps
            .money
            .get_round_number()
            .await
            .map_err(FeeCreditError::from)?;
        let opts = fce_model::BuilderOptions {
            timeout: round + deps.config.reclaim_leg_timeout_rounds,
            max_fee: deps.config.max_fee,
            fee_credit_record_id: None,
            owner_proof: owner_proof(key, &ctx.target_bill_id),
            reference_number: None,
        };
        let order = builder::build_reclaim_fc(
            ctx.target_bill_id.clone(),
            deps.money_partition_id(),
            close_fc_proof.clone(),
            &opts,
        );
        ctx.reclaim_fc_tx = Some(order.clone());
        deps.wal.set_reclaim_fee_context(account_id, ctx).await?;

        match submitter.submit_and_confirm(&order, cancel).await? {
            Some(proof) => {
                ctx.set_reclaim_fc_proof(proof);
                deps.wal.set_reclaim_fee_context(account_id, ctx).await?;
                return Ok(());
            }
            None => continue,
        }
    }
}

async fn compensate_unlock_bill(
    ctx: &ReclaimFeeContext,
    deps: &Deps<'_>,
    account_id: &AccountId,
    key: &AccountKey,
    cancel: &CancellationToken,
) -> Result<(), FeeCreditError> {
    if ctx.lock_proof.is_some() {
        let round = deps
            .money
            .get_round_number()
            .await
            .map_err(FeeCreditError::from)?;
        let opts = fce_model::BuilderOptions {
            timeout: round + deps.config.reclaim_leg_timeout_rounds,
            max_fee: deps.config.max_fee,
            fee_credit_record_id: None,
            owner_proof: owner_proof(key, &ctx.target_bill_id),
            reference_number: None,
        };
        let order = builder::build_unlock(ctx.target_bill_id.clone(), deps.money_partition_id(), &opts);
        let submitter = Submitter::new(deps.money, deps.config.poll_interval);
        let _ = submitter.submit_and_confirm(&order, cancel).await?;
    }
    deps.wal.delete_reclaim_fee_context(account_id).await?;
    Ok(())
}
