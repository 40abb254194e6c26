//! Component F: the Dust Collector (spec.md §4.F).
//!
//! Merges many small bills into one target bill via lock(target) →
//! N×transferDC → swap. There is no WAL for dust collection (spec §9 open
//! question #2): a crash mid-run leaves whatever state is already on-chain,
//! and the next call starts a fresh run from there.

use fce_model::{AccountId, FeeCreditError, Proof};
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::builder;
use crate::client::{owner_proof, AccountKey};
use crate::deps::Deps;
use crate::selector;
use crate::submitter::{BatchOutcome, Submitter};

#[derive(Debug, Clone)]
pub struct DustCollectionResult {
    pub swap_proof: Proof,
    pub lock_proof: Proof,
}

/// `CollectDust{account}` (spec §4.F).
pub async fn collect_dust(
    deps: &Deps<'_>,
    account_id: &AccountId,
    key: &AccountKey,
    cancel: &CancellationToken,
) -> Result<Option<DustCollectionResult>, FeeCreditError> {
    let bills = selector::fetch_bills_ascending(deps.money, account_id).await?;
    if bills.len() < 2 {
        return Ok(None);
    }

    let money_fcr = selector::fetch_fcr(deps.money, account_id, deps.money_partition_id())
        .await?
        .ok_or(FeeCreditError::NoFeeCredit)?;

    let k = deps.config.max_bills_per_dc.min(bills.len() - 1);
    let sources = &bills[..k];
    let target = bills.last().expect("bills.len() >= 2").clone();

    let required = deps
        .config
        .max_fee
        .checked_mul(k as u64 + 2)
        .ok_or_else(|| FeeCreditError::internal("dust fee requirement overflowed"))?;
    if money_fcr.balance < required {
        return Err(FeeCreditError::NotEnoughFeeCredit);
    }

    let submitter = Submitter::new(deps.money, deps.config.poll_interval);
    let money_partition_id = deps.money_partition_id();

    // 1. Lock the target bill.
    let round = deps
        .money
        .get_round_number()
        .await
        .map_err(FeeCreditError::from)?;
    let lock_opts = fce_model::BuilderOptions {
        timeout: round + deps.config.dc_timeout_rounds,
        max_fee: deps.config.max_fee,
        fee_credit_record_id: Some(money_fcr.id.clone()),
        owner_proof: owner_proof(key, &target.id),
        reference_number: None,
    };
    let lock_order = builder::build_lock(
        target.id.clone(),
        money_partition_id,
        builder::lock_reason::COLLECT_DUST,
        Some(money_fcr.id.clone()),
        &lock_opts,
    );
    let lock_proof = submitter
        .submit_and_confirm(&lock_order, cancel)
        .await?
        .ok_or_else(|| FeeCreditError::internal("dust target lock did not confirm before timeout"))?;
    let target_counter = target.counter + 1;
    if log::log_enabled!(log::Level::Debug) {
        debug!("dust collection locked target {} for {account_id}", target.id);
    }

    // 2. Submit the transferDC batch.
    let mut transfer_orders = Vec::with_capacity(sources.len());
    for source in sources {
        let opts = fce_model::BuilderOptions {
            timeout: round + deps.config.dc_timeout_rounds,
            max_fee: deps.config.max_fee,
            fee_credit_record_id: Some(money_fcr.id.clone()),
            owner_proof: owner_proof(key, &source.id),
            reference_number: None,
        };
        transfer_orders.push(builder::build_transfer_dc(
            source.id.clone(),
            money_partition_id,
            target.id.clone(),
            target_counter,
            &opts,
        ));
    }

    let outcomes = submitter
        .submit_batch_and_confirm(&transfer_orders, cancel)
        .await?;
    let mut transfer_dc_proofs = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            BatchOutcome::Successful(proof) => transfer_dc_proofs.push(proof),
            other => {
                if log::log_enabled!(log::Level::Warn) {
                    warn!("transferDC batch failed for {account_id}: {other:?}");
                }
                return Err(FeeCreditError::internal(format!(
                    "transferDC batch did not fully succeed: {other:?}"
                )));
            }
        }
    }

    // 3. Swap.
    let swap_round = deps
        .money
        .get_round_number()
        .await
        .map_err(FeeCreditError::from)?;
    let swap_opts = fce_model::BuilderOptions {
        timeout: swap_round + deps.config.dc_timeout_rounds,
        max_fee: deps.config.max_fee,
        fee_credit_record_id: Some(money_fcr.id.clone()),
        owner_proof: owner_proof(key, &target.id),
        reference_number: None,
    };
    let swap_order = builder::build_swap(
        target.id.clone(),
        money_partition_id,
        transfer_dc_proofs,
        &swap_opts,
    );
    let swap_proof = submitter
        .submit_and_confirm(&swap_order, cancel)
        .await?
        .ok_or_else(|| FeeCreditError::internal("swap did not confirm before timeout"))?;

    Ok(Some(DustCollectionResult {
        swap_proof,
        lock_proof,
    }))
}
