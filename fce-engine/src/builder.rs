//! One pure function per order type (spec §6's "transaction builder"). No
//! I/O, no signing logic beyond embedding the already-computed owner proof.

use fce_model::{BuilderOptions, OrderAttributes, PartitionId, Proof, TransactionOrder, TransactionType, UnitId};

/// Reason code used when locking an FCR or bill ahead of a protocol run.
pub mod lock_reason {
    pub const ADD_FEE_CREDIT: u64 = 1;
    pub const RECLAIM_FEES: u64 = 2;
    pub const COLLECT_DUST: u64 = 3;
}

fn base(
    kind: TransactionType,
    unit_id: UnitId,
    partition_id: PartitionId,
    attributes: OrderAttributes,
    opts: &BuilderOptions,
) -> TransactionOrder {
    TransactionOrder {
        kind,
        unit_id,
        partition_id,
        attributes,
        timeout: opts.timeout,
        max_fee: opts.max_fee,
        fee_credit_record_id: opts.fee_credit_record_id.clone(),
        reference_number: opts.reference_number.clone(),
        owner_proof: opts.owner_proof.clone(),
    }
}

/// lockFC: set the FCR's lock status on the target partition.
pub fn build_lock_fc(
    fcr_id: UnitId,
    partition_id: PartitionId,
    lock_status: u64,
    opts: &BuilderOptions,
) -> TransactionOrder {
    base(
        TransactionType::LockFc,
        fcr_id,
        partition_id,
        OrderAttributes::LockFc { lock_status },
        opts,
    )
}

/// unlockFC: clear the FCR's lock status on the target partition.
pub fn build_unlock_fc(
    fcr_id: UnitId,
    partition_id: PartitionId,
    opts: &BuilderOptions,
) -> TransactionOrder {
    base(
        TransactionType::UnlockFc,
        fcr_id,
        partition_id,
        OrderAttributes::UnlockFc,
        opts,
    )
}

/// transferFC: earmark value from a money-partition bill for an FCR on
/// `target_system`, valid for addition until `latest_addition_time`.
#[allow(clippy::too_many_arguments)]
pub fn build_transfer_fc(
    source_bill_id: UnitId,
    money_partition_id: PartitionId,
    amount: u64,
    target_system: PartitionId,
    target_record_id: UnitId,
    earliest_addition_time: u64,
    latest_addition_time: u64,
    target_unit_counter: Option<u64>,
    source_bill_counter: u64,
    opts: &BuilderOptions,
) -> TransactionOrder {
    base(
        TransactionType::TransferFc,
        source_bill_id,
        money_partition_id,
        OrderAttributes::TransferFc {
            amount,
            target_system,
            target_record_id,
            earliest_addition_time,
            latest_addition_time,
            target_unit_counter,
            counter: source_bill_counter,
        },
        opts,
    )
}

/// addFC: consume a transferFC proof, crediting the FCR on the target
/// partition.
pub fn build_add_fc(
    fcr_id: UnitId,
    partition_id: PartitionId,
    transfer_fc_proof: Proof,
    owner_predicate: Vec<u8>,
    opts: &BuilderOptions,
) -> TransactionOrder {
    base(
        TransactionType::AddFc,
        fcr_id,
        partition_id,
        OrderAttributes::AddFc {
            transfer_fc_proof: Box::new(transfer_fc_proof),
            owner_predicate,
        },
        opts,
    )
}

/// closeFC: empty an FCR into a designated money-partition target bill.
pub fn build_close_fc(
    fcr_id: UnitId,
    partition_id: PartitionId,
    amount: u64,
    target_unit_id: UnitId,
    target_unit_counter: u64,
    opts: &BuilderOptions,
) -> TransactionOrder {
    base(
        TransactionType::CloseFc,
        fcr_id,
        partition_id,
        OrderAttributes::CloseFc {
            amount,
            target_unit_id,
            target_unit_counter,
        },
        opts,
    )
}

/// reclaimFC: consume a closeFC proof, crediting the money-partition target
/// bill.
pub fn build_reclaim_fc(
    target_bill_id: UnitId,
    money_partition_id: PartitionId,
    close_fc_proof: Proof,
    opts: &BuilderOptions,
) -> TransactionOrder {
    base(
        TransactionType::ReclaimFc,
        target_bill_id,
        money_partition_id,
        OrderAttributes::ReclaimFc {
            close_fc_proof: Box::new(close_fc_proof),
        },
        opts,
    )
}

/// lock: set a bill's lock status, optionally charging the fee from a named
/// FCR (used by ReclaimFeeCredit leg 1 and the dust collector's target-lock).
pub fn build_lock(
    bill_id: UnitId,
    money_partition_id: PartitionId,
    lock_status: u64,
    fee_credit_record_id: Option<UnitId>,
    opts: &BuilderOptions,
) -> TransactionOrder {
    base(
        TransactionType::Lock,
        bill_id,
        money_partition_id,
        OrderAttributes::Lock {
            lock_status,
            fee_credit_record_id,
        },
        opts,
    )
}

/// unlock: clear a bill's lock status.
pub fn build_unlock(
    bill_id: UnitId,
    money_partition_id: PartitionId,
    opts: &BuilderOptions,
) -> TransactionOrder {
    base(
        TransactionType::Unlock,
        bill_id,
        money_partition_id,
        OrderAttributes::Unlock,
        opts,
    )
}

/// transferDC: earmark a dust bill's value for merge into `target_unit_id`.
pub fn build_transfer_dc(
    source_bill_id: UnitId,
    money_partition_id: PartitionId,
    target_unit_id: UnitId,
    target_unit_counter: u64,
    opts: &BuilderOptions,
) -> TransactionOrder {
    base(
        TransactionType::TransferDc,
        source_bill_id,
        money_partition_id,
        OrderAttributes::TransferDc {
            target_unit_id,
            target_unit_counter,
        },
        opts,
    )
}

/// swap: consume every transferDC proof, merging the dust into the target
/// bill.
pub fn build_swap(
    target_bill_id: UnitId,
    money_partition_id: PartitionId,
    transfer_dc_proofs: Vec<Proof>,
    opts: &BuilderOptions,
) -> TransactionOrder {
    base(
        TransactionType::Swap,
        target_bill_id,
        money_partition_id,
        OrderAttributes::Swap { transfer_dc_proofs },
        opts,
    )
}
