//! Component C: bill & FCR selection. Pure predicate/sort functions over
//! slices, plus thin async wrappers that fetch-then-filter (spec §9 redesign
//! note: "express as explicit predicate chains; no closures over mutable
//! state required").

use fce_model::{AccountId, Bill, FeeCreditError, FeeCreditRecord, PartitionId};

use crate::client::PartitionClient;

/// `2 * max_fee + 1` — the floor below which a bill cannot pay for its own
/// lockFC + transferFC and still move meaningful value.
pub fn min_add_fee_amount(max_fee: u64) -> u64 {
    2 * max_fee + 1
}

pub fn sort_by_value_desc(bills: &mut [Bill]) {
    bills.sort_by(|a, b| b.value.cmp(&a.value));
}

pub fn sort_by_value_asc(bills: &mut [Bill]) {
    bills.sort_by(|a, b| a.value.cmp(&b.value));
}

pub fn filter_unlocked(bills: &[Bill]) -> Vec<Bill> {
    bills.iter().filter(|b| !b.is_locked()).cloned().collect()
}

/// Bills eligible to fund an AddFeeCredit call: unlocked, and worth at least
/// `min_add_fee_amount(max_fee)`, sorted largest first.
pub fn eligible_add_fee_bills(bills: &[Bill], max_fee: u64) -> Vec<Bill> {
    let floor = min_add_fee_amount(max_fee);
    let mut eligible: Vec<Bill> = bills
        .iter()
        .filter(|b| !b.is_locked() && b.value >= floor)
        .cloned()
        .collect();
    sort_by_value_desc(&mut eligible);
    eligible
}

/// The largest unlocked bill, used as the reclaim/dust-collection target.
pub fn largest_unlocked_bill(bills: &[Bill]) -> Option<Bill> {
    let mut unlocked = filter_unlocked(bills);
    sort_by_value_desc(&mut unlocked);
    unlocked.into_iter().next()
}

/// Sum of eligible bill values; used for the AddFeeCredit balance check.
pub fn total_value(bills: &[Bill]) -> u64 {
    bills.iter().map(|b| b.value).sum()
}

pub async fn fetch_bills(
    client: &dyn PartitionClient,
    owner_id: &AccountId,
) -> Result<Vec<Bill>, FeeCreditError> {
    let mut bills = client
        .get_bills(owner_id)
        .await
        .map_err(FeeCreditError::from)?;
    sort_by_value_desc(&mut bills);
    Ok(bills)
}

pub async fn fetch_unlocked_bills(
    client: &dyn PartitionClient,
    owner_id: &AccountId,
) -> Result<Vec<Bill>, FeeCreditError> {
    let bills = fetch_bills(client, owner_id).await?;
    Ok(filter_unlocked(&bills))
}

/// Dust collection wants ascending order (merge smallest into largest).
pub async fn fetch_bills_ascending(
    client: &dyn PartitionClient,
    owner_id: &AccountId,
) -> Result<Vec<Bill>, FeeCreditError> {
    let mut bills = fetch_unlocked_bills(client, owner_id).await?;
    sort_by_value_asc(&mut bills);
    Ok(bills)
}

pub async fn fetch_fcr(
    client: &dyn PartitionClient,
    owner_id: &AccountId,
    _partition_id: PartitionId,
) -> Result<Option<FeeCreditRecord>, FeeCreditError> {
    client
        .get_fee_credit_record_by_owner(owner_id)
        .await
        .map_err(FeeCreditError::from)
}

/// AddFeeCredit's balance check: the sum of eligible bills must cover the
/// requested amount.
pub fn check_sufficient_balance(eligible: &[Bill], amount: u64) -> Result<(), FeeCreditError> {
    let have = total_value(eligible);
    if have < amount {
        Err(FeeCreditError::InsufficientBalance { need: amount, have })
    } else {
        Ok(())
    }
}
