//! Components A–G of the fee-credit lifecycle engine (spec.md §2), plus the
//! external-interface traits (§6) the rest of the wallet must implement.
//!
//! `fce-model` carries the pure data; everything here is async, I/O-bound,
//! and stateful through the injected [`client::PartitionClient`] and
//! [`wal::FeeManagerDb`].

pub mod builder;
pub mod client;
pub mod config;
pub mod dust;
pub mod facade;
pub mod reclaim_fee;
pub mod selector;
pub mod submitter;
pub mod wal;

mod add_fee;
mod deps;
mod leg;

pub use add_fee::{add_fee_credit, AddFeeTxProofs};
pub use dust::{collect_dust, DustCollectionResult};
pub use facade::{FeeCreditFacade, FeeCreditFacadeBuilder};
pub use reclaim_fee::{reclaim_fee_credit, ReclaimFeeTxProofs};

#[cfg(test)]
pub(crate) mod testutil;
