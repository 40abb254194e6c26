//! Data model for the fee-credit lifecycle engine.
//!
//! Pure types and pure functions only: no I/O, no async. Everything here is
//! `Serialize`/`Deserialize` so the engine crate can persist it in the WAL.

pub mod bill;
pub mod context;
pub mod error;
pub mod fcr;
pub mod ids;
pub mod order;
pub mod proof;

pub use bill::Bill;
pub use context::{AddFeeContext, ReclaimFeeContext};
pub use error::{FeeCreditError, SubmitError};
pub use fcr::FeeCreditRecord;
pub use ids::{AccountId, PartitionId, UnitId};
pub use order::{BuilderOptions, OrderAttributes, OrderHash, TransactionOrder, TransactionType};
pub use proof::{InclusionProof, Proof, ServerMetadata, TransactionRecord, TransactionStatus};
