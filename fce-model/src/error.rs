use thiserror::Error;

/// Failure of the transport/confirmation layer (component B). Kept distinct
/// from [`FeeCreditError`] so the submitter can be tested and reused on its
/// own, the way the teacher wallet's `NetworkError` wraps transport failures
/// separately from wallet-level errors.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("operation was canceled")]
    Canceled,
}

/// Every error kind the engine can surface to a caller (spec §7).
#[derive(Debug, Error)]
pub enum FeeCreditError {
    #[error("amount must be at least {minimum} (2*max_fee + 1)")]
    MinimumFeeAmount { minimum: u64 },

    #[error("insufficient balance: need {need}, have {have} across eligible bills")]
    InsufficientBalance { need: u64, have: u64 },

    #[error("resumed context belongs to partition {context}, call targets {requested}")]
    InvalidPartition { context: u32, requested: u32 },

    #[error("fee credit record is locked")]
    FcrLocked,

    #[error("fee credit record is already locked")]
    FcrAlreadyLocked,

    #[error("fee credit record is already unlocked")]
    FcrAlreadyUnlocked,

    #[error("account has no fee credit record on this partition")]
    NoFeeCredit,

    #[error("fee credit record balance too low for this operation")]
    NotEnoughFeeCredit,

    #[error("a reclaim-fee-credit protocol is already in flight for this account")]
    UnreclaimedFeeCreditPending,

    #[error("an add-fee-credit protocol is already in flight for this account")]
    UnaddedFeeCreditPending,

    #[error("source bill changed or vanished during transferFC")]
    TransferFcTargetInvalid,

    #[error("transferFC expired before addFC committed; value is trapped off-chain")]
    MoneyLost,

    #[error("target bill changed or vanished during reclaimFC")]
    ReclaimFcTargetInvalid,

    #[error(transparent)]
    Submit(SubmitError),

    #[error("operation was canceled")]
    Canceled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl FeeCreditError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<SubmitError> for FeeCreditError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Canceled => Self::Canceled,
            other => Self::Submit(other),
        }
    }
}
