use thiserror::Error;

use crate::interfaces::document_store::Collection;
use crate::types::amount::Amount;
use crate::types::ids::DocumentId;
use crate::types::member::MemberStatus;

#[derive(Error, Debug)]
pub enum Error {
    // Input validation errors
    #[error("Amount must be positive")]
    NonPositiveAmount,

    #[error("Repayment period must be at least one month")]
    InvalidRepaymentPeriod,

    #[error("Monthly income cannot be negative")]
    NegativeMonthlyIncome,

    #[error("Incomplete bank details: missing {field}")]
    IncompleteBankDetails { field: &'static str },

    #[error("Registration fee mismatch: expected {expected}, got {got}")]
    WrongRegistrationFee { expected: Amount, got: Amount },

    #[error("Repayment carries no loan reference")]
    MissingLoanReference,

    #[error("Malformed document in {collection:?}: {reason}")]
    MalformedDocument {
        collection: Collection,
        reason: String,
    },

    // State errors
    #[error("{entity} is {actual}, expected {expected}")]
    InvalidState {
        entity: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("Member cannot transact while {status:?}")]
    MemberNotActive { status: MemberStatus },

    // Funds errors
    #[error("Repayment exceeds loan balance: available={available}, requested={requested}")]
    InsufficientBalance {
        available: Amount,
        requested: Amount,
    },

    #[error("Withdrawal exceeds savings balance: available={available}, requested={requested}")]
    InsufficientFunds {
        available: Amount,
        requested: Amount,
    },

    // Store errors
    #[error("Not found in {collection:?}: {id}")]
    NotFound {
        collection: Collection,
        id: DocumentId,
    },

    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Transient infrastructure faults are the only errors worth retrying.
    /// Business-rule rejections must surface to the caller untouched.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_))
    }
}
