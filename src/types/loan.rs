use serde::{Deserialize, Serialize};

use crate::types::amount::Amount;
use crate::types::bank::BankDetails;
use crate::types::ids::{LoanId, MemberId, PaymentId};
use crate::types::timestamp::Timestamp;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoanRequest {
    pub id: LoanId,
    pub member_id: MemberId,
    pub requested_amount: Amount,
    /// Zero until approved. May differ from the requested amount.
    pub approved_amount: Amount,
    /// Mirrors approved_amount at approval, decremented by confirmed
    /// repayments. Invariant: 0 <= current_balance <= approved_amount.
    pub current_balance: Amount,
    pub status: LoanStatus,
    pub purpose: String,
    pub repayment_period_months: u32,
    pub monthly_income: Amount,
    pub bank_details: BankDetails,
    pub submitted_at: Timestamp,
    pub decided_at: Option<Timestamp>,
    pub decision_notes: Option<String>,
    pub last_repayment_id: Option<PaymentId>,
    pub last_repayment_at: Option<Timestamp>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    PendingReview,
    Approved,
    Rejected,
    FullyRepaid,
}

impl LoanRequest {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, LoanStatus::Rejected | LoanStatus::FullyRepaid)
    }
}
