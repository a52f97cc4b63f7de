use serde::{Deserialize, Serialize};

use crate::types::amount::Amount;
use crate::types::ids::{FileId, LoanId, MemberId, PaymentId};
use crate::types::timestamp::Timestamp;

/// Generic payment record. Registration payments gate member activation;
/// loan repayments decrement the referenced loan's balance on confirmation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Payment {
    pub id: PaymentId,
    pub member_id: MemberId,
    pub kind: PaymentKind,
    /// Required when kind is LoanRepayment.
    pub loan_id: Option<LoanId>,
    pub amount: Amount,
    pub status: PaymentStatus,
    /// Opaque proof-of-payment attachment; content is never inspected.
    pub proof_file: Option<FileId>,
    pub submitted_at: Timestamp,
    pub decided_at: Option<Timestamp>,
    pub rejection_reason: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentKind {
    Registration,
    LoanRepayment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl Payment {
    pub fn registration(member_id: MemberId, amount: Amount, proof_file: Option<FileId>) -> Self {
        Payment {
            id: PaymentId::new(),
            member_id,
            kind: PaymentKind::Registration,
            loan_id: None,
            amount,
            status: PaymentStatus::Pending,
            proof_file,
            submitted_at: Timestamp::now(),
            decided_at: None,
            rejection_reason: None,
        }
    }

    pub fn repayment(
        member_id: MemberId,
        loan_id: LoanId,
        amount: Amount,
        proof_file: Option<FileId>,
    ) -> Self {
        Payment {
            id: PaymentId::new(),
            member_id,
            kind: PaymentKind::LoanRepayment,
            loan_id: Some(loan_id),
            amount,
            status: PaymentStatus::Pending,
            proof_file,
            submitted_at: Timestamp::now(),
            decided_at: None,
            rejection_reason: None,
        }
    }
}
