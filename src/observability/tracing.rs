use tracing::Span;

use crate::types::ids::{MemberId, PaymentId, WithdrawalId};

pub fn trace_balance_computation(member_id: &MemberId) -> Span {
    tracing::info_span!(
        "balance_computation",
        member_id = ?member_id,
    )
}

pub fn trace_withdrawal_approval(withdrawal_id: &WithdrawalId) -> Span {
    tracing::info_span!(
        "withdrawal_approval",
        withdrawal_id = ?withdrawal_id,
    )
}

pub fn trace_repayment_confirmation(payment_id: &PaymentId) -> Span {
    tracing::info_span!(
        "repayment_confirmation",
        payment_id = ?payment_id,
    )
}
