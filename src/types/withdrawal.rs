use serde::{Deserialize, Serialize};

use crate::types::amount::Amount;
use crate::types::bank::BankDetails;
use crate::types::ids::{MemberId, WithdrawalId};
use crate::types::timestamp::Timestamp;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WithdrawalRequest {
    pub id: WithdrawalId,
    pub member_id: MemberId,
    pub requested_amount: Amount,
    pub bank_details: BankDetails,
    pub status: WithdrawalStatus,
    /// Live balance at request time. Audit only; approval re-checks the
    /// live balance, never this snapshot.
    pub balance_snapshot: Amount,
    pub created_at: Timestamp,
    pub processed_at: Option<Timestamp>,
    pub admin_notes: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalRequest {
    pub fn new(
        member_id: MemberId,
        requested_amount: Amount,
        bank_details: BankDetails,
        balance_snapshot: Amount,
    ) -> Self {
        WithdrawalRequest {
            id: WithdrawalId::new(),
            member_id,
            requested_amount,
            bank_details,
            status: WithdrawalStatus::Pending,
            balance_snapshot,
            created_at: Timestamp::now(),
            processed_at: None,
            admin_notes: None,
        }
    }
}
