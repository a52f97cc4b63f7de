use serde::{Deserialize, Serialize};

use crate::types::amount::Amount;
use crate::types::ids::{EntryId, MemberId, WithdrawalId};
use crate::types::timestamp::Timestamp;

/// Immutable ledger line. Positive amounts are deposits, negative amounts
/// are approved withdrawals. Only Confirmed entries count toward balance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavingsEntry {
    pub id: EntryId,
    pub member_id: MemberId,
    pub amount: Amount,
    pub status: EntryStatus,
    pub description: String,
    /// Set on the system-generated debit line so an interrupted withdrawal
    /// approval can be detected and completed without debiting twice.
    pub withdrawal_id: Option<WithdrawalId>,
    pub created_at: Timestamp,
    pub confirmed_at: Option<Timestamp>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl SavingsEntry {
    pub fn deposit(member_id: MemberId, amount: Amount, description: String) -> Self {
        SavingsEntry {
            id: EntryId::new(),
            member_id,
            amount,
            status: EntryStatus::Pending,
            description,
            withdrawal_id: None,
            created_at: Timestamp::now(),
            confirmed_at: None,
        }
    }

    /// The debit spawned by an approved withdrawal. Born Confirmed: the
    /// approval decision is the confirmation.
    pub fn withdrawal_debit(member_id: MemberId, amount: Amount, withdrawal_id: WithdrawalId) -> Self {
        let now = Timestamp::now();
        SavingsEntry {
            id: EntryId::new(),
            member_id,
            amount: -amount,
            status: EntryStatus::Confirmed,
            description: "Withdrawal disbursement".to_string(),
            withdrawal_id: Some(withdrawal_id),
            created_at: now,
            confirmed_at: Some(now),
        }
    }
}
