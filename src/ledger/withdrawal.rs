use std::sync::Arc;

use tracing::Instrument;

use crate::error::{Error, Result};
use crate::interfaces::document_store::{encode, Collection, DocumentStore, Filter};
use crate::ledger::balance::BalanceCalculator;
use crate::ledger::{fetch_member, fetch_withdrawal};
use crate::observability::metrics::{
    WITHDRAWALS_APPROVED, WITHDRAWALS_REJECTED, WITHDRAWALS_REQUESTED,
};
use crate::observability::tracing::trace_withdrawal_approval;
use crate::types::amount::Amount;
use crate::types::bank::BankDetails;
use crate::types::ids::{MemberId, WithdrawalId};
use crate::types::savings::SavingsEntry;
use crate::types::timestamp::Timestamp;
use crate::types::withdrawal::{WithdrawalRequest, WithdrawalStatus};

/// Validates withdrawals against the live balance twice: once at request
/// time and again at approval time. The gap between the two is real wall
/// clock; deposits and other withdrawals land in it.
#[derive(Clone)]
pub struct WithdrawalGuard {
    store: Arc<dyn DocumentStore>,
    balances: BalanceCalculator,
}

impl WithdrawalGuard {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        WithdrawalGuard {
            balances: BalanceCalculator::new(store.clone()),
            store,
        }
    }

    /// An overdraw attempt persists nothing: the request is rejected before
    /// any record is written.
    pub async fn request_withdrawal(
        &self,
        member_id: MemberId,
        amount: Amount,
        bank_details: BankDetails,
    ) -> Result<WithdrawalRequest> {
        if !amount.is_positive() {
            return Err(Error::NonPositiveAmount);
        }
        bank_details.validate()?;
        let member = fetch_member(self.store.as_ref(), member_id).await?;
        if !member.can_transact() {
            return Err(Error::MemberNotActive {
                status: member.status,
            });
        }

        let available = self.balances.balance_of(member_id).await?;
        if amount > available {
            WITHDRAWALS_REJECTED
                .with_label_values(&["insufficient_funds"])
                .inc();
            tracing::warn!(member_id = %member_id, requested = %amount, available = %available, "withdrawal refused at request time");
            return Err(Error::InsufficientFunds {
                available,
                requested: amount,
            });
        }

        let request = WithdrawalRequest::new(member_id, amount, bank_details, available);
        self.store
            .create(
                Collection::WithdrawalRequests,
                request.id.into(),
                encode(Collection::WithdrawalRequests, &request)?,
            )
            .await?;

        WITHDRAWALS_REQUESTED.inc();
        tracing::info!(withdrawal_id = %request.id, member_id = %member_id, amount = %amount, "withdrawal requested");
        Ok(request)
    }

    /// Re-checks the live balance before approving: the snapshot taken at
    /// request time is not trusted. On success the confirmed debit entry is
    /// written before the status flip, so a crash in between leaves the
    /// request Pending; re-approval finds the debit by withdrawal reference
    /// and completes the flip without debiting twice.
    pub async fn approve_withdrawal(
        &self,
        withdrawal_id: WithdrawalId,
        notes: Option<String>,
    ) -> Result<WithdrawalRequest> {
        let span = trace_withdrawal_approval(&withdrawal_id);
        self.approve_withdrawal_inner(withdrawal_id, notes)
            .instrument(span)
            .await
    }

    async fn approve_withdrawal_inner(
        &self,
        withdrawal_id: WithdrawalId,
        notes: Option<String>,
    ) -> Result<WithdrawalRequest> {
        let mut withdrawal = fetch_withdrawal(self.store.as_ref(), withdrawal_id).await?;
        if withdrawal.status != WithdrawalStatus::Pending {
            return Err(Error::InvalidState {
                entity: "withdrawal",
                expected: "Pending",
                actual: format!("{:?}", withdrawal.status),
            });
        }

        let existing_debit = self
            .store
            .list(
                Collection::SavingsEntries,
                Filter::new().eq("withdrawal_id", withdrawal_id),
            )
            .await?;

        if existing_debit.is_empty() {
            let available = self.balances.balance_of(withdrawal.member_id).await?;
            if withdrawal.requested_amount > available {
                WITHDRAWALS_REJECTED
                    .with_label_values(&["insufficient_funds"])
                    .inc();
                tracing::warn!(withdrawal_id = %withdrawal_id, requested = %withdrawal.requested_amount, available = %available, "withdrawal refused at approval time");
                // The request stays Pending; the admin can retry or reject.
                return Err(Error::InsufficientFunds {
                    available,
                    requested: withdrawal.requested_amount,
                });
            }

            let debit = SavingsEntry::withdrawal_debit(
                withdrawal.member_id,
                withdrawal.requested_amount,
                withdrawal.id,
            );
            self.store
                .create(
                    Collection::SavingsEntries,
                    debit.id.into(),
                    encode(Collection::SavingsEntries, &debit)?,
                )
                .await?;
        } else {
            tracing::warn!(withdrawal_id = %withdrawal_id, "debit already present, completing interrupted approval");
        }

        withdrawal.status = WithdrawalStatus::Approved;
        withdrawal.processed_at = Some(Timestamp::now());
        withdrawal.admin_notes = notes;
        self.store
            .update(
                Collection::WithdrawalRequests,
                withdrawal.id.into(),
                encode(Collection::WithdrawalRequests, &withdrawal)?,
            )
            .await?;

        WITHDRAWALS_APPROVED.inc();
        tracing::info!(withdrawal_id = %withdrawal_id, amount = %withdrawal.requested_amount, "withdrawal approved");
        Ok(withdrawal)
    }

    pub async fn reject_withdrawal(
        &self,
        withdrawal_id: WithdrawalId,
        reason: String,
    ) -> Result<WithdrawalRequest> {
        let mut withdrawal = fetch_withdrawal(self.store.as_ref(), withdrawal_id).await?;
        if withdrawal.status != WithdrawalStatus::Pending {
            return Err(Error::InvalidState {
                entity: "withdrawal",
                expected: "Pending",
                actual: format!("{:?}", withdrawal.status),
            });
        }

        withdrawal.status = WithdrawalStatus::Rejected;
        withdrawal.processed_at = Some(Timestamp::now());
        withdrawal.admin_notes = Some(reason);
        self.store
            .update(
                Collection::WithdrawalRequests,
                withdrawal.id.into(),
                encode(Collection::WithdrawalRequests, &withdrawal)?,
            )
            .await?;

        WITHDRAWALS_REJECTED.with_label_values(&["admin"]).inc();
        tracing::info!(withdrawal_id = %withdrawal_id, "withdrawal rejected");
        Ok(withdrawal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::testutil::{bank_details, put_confirmed_entry, put_member};
    use crate::store::memory::MemoryStore;
    use crate::types::member::MemberStatus;
    use crate::types::savings::EntryStatus;

    async fn member_with_balance(store: &Arc<MemoryStore>, minor: i64) -> MemberId {
        let member = put_member(store.as_ref(), MemberStatus::Active).await;
        put_confirmed_entry(store.as_ref(), member.id, minor).await;
        member.id
    }

    #[tokio::test]
    async fn overdraw_at_request_time_persists_nothing() {
        let store = Arc::new(MemoryStore::new());
        let member_id = member_with_balance(&store, 2_000).await;
        let guard = WithdrawalGuard::new(store.clone());

        let err = guard
            .request_withdrawal(member_id, Amount::from_minor(2_500), bank_details())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));

        let requests = store
            .list(Collection::WithdrawalRequests, Filter::new())
            .await
            .unwrap();
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn request_snapshots_the_balance() {
        let store = Arc::new(MemoryStore::new());
        let member_id = member_with_balance(&store, 5_000).await;
        let guard = WithdrawalGuard::new(store.clone());

        let request = guard
            .request_withdrawal(member_id, Amount::from_minor(4_000), bank_details())
            .await
            .unwrap();
        assert_eq!(request.status, WithdrawalStatus::Pending);
        assert_eq!(request.balance_snapshot, Amount::from_minor(5_000));
    }

    #[tokio::test]
    async fn approval_rechecks_live_balance() {
        let store = Arc::new(MemoryStore::new());
        let member_id = member_with_balance(&store, 5_000).await;
        let guard = WithdrawalGuard::new(store.clone());

        let request = guard
            .request_withdrawal(member_id, Amount::from_minor(4_000), bank_details())
            .await
            .unwrap();

        // An unrelated confirmed withdrawal lands before approval.
        put_confirmed_entry(store.as_ref(), member_id, -2_000).await;

        let err = guard
            .approve_withdrawal(request.id, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientFunds {
                available,
                requested,
            } if available == Amount::from_minor(3_000)
                && requested == Amount::from_minor(4_000)
        ));

        // Still Pending: the admin decides what happens next.
        let stored = fetch_withdrawal(store.as_ref(), request.id).await.unwrap();
        assert_eq!(stored.status, WithdrawalStatus::Pending);
    }

    #[tokio::test]
    async fn approval_debits_through_a_confirmed_entry() {
        let store = Arc::new(MemoryStore::new());
        let member_id = member_with_balance(&store, 5_000).await;
        let guard = WithdrawalGuard::new(store.clone());

        let request = guard
            .request_withdrawal(member_id, Amount::from_minor(4_000), bank_details())
            .await
            .unwrap();
        let approved = guard.approve_withdrawal(request.id, None).await.unwrap();
        assert_eq!(approved.status, WithdrawalStatus::Approved);
        assert!(approved.processed_at.is_some());

        let balance = BalanceCalculator::new(store.clone())
            .balance_of(member_id)
            .await
            .unwrap();
        assert_eq!(balance, Amount::from_minor(1_000));

        let debits = store
            .list(
                Collection::SavingsEntries,
                Filter::new().eq("withdrawal_id", request.id),
            )
            .await
            .unwrap();
        assert_eq!(debits.len(), 1);
        let debit: SavingsEntry = debits[0].decode(Collection::SavingsEntries).unwrap();
        assert_eq!(debit.amount, Amount::from_minor(-4_000));
        assert_eq!(debit.status, EntryStatus::Confirmed);
    }

    #[tokio::test]
    async fn interrupted_approval_completes_without_double_debit() {
        let store = Arc::new(MemoryStore::new());
        let member_id = member_with_balance(&store, 5_000).await;
        let guard = WithdrawalGuard::new(store.clone());

        let request = guard
            .request_withdrawal(member_id, Amount::from_minor(4_000), bank_details())
            .await
            .unwrap();

        // Simulate a crash after the debit write, before the status flip.
        let debit =
            SavingsEntry::withdrawal_debit(member_id, Amount::from_minor(4_000), request.id);
        store
            .create(
                Collection::SavingsEntries,
                debit.id.into(),
                encode(Collection::SavingsEntries, &debit).unwrap(),
            )
            .await
            .unwrap();

        let approved = guard.approve_withdrawal(request.id, None).await.unwrap();
        assert_eq!(approved.status, WithdrawalStatus::Approved);

        let debits = store
            .list(
                Collection::SavingsEntries,
                Filter::new().eq("withdrawal_id", request.id),
            )
            .await
            .unwrap();
        assert_eq!(debits.len(), 1);

        let balance = BalanceCalculator::new(store.clone())
            .balance_of(member_id)
            .await
            .unwrap();
        assert_eq!(balance, Amount::from_minor(1_000));
    }

    #[tokio::test]
    async fn reject_is_terminal_and_creates_no_entry() {
        let store = Arc::new(MemoryStore::new());
        let member_id = member_with_balance(&store, 5_000).await;
        let guard = WithdrawalGuard::new(store.clone());

        let request = guard
            .request_withdrawal(member_id, Amount::from_minor(4_000), bank_details())
            .await
            .unwrap();
        let rejected = guard
            .reject_withdrawal(request.id, "unverified account".to_string())
            .await
            .unwrap();
        assert_eq!(rejected.status, WithdrawalStatus::Rejected);

        let err = guard
            .approve_withdrawal(request.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));

        let entries = store
            .list(
                Collection::SavingsEntries,
                Filter::new().eq("withdrawal_id", request.id),
            )
            .await
            .unwrap();
        assert!(entries.is_empty());
    }
}
