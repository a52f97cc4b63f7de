use std::sync::Arc;

use crate::error::{Error, Result};
use crate::interfaces::document_store::{encode, Collection, DocumentStore};
use crate::ledger::{fetch_entry, fetch_member};
use crate::observability::metrics::{DEPOSITS_CONFIRMED, DEPOSITS_SUBMITTED};
use crate::types::amount::Amount;
use crate::types::ids::{EntryId, MemberId};
use crate::types::savings::{EntryStatus, SavingsEntry};
use crate::types::timestamp::Timestamp;

/// Deposit entry lifecycle: member submission, admin confirm/reject.
/// Entries never change after confirmation; the one-shot transition is
/// guarded by a status re-read immediately before the write.
#[derive(Clone)]
pub struct SavingsLedger {
    store: Arc<dyn DocumentStore>,
}

impl SavingsLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        SavingsLedger { store }
    }

    pub async fn submit_deposit(
        &self,
        member_id: MemberId,
        amount: Amount,
        description: String,
    ) -> Result<SavingsEntry> {
        if !amount.is_positive() {
            return Err(Error::NonPositiveAmount);
        }
        let member = fetch_member(self.store.as_ref(), member_id).await?;
        if !member.can_transact() {
            return Err(Error::MemberNotActive {
                status: member.status,
            });
        }

        let entry = SavingsEntry::deposit(member_id, amount, description);
        self.store
            .create(
                Collection::SavingsEntries,
                entry.id.into(),
                encode(Collection::SavingsEntries, &entry)?,
            )
            .await?;

        DEPOSITS_SUBMITTED.inc();
        tracing::info!(member_id = %member_id, amount = %amount, "deposit submitted");
        Ok(entry)
    }

    pub async fn confirm_entry(&self, entry_id: EntryId) -> Result<SavingsEntry> {
        let mut entry = fetch_entry(self.store.as_ref(), entry_id).await?;
        if entry.status != EntryStatus::Pending {
            return Err(Error::InvalidState {
                entity: "savings entry",
                expected: "Pending",
                actual: format!("{:?}", entry.status),
            });
        }

        entry.status = EntryStatus::Confirmed;
        entry.confirmed_at = Some(Timestamp::now());
        self.store
            .update(
                Collection::SavingsEntries,
                entry.id.into(),
                encode(Collection::SavingsEntries, &entry)?,
            )
            .await?;

        DEPOSITS_CONFIRMED.inc();
        tracing::info!(entry_id = %entry_id, amount = %entry.amount, "savings entry confirmed");
        Ok(entry)
    }

    pub async fn reject_entry(&self, entry_id: EntryId) -> Result<SavingsEntry> {
        let mut entry = fetch_entry(self.store.as_ref(), entry_id).await?;
        if entry.status != EntryStatus::Pending {
            return Err(Error::InvalidState {
                entity: "savings entry",
                expected: "Pending",
                actual: format!("{:?}", entry.status),
            });
        }

        entry.status = EntryStatus::Rejected;
        self.store
            .update(
                Collection::SavingsEntries,
                entry.id.into(),
                encode(Collection::SavingsEntries, &entry)?,
            )
            .await?;

        tracing::info!(entry_id = %entry_id, "savings entry rejected");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::testutil::put_member;
    use crate::store::memory::MemoryStore;
    use crate::types::member::MemberStatus;

    fn ledger(store: &Arc<MemoryStore>) -> SavingsLedger {
        SavingsLedger::new(store.clone())
    }

    #[tokio::test]
    async fn deposit_requires_active_member() {
        let store = Arc::new(MemoryStore::new());
        let member = put_member(store.as_ref(), MemberStatus::Pending).await;

        let err = ledger(&store)
            .submit_deposit(member.id, Amount::from_minor(1_000), "first".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MemberNotActive {
                status: MemberStatus::Pending
            }
        ));
    }

    #[tokio::test]
    async fn deposit_rejects_non_positive_amount() {
        let store = Arc::new(MemoryStore::new());
        let member = put_member(store.as_ref(), MemberStatus::Active).await;

        let err = ledger(&store)
            .submit_deposit(member.id, Amount::zero(), "nothing".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NonPositiveAmount));
    }

    #[tokio::test]
    async fn confirm_is_one_shot() {
        let store = Arc::new(MemoryStore::new());
        let member = put_member(store.as_ref(), MemberStatus::Active).await;
        let ledger = ledger(&store);

        let entry = ledger
            .submit_deposit(member.id, Amount::from_minor(1_000), "first".to_string())
            .await
            .unwrap();

        let confirmed = ledger.confirm_entry(entry.id).await.unwrap();
        assert_eq!(confirmed.status, EntryStatus::Confirmed);
        assert!(confirmed.confirmed_at.is_some());

        let err = ledger.confirm_entry(entry.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
    }

    #[tokio::test]
    async fn rejected_entry_cannot_be_confirmed() {
        let store = Arc::new(MemoryStore::new());
        let member = put_member(store.as_ref(), MemberStatus::Active).await;
        let ledger = ledger(&store);

        let entry = ledger
            .submit_deposit(member.id, Amount::from_minor(1_000), "first".to_string())
            .await
            .unwrap();
        ledger.reject_entry(entry.id).await.unwrap();

        let err = ledger.confirm_entry(entry.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
    }
}
