use std::sync::Arc;

use crate::error::Result;
use crate::interfaces::document_store::{Collection, DocumentStore, Filter};
use crate::observability::metrics::BALANCE_COMPUTE_LATENCY;
use crate::types::amount::Amount;
use crate::types::ids::MemberId;
use crate::types::savings::{EntryStatus, SavingsEntry};

/// Computes the available savings balance from confirmed ledger lines.
/// Holds no state of its own: every call reads the store, because a cached
/// balance going stale is exactly how a withdrawal overdraws.
#[derive(Clone)]
pub struct BalanceCalculator {
    store: Arc<dyn DocumentStore>,
}

impl BalanceCalculator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        BalanceCalculator { store }
    }

    /// Sum of confirmed entry amounts (deposits positive, withdrawals
    /// negative), floored at zero. Store failure propagates; reporting
    /// zero on error would let an illegitimate withdrawal through.
    pub async fn balance_of(&self, member_id: MemberId) -> Result<Amount> {
        let timer = BALANCE_COMPUTE_LATENCY.start_timer();

        let docs = self
            .store
            .list(
                Collection::SavingsEntries,
                Filter::new()
                    .eq("member_id", member_id)
                    .eq("status", EntryStatus::Confirmed),
            )
            .await?;

        let mut total = Amount::zero();
        for doc in &docs {
            let entry: SavingsEntry = doc.decode(Collection::SavingsEntries)?;
            total = total + entry.amount;
        }

        timer.observe_duration();
        Ok(total.floor_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::interfaces::document_store::MockDocumentStore;
    use crate::ledger::testutil::{put_confirmed_entry, put_member, put_pending_entry};
    use crate::store::memory::MemoryStore;
    use crate::types::member::MemberStatus;
    use proptest::prelude::*;

    #[tokio::test]
    async fn pending_entries_are_excluded() {
        let store = Arc::new(MemoryStore::new());
        let member = put_member(store.as_ref(), MemberStatus::Active).await;
        put_confirmed_entry(store.as_ref(), member.id, 5_000).await;
        put_confirmed_entry(store.as_ref(), member.id, 3_000).await;
        put_pending_entry(store.as_ref(), member.id, 1_000).await;

        let calc = BalanceCalculator::new(store);
        assert_eq!(
            calc.balance_of(member.id).await.unwrap(),
            Amount::from_minor(8_000)
        );
    }

    #[tokio::test]
    async fn withdrawal_entries_subtract() {
        let store = Arc::new(MemoryStore::new());
        let member = put_member(store.as_ref(), MemberStatus::Active).await;
        put_confirmed_entry(store.as_ref(), member.id, 5_000).await;
        put_confirmed_entry(store.as_ref(), member.id, -2_000).await;

        let calc = BalanceCalculator::new(store);
        assert_eq!(
            calc.balance_of(member.id).await.unwrap(),
            Amount::from_minor(3_000)
        );
    }

    #[tokio::test]
    async fn inconsistent_data_never_reports_negative() {
        let store = Arc::new(MemoryStore::new());
        let member = put_member(store.as_ref(), MemberStatus::Active).await;
        put_confirmed_entry(store.as_ref(), member.id, -2_000).await;

        let calc = BalanceCalculator::new(store);
        assert_eq!(calc.balance_of(member.id).await.unwrap(), Amount::zero());
    }

    #[tokio::test]
    async fn other_members_entries_are_invisible() {
        let store = Arc::new(MemoryStore::new());
        let member = put_member(store.as_ref(), MemberStatus::Active).await;
        let other = crate::types::ids::MemberId::new();
        put_confirmed_entry(store.as_ref(), member.id, 1_000).await;
        put_confirmed_entry(store.as_ref(), other, 9_000).await;

        let calc = BalanceCalculator::new(store);
        assert_eq!(
            calc.balance_of(member.id).await.unwrap(),
            Amount::from_minor(1_000)
        );
    }

    #[tokio::test]
    async fn store_failure_propagates_instead_of_reporting_zero() {
        let mut mock = MockDocumentStore::new();
        mock.expect_list()
            .returning(|_, _| Err(Error::StoreUnavailable("down".to_string())));

        let calc = BalanceCalculator::new(Arc::new(mock));
        let err = calc.balance_of(MemberId::new()).await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Balance equals the clamped sum of confirmed amounts, whatever
        /// mix of signs and statuses the ledger holds.
        #[test]
        fn additivity_over_confirmed_entries(entries in prop::collection::vec((-10_000i64..10_000, 0u8..3), 0..20)) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let store = Arc::new(MemoryStore::new());
                let member = put_member(store.as_ref(), MemberStatus::Active).await;

                let mut confirmed_sum = 0i64;
                for (minor, status) in &entries {
                    match status {
                        0 => {
                            put_confirmed_entry(store.as_ref(), member.id, *minor).await;
                            confirmed_sum += minor;
                        }
                        _ => {
                            put_pending_entry(store.as_ref(), member.id, *minor).await;
                        }
                    }
                }

                let calc = BalanceCalculator::new(store);
                let balance = calc.balance_of(member.id).await.unwrap();
                assert_eq!(balance, Amount::from_minor(confirmed_sum.max(0)));
                assert!(balance >= Amount::zero());
            });
        }
    }
}
