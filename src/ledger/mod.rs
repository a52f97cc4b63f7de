pub mod balance;
pub mod loan;
pub mod reconciliation;
pub mod savings;
pub mod withdrawal;

use crate::error::Result;
use crate::interfaces::document_store::{Collection, DocumentStore};
use crate::types::ids::{EntryId, LoanId, MemberId, PaymentId, WithdrawalId};
use crate::types::loan::LoanRequest;
use crate::types::member::Member;
use crate::types::payment::Payment;
use crate::types::savings::SavingsEntry;
use crate::types::withdrawal::WithdrawalRequest;

pub(crate) async fn fetch_member(store: &dyn DocumentStore, id: MemberId) -> Result<Member> {
    store
        .get(Collection::Members, id.into())
        .await?
        .decode(Collection::Members)
}

pub(crate) async fn fetch_entry(store: &dyn DocumentStore, id: EntryId) -> Result<SavingsEntry> {
    store
        .get(Collection::SavingsEntries, id.into())
        .await?
        .decode(Collection::SavingsEntries)
}

pub(crate) async fn fetch_loan(store: &dyn DocumentStore, id: LoanId) -> Result<LoanRequest> {
    store
        .get(Collection::LoanRequests, id.into())
        .await?
        .decode(Collection::LoanRequests)
}

pub(crate) async fn fetch_payment(store: &dyn DocumentStore, id: PaymentId) -> Result<Payment> {
    store
        .get(Collection::Payments, id.into())
        .await?
        .decode(Collection::Payments)
}

pub(crate) async fn fetch_withdrawal(
    store: &dyn DocumentStore,
    id: WithdrawalId,
) -> Result<WithdrawalRequest> {
    store
        .get(Collection::WithdrawalRequests, id.into())
        .await?
        .decode(Collection::WithdrawalRequests)
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::interfaces::document_store::{encode, Collection, DocumentStore};
    use crate::types::amount::Amount;
    use crate::types::bank::BankDetails;
    use crate::types::ids::MemberId;
    use crate::types::member::{Member, MemberStatus};
    use crate::types::savings::{EntryStatus, SavingsEntry};
    use crate::types::timestamp::Timestamp;

    pub(crate) async fn put_member(store: &dyn DocumentStore, status: MemberStatus) -> Member {
        let mut member = Member::new("MBR-0001".to_string());
        member.status = status;
        if status == MemberStatus::Active {
            member.activated_at = Some(Timestamp::now());
        }
        store
            .create(
                Collection::Members,
                member.id.into(),
                encode(Collection::Members, &member).unwrap(),
            )
            .await
            .unwrap();
        member
    }

    /// Seeds a confirmed ledger line directly; sign carries through.
    pub(crate) async fn put_confirmed_entry(
        store: &dyn DocumentStore,
        member_id: MemberId,
        minor: i64,
    ) -> SavingsEntry {
        let mut entry =
            SavingsEntry::deposit(member_id, Amount::from_minor(minor), "seed".to_string());
        entry.status = EntryStatus::Confirmed;
        entry.confirmed_at = Some(Timestamp::now());
        store
            .create(
                Collection::SavingsEntries,
                entry.id.into(),
                encode(Collection::SavingsEntries, &entry).unwrap(),
            )
            .await
            .unwrap();
        entry
    }

    pub(crate) async fn put_pending_entry(
        store: &dyn DocumentStore,
        member_id: MemberId,
        minor: i64,
    ) -> SavingsEntry {
        let entry =
            SavingsEntry::deposit(member_id, Amount::from_minor(minor), "seed".to_string());
        store
            .create(
                Collection::SavingsEntries,
                entry.id.into(),
                encode(Collection::SavingsEntries, &entry).unwrap(),
            )
            .await
            .unwrap();
        entry
    }

    pub(crate) fn bank_details() -> BankDetails {
        BankDetails {
            account_name: "A Member".to_string(),
            account_number: "0100004521833".to_string(),
            bank_name: "Coop Bank".to_string(),
        }
    }
}
