use std::sync::Arc;

use crate::error::{Error, Result};
use crate::interfaces::document_store::{encode, Collection, DocumentStore};
use crate::ledger::{fetch_loan, fetch_member};
use crate::observability::metrics::LOANS_APPROVED;
use crate::types::amount::Amount;
use crate::types::bank::BankDetails;
use crate::types::ids::{LoanId, MemberId, PaymentId};
use crate::types::loan::{LoanRequest, LoanStatus};
use crate::types::timestamp::Timestamp;

#[derive(Clone, Debug)]
pub struct LoanApplication {
    pub requested_amount: Amount,
    pub purpose: String,
    pub repayment_period_months: u32,
    pub monthly_income: Amount,
    pub bank_details: BankDetails,
}

impl LoanApplication {
    fn validate(&self) -> Result<()> {
        if !self.requested_amount.is_positive() {
            return Err(Error::NonPositiveAmount);
        }
        if self.repayment_period_months == 0 {
            return Err(Error::InvalidRepaymentPeriod);
        }
        if self.monthly_income.is_negative() {
            return Err(Error::NegativeMonthlyIncome);
        }
        self.bank_details.validate()
    }
}

fn invalid_loan_state(loan: &LoanRequest, expected: &'static str) -> Error {
    Error::InvalidState {
        entity: "loan",
        expected,
        actual: format!("{:?}", loan.status),
    }
}

// Pure state transitions. Store I/O stays in LoanBook and the reconciler,
// so every rule here is checkable without a store.

pub(crate) fn approve_loan(
    loan: &mut LoanRequest,
    approved_amount: Amount,
    notes: Option<String>,
) -> Result<()> {
    if loan.status != LoanStatus::PendingReview {
        return Err(invalid_loan_state(loan, "PendingReview"));
    }
    // Admin discretion: the granted amount may differ from the requested one.
    if !approved_amount.is_positive() {
        return Err(Error::NonPositiveAmount);
    }

    loan.status = LoanStatus::Approved;
    loan.approved_amount = approved_amount;
    loan.current_balance = approved_amount;
    loan.decided_at = Some(Timestamp::now());
    loan.decision_notes = notes;
    Ok(())
}

pub(crate) fn reject_loan(loan: &mut LoanRequest, notes: Option<String>) -> Result<()> {
    if loan.status != LoanStatus::PendingReview {
        return Err(invalid_loan_state(loan, "PendingReview"));
    }

    loan.status = LoanStatus::Rejected;
    loan.decided_at = Some(Timestamp::now());
    loan.decision_notes = notes;
    Ok(())
}

/// Decrements the running balance. Over-payment is rejected, not clamped;
/// clamping would silently hide a reconciliation bug.
pub(crate) fn apply_repayment(
    loan: &mut LoanRequest,
    payment_id: PaymentId,
    amount: Amount,
) -> Result<()> {
    if loan.status != LoanStatus::Approved {
        return Err(invalid_loan_state(loan, "Approved"));
    }
    if !amount.is_positive() {
        return Err(Error::NonPositiveAmount);
    }
    if amount > loan.current_balance {
        return Err(Error::InsufficientBalance {
            available: loan.current_balance,
            requested: amount,
        });
    }

    loan.current_balance = loan.current_balance - amount;
    loan.last_repayment_id = Some(payment_id);
    loan.last_repayment_at = Some(Timestamp::now());
    if loan.current_balance == Amount::zero() {
        loan.status = LoanStatus::FullyRepaid;
    }
    Ok(())
}

/// Loan application lifecycle over the store. Mutations re-read the loan
/// immediately before writing; a stale admin screen loses the race with an
/// InvalidState error rather than a double decision.
#[derive(Clone)]
pub struct LoanBook {
    store: Arc<dyn DocumentStore>,
}

impl LoanBook {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        LoanBook { store }
    }

    pub async fn submit(
        &self,
        member_id: MemberId,
        application: LoanApplication,
    ) -> Result<LoanRequest> {
        application.validate()?;
        let member = fetch_member(self.store.as_ref(), member_id).await?;
        if !member.can_transact() {
            return Err(Error::MemberNotActive {
                status: member.status,
            });
        }

        let loan = LoanRequest {
            id: LoanId::new(),
            member_id,
            requested_amount: application.requested_amount,
            approved_amount: Amount::zero(),
            current_balance: Amount::zero(),
            status: LoanStatus::PendingReview,
            purpose: application.purpose,
            repayment_period_months: application.repayment_period_months,
            monthly_income: application.monthly_income,
            bank_details: application.bank_details,
            submitted_at: Timestamp::now(),
            decided_at: None,
            decision_notes: None,
            last_repayment_id: None,
            last_repayment_at: None,
        };
        self.store
            .create(
                Collection::LoanRequests,
                loan.id.into(),
                encode(Collection::LoanRequests, &loan)?,
            )
            .await?;

        tracing::info!(loan_id = %loan.id, member_id = %member_id, requested = %loan.requested_amount, "loan submitted");
        Ok(loan)
    }

    pub async fn approve(
        &self,
        loan_id: LoanId,
        approved_amount: Amount,
        notes: Option<String>,
    ) -> Result<LoanRequest> {
        let mut loan = fetch_loan(self.store.as_ref(), loan_id).await?;
        approve_loan(&mut loan, approved_amount, notes)?;
        self.store
            .update(
                Collection::LoanRequests,
                loan.id.into(),
                encode(Collection::LoanRequests, &loan)?,
            )
            .await?;

        LOANS_APPROVED.inc();
        tracing::info!(loan_id = %loan_id, approved = %approved_amount, "loan approved");
        Ok(loan)
    }

    pub async fn reject(&self, loan_id: LoanId, notes: Option<String>) -> Result<LoanRequest> {
        let mut loan = fetch_loan(self.store.as_ref(), loan_id).await?;
        reject_loan(&mut loan, notes)?;
        self.store
            .update(
                Collection::LoanRequests,
                loan.id.into(),
                encode(Collection::LoanRequests, &loan)?,
            )
            .await?;

        tracing::info!(loan_id = %loan_id, "loan rejected");
        Ok(loan)
    }

    pub async fn get(&self, loan_id: LoanId) -> Result<LoanRequest> {
        fetch_loan(self.store.as_ref(), loan_id).await
    }
}
