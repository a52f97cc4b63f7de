use std::sync::Arc;

use tracing::Instrument;

use crate::error::{Error, Result};
use crate::interfaces::document_store::{encode, Collection, DocumentStore, Filter};
use crate::ledger::loan::apply_repayment;
use crate::ledger::{fetch_loan, fetch_member, fetch_payment};
use crate::observability::metrics::{ACTIVATION_REPAIRS, MEMBERS_ACTIVATED, REPAYMENTS_CONFIRMED};
use crate::observability::tracing::trace_repayment_confirmation;
use crate::types::amount::Amount;
use crate::types::ids::{FileId, LoanId, MemberId, PaymentId};
use crate::types::loan::LoanStatus;
use crate::types::member::{Member, MemberStatus};
use crate::types::payment::{Payment, PaymentKind, PaymentStatus};
use crate::types::timestamp::Timestamp;

/// Coordinates the flows that touch more than one document. The store only
/// guarantees single-document atomicity, so write order is chosen to make
/// every crash window leave a Pending record (retryable) rather than a
/// Confirmed-but-unapplied one (lost money).
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn DocumentStore>,
    registration_fee: Amount,
}

impl Reconciler {
    pub fn new(store: Arc<dyn DocumentStore>, registration_fee: Amount) -> Self {
        Reconciler {
            store,
            registration_fee,
        }
    }

    pub async fn register_member(&self, membership_number: String) -> Result<Member> {
        if membership_number.trim().is_empty() {
            return Err(Error::InvalidState {
                entity: "membership number",
                expected: "non-empty",
                actual: "blank".to_string(),
            });
        }

        let member = Member::new(membership_number);
        self.store
            .create(
                Collection::Members,
                member.id.into(),
                encode(Collection::Members, &member)?,
            )
            .await?;

        tracing::info!(member_id = %member.id, "member registered");
        Ok(member)
    }

    pub async fn submit_registration_payment(
        &self,
        member_id: MemberId,
        amount: Amount,
        proof_file: Option<FileId>,
    ) -> Result<Payment> {
        if !amount.is_positive() {
            return Err(Error::NonPositiveAmount);
        }
        if amount != self.registration_fee {
            return Err(Error::WrongRegistrationFee {
                expected: self.registration_fee,
                got: amount,
            });
        }
        // The member exists but need not be Active; registration is how
        // they get there.
        fetch_member(self.store.as_ref(), member_id).await?;

        let payment = Payment::registration(member_id, amount, proof_file);
        self.store
            .create(
                Collection::Payments,
                payment.id.into(),
                encode(Collection::Payments, &payment)?,
            )
            .await?;

        tracing::info!(payment_id = %payment.id, member_id = %member_id, "registration payment submitted");
        Ok(payment)
    }

    /// Step order: payment first, member second. A crash in between leaves
    /// a Confirmed payment and a Pending member, which
    /// [`Reconciler::repair_member_activation`] completes.
    pub async fn confirm_registration(&self, payment_id: PaymentId) -> Result<Member> {
        let mut payment = fetch_payment(self.store.as_ref(), payment_id).await?;
        require_pending(&payment)?;
        require_kind(&payment, PaymentKind::Registration)?;

        payment.status = PaymentStatus::Confirmed;
        payment.decided_at = Some(Timestamp::now());
        self.store
            .update(
                Collection::Payments,
                payment.id.into(),
                encode(Collection::Payments, &payment)?,
            )
            .await?;

        tracing::info!(payment_id = %payment_id, "registration payment confirmed");
        self.activate_member(payment.member_id).await.map_err(|e| {
            // Payment already Confirmed: the repair path finishes this.
            tracing::error!(payment_id = %payment_id, step = "member_activation", error = %e, "registration confirmed but activation failed");
            e
        })
    }

    pub async fn reject_registration(
        &self,
        payment_id: PaymentId,
        reason: String,
    ) -> Result<Payment> {
        self.reject_payment(payment_id, PaymentKind::Registration, reason)
            .await
    }

    /// Idempotent completion of a half-applied registration: activates the
    /// member when their latest registration payment is Confirmed, succeeds
    /// without side effects when they are already Active.
    pub async fn repair_member_activation(&self, member_id: MemberId) -> Result<Member> {
        let member = fetch_member(self.store.as_ref(), member_id).await?;
        if member.status == MemberStatus::Active {
            return Ok(member);
        }

        let payments = self
            .store
            .list(
                Collection::Payments,
                Filter::new()
                    .eq("member_id", member_id)
                    .eq("kind", PaymentKind::Registration)
                    .newest_first(),
            )
            .await?;
        let latest: Option<Payment> = match payments.first() {
            Some(doc) => Some(doc.decode(Collection::Payments)?),
            None => None,
        };

        match latest {
            Some(payment) if payment.status == PaymentStatus::Confirmed => {
                ACTIVATION_REPAIRS.inc();
                tracing::warn!(member_id = %member_id, "completing interrupted activation");
                self.activate_member(member_id).await
            }
            Some(payment) => Err(Error::InvalidState {
                entity: "registration payment",
                expected: "Confirmed",
                actual: format!("{:?}", payment.status),
            }),
            None => Err(Error::InvalidState {
                entity: "registration payment",
                expected: "Confirmed",
                actual: "missing".to_string(),
            }),
        }
    }

    async fn activate_member(&self, member_id: MemberId) -> Result<Member> {
        let mut member = fetch_member(self.store.as_ref(), member_id).await?;
        if member.status == MemberStatus::Active {
            return Ok(member);
        }

        member.status = MemberStatus::Active;
        member.activated_at = Some(Timestamp::now());
        self.store
            .update(
                Collection::Members,
                member.id.into(),
                encode(Collection::Members, &member)?,
            )
            .await?;

        MEMBERS_ACTIVATED.inc();
        tracing::info!(member_id = %member_id, "member activated");
        Ok(member)
    }

    pub async fn submit_repayment(
        &self,
        member_id: MemberId,
        loan_id: LoanId,
        amount: Amount,
        proof_file: Option<FileId>,
    ) -> Result<Payment> {
        if !amount.is_positive() {
            return Err(Error::NonPositiveAmount);
        }
        let member = fetch_member(self.store.as_ref(), member_id).await?;
        if !member.can_transact() {
            return Err(Error::MemberNotActive {
                status: member.status,
            });
        }
        let loan = fetch_loan(self.store.as_ref(), loan_id).await?;
        if loan.member_id != member_id {
            return Err(Error::NotFound {
                collection: Collection::LoanRequests,
                id: loan_id.into(),
            });
        }
        if loan.status != LoanStatus::Approved {
            return Err(Error::InvalidState {
                entity: "loan",
                expected: "Approved",
                actual: format!("{:?}", loan.status),
            });
        }

        let payment = Payment::repayment(member_id, loan_id, amount, proof_file);
        self.store
            .create(
                Collection::Payments,
                payment.id.into(),
                encode(Collection::Payments, &payment)?,
            )
            .await?;

        tracing::info!(payment_id = %payment.id, loan_id = %loan_id, amount = %amount, "repayment submitted");
        Ok(payment)
    }

    /// Step order: loan balance first, payment status second. A crash in
    /// between leaves the payment Pending and the loan already decremented;
    /// the re-run sees its own id in `last_repayment_id` and completes the
    /// payment without applying the decrement twice.
    pub async fn confirm_repayment(&self, payment_id: PaymentId) -> Result<Payment> {
        let span = trace_repayment_confirmation(&payment_id);
        self.confirm_repayment_inner(payment_id).instrument(span).await
    }

    async fn confirm_repayment_inner(&self, payment_id: PaymentId) -> Result<Payment> {
        let mut payment = fetch_payment(self.store.as_ref(), payment_id).await?;
        require_pending(&payment)?;
        require_kind(&payment, PaymentKind::LoanRepayment)?;
        let loan_id = payment.loan_id.ok_or(Error::MissingLoanReference)?;

        let mut loan = fetch_loan(self.store.as_ref(), loan_id).await?;
        if loan.last_repayment_id == Some(payment_id) {
            tracing::warn!(payment_id = %payment_id, loan_id = %loan_id, "loan already decremented, completing interrupted confirmation");
        } else {
            apply_repayment(&mut loan, payment_id, payment.amount)?;
            // The balance write must commit before the payment flips; the
            // reverse order could mark money applied that never was.
            self.store
                .update(
                    Collection::LoanRequests,
                    loan.id.into(),
                    encode(Collection::LoanRequests, &loan)?,
                )
                .await
                .map_err(|e| {
                    tracing::error!(payment_id = %payment_id, loan_id = %loan_id, step = "loan_balance_write", error = %e, "repayment confirmation aborted");
                    e
                })?;
        }

        payment.status = PaymentStatus::Confirmed;
        payment.decided_at = Some(Timestamp::now());
        self.store
            .update(
                Collection::Payments,
                payment.id.into(),
                encode(Collection::Payments, &payment)?,
            )
            .await?;

        REPAYMENTS_CONFIRMED.inc();
        tracing::info!(payment_id = %payment_id, loan_id = %loan_id, balance = %loan.current_balance, "repayment confirmed");
        Ok(payment)
    }

    pub async fn reject_repayment(&self, payment_id: PaymentId, reason: String) -> Result<Payment> {
        self.reject_payment(payment_id, PaymentKind::LoanRepayment, reason)
            .await
    }

    async fn reject_payment(
        &self,
        payment_id: PaymentId,
        kind: PaymentKind,
        reason: String,
    ) -> Result<Payment> {
        let mut payment = fetch_payment(self.store.as_ref(), payment_id).await?;
        require_pending(&payment)?;
        require_kind(&payment, kind)?;

        payment.status = PaymentStatus::Rejected;
        payment.decided_at = Some(Timestamp::now());
        payment.rejection_reason = Some(reason);
        self.store
            .update(
                Collection::Payments,
                payment.id.into(),
                encode(Collection::Payments, &payment)?,
            )
            .await?;

        tracing::info!(payment_id = %payment_id, "payment rejected");
        Ok(payment)
    }
}

fn require_pending(payment: &Payment) -> Result<()> {
    if payment.status != PaymentStatus::Pending {
        return Err(Error::InvalidState {
            entity: "payment",
            expected: "Pending",
            actual: format!("{:?}", payment.status),
        });
    }
    Ok(())
}

fn require_kind(payment: &Payment, kind: PaymentKind) -> Result<()> {
    if payment.kind != kind {
        return Err(Error::InvalidState {
            entity: "payment",
            expected: match kind {
                PaymentKind::Registration => "Registration",
                PaymentKind::LoanRepayment => "LoanRepayment",
            },
            actual: format!("{:?}", payment.kind),
        });
    }
    Ok(())
}
