use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::BankDisplayConfig;
use crate::error::Error;
use crate::interfaces::file_store::{Bucket, FileStore};
use crate::ledger::balance::BalanceCalculator;
use crate::ledger::loan::{LoanApplication, LoanBook};
use crate::ledger::reconciliation::Reconciler;
use crate::ledger::savings::SavingsLedger;
use crate::ledger::withdrawal::WithdrawalGuard;
use crate::observability::metrics::REGISTRY;
use crate::types::amount::Amount;
use crate::types::bank::BankDetails;
use crate::types::ids::{EntryId, FileId, LoanId, MemberId, PaymentId, WithdrawalId};
use crate::types::loan::LoanRequest;
use crate::types::member::Member;
use crate::types::payment::Payment;
use crate::types::savings::SavingsEntry;
use crate::types::withdrawal::WithdrawalRequest;

/// The facade owns no business rules: it parses, delegates to the ledger,
/// and maps error kinds onto status codes.
pub struct ApiState {
    pub balances: BalanceCalculator,
    pub savings: SavingsLedger,
    pub loans: LoanBook,
    pub withdrawals: WithdrawalGuard,
    pub reconciler: Reconciler,
    pub files: Arc<dyn FileStore>,
    pub bank: BankDisplayConfig,
}

pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/bank-details", get(bank_details))
        .route("/members", post(register_member))
        .route("/members/:id/balance", get(member_balance))
        .route("/members/:id/activate", post(repair_activation))
        .route("/members/:id/registration-payments", post(submit_registration_payment))
        .route("/registrations/:id/confirm", post(confirm_registration))
        .route("/registrations/:id/reject", post(reject_registration))
        .route("/members/:id/deposits", post(submit_deposit))
        .route("/savings/:id/confirm", post(confirm_entry))
        .route("/savings/:id/reject", post(reject_entry))
        .route("/loans", post(submit_loan))
        .route("/loans/:id", get(get_loan))
        .route("/loans/:id/approve", post(approve_loan))
        .route("/loans/:id/reject", post(reject_loan))
        .route("/loans/:id/repayments", post(submit_repayment))
        .route("/repayments/:id/confirm", post(confirm_repayment))
        .route("/repayments/:id/reject", post(reject_repayment))
        .route("/withdrawals", post(request_withdrawal))
        .route("/withdrawals/:id/approve", post(approve_withdrawal))
        .route("/withdrawals/:id/reject", post(reject_withdrawal))
        .route("/files/payment-proofs", post(upload_payment_proof))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

type Rejection = (StatusCode, String);
type ApiResult<T> = Result<Json<T>, Rejection>;

fn reject(err: Error) -> Rejection {
    let status = match &err {
        Error::NonPositiveAmount
        | Error::InvalidRepaymentPeriod
        | Error::NegativeMonthlyIncome
        | Error::IncompleteBankDetails { .. }
        | Error::WrongRegistrationFee { .. }
        | Error::MissingLoanReference
        | Error::MalformedDocument { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::InvalidState { .. } | Error::MemberNotActive { .. } => StatusCode::CONFLICT,
        Error::InsufficientBalance { .. } | Error::InsufficientFunds { .. } => {
            StatusCode::PAYMENT_REQUIRED
        }
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn bad_id(_: uuid::Error) -> Rejection {
    (StatusCode::BAD_REQUEST, "malformed id".to_string())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics() -> Result<String, Rejection> {
    prometheus::TextEncoder::new()
        .encode_to_string(&REGISTRY.gather())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

async fn bank_details(State(state): State<Arc<ApiState>>) -> Json<BankDisplayConfig> {
    Json(state.bank.clone())
}

#[derive(Deserialize)]
struct RegisterMemberRequest {
    membership_number: String,
}

async fn register_member(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<RegisterMemberRequest>,
) -> ApiResult<Member> {
    state
        .reconciler
        .register_member(req.membership_number)
        .await
        .map(Json)
        .map_err(reject)
}

#[derive(Serialize)]
struct BalanceResponse {
    member_id: MemberId,
    balance_minor: i64,
}

async fn member_balance(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<BalanceResponse> {
    let member_id = MemberId::from_string(&id).map_err(bad_id)?;
    let balance = state
        .balances
        .balance_of(member_id)
        .await
        .map_err(reject)?;
    Ok(Json(BalanceResponse {
        member_id,
        balance_minor: balance.to_minor(),
    }))
}

async fn repair_activation(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<Member> {
    let member_id = MemberId::from_string(&id).map_err(bad_id)?;
    state
        .reconciler
        .repair_member_activation(member_id)
        .await
        .map(Json)
        .map_err(reject)
}

#[derive(Deserialize)]
struct PaymentSubmission {
    amount_minor: i64,
    proof_file: Option<String>,
}

fn parse_proof(proof_file: Option<String>) -> Result<Option<FileId>, Rejection> {
    proof_file
        .map(|s| FileId::from_string(&s))
        .transpose()
        .map_err(bad_id)
}

async fn submit_registration_payment(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(req): Json<PaymentSubmission>,
) -> ApiResult<Payment> {
    let member_id = MemberId::from_string(&id).map_err(bad_id)?;
    let proof = parse_proof(req.proof_file)?;
    state
        .reconciler
        .submit_registration_payment(member_id, Amount::from_minor(req.amount_minor), proof)
        .await
        .map(Json)
        .map_err(reject)
}

async fn confirm_registration(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<Member> {
    let payment_id = PaymentId::from_string(&id).map_err(bad_id)?;
    state
        .reconciler
        .confirm_registration(payment_id)
        .await
        .map(Json)
        .map_err(reject)
}

#[derive(Deserialize)]
struct RejectionRequest {
    reason: String,
}

async fn reject_registration(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(req): Json<RejectionRequest>,
) -> ApiResult<Payment> {
    let payment_id = PaymentId::from_string(&id).map_err(bad_id)?;
    state
        .reconciler
        .reject_registration(payment_id, req.reason)
        .await
        .map(Json)
        .map_err(reject)
}

#[derive(Deserialize)]
struct DepositRequest {
    amount_minor: i64,
    description: String,
}

async fn submit_deposit(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(req): Json<DepositRequest>,
) -> ApiResult<SavingsEntry> {
    let member_id = MemberId::from_string(&id).map_err(bad_id)?;
    state
        .savings
        .submit_deposit(member_id, Amount::from_minor(req.amount_minor), req.description)
        .await
        .map(Json)
        .map_err(reject)
}

async fn confirm_entry(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<SavingsEntry> {
    let entry_id = EntryId::from_string(&id).map_err(bad_id)?;
    state.savings.confirm_entry(entry_id).await.map(Json).map_err(reject)
}

async fn reject_entry(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<SavingsEntry> {
    let entry_id = EntryId::from_string(&id).map_err(bad_id)?;
    state.savings.reject_entry(entry_id).await.map(Json).map_err(reject)
}

#[derive(Deserialize)]
struct LoanSubmission {
    member_id: String,
    requested_amount_minor: i64,
    purpose: String,
    repayment_period_months: u32,
    monthly_income_minor: i64,
    bank_details: BankDetails,
}

async fn submit_loan(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<LoanSubmission>,
) -> ApiResult<LoanRequest> {
    let member_id = MemberId::from_string(&req.member_id).map_err(bad_id)?;
    let application = LoanApplication {
        requested_amount: Amount::from_minor(req.requested_amount_minor),
        purpose: req.purpose,
        repayment_period_months: req.repayment_period_months,
        monthly_income: Amount::from_minor(req.monthly_income_minor),
        bank_details: req.bank_details,
    };
    state
        .loans
        .submit(member_id, application)
        .await
        .map(Json)
        .map_err(reject)
}

async fn get_loan(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<LoanRequest> {
    let loan_id = LoanId::from_string(&id).map_err(bad_id)?;
    state.loans.get(loan_id).await.map(Json).map_err(reject)
}

#[derive(Deserialize)]
struct LoanDecision {
    approved_amount_minor: Option<i64>,
    notes: Option<String>,
}

async fn approve_loan(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(req): Json<LoanDecision>,
) -> ApiResult<LoanRequest> {
    let loan_id = LoanId::from_string(&id).map_err(bad_id)?;
    let amount = req
        .approved_amount_minor
        .map(Amount::from_minor)
        .ok_or((StatusCode::UNPROCESSABLE_ENTITY, "approved_amount_minor is required".to_string()))?;
    state
        .loans
        .approve(loan_id, amount, req.notes)
        .await
        .map(Json)
        .map_err(reject)
}

async fn reject_loan(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(req): Json<LoanDecision>,
) -> ApiResult<LoanRequest> {
    let loan_id = LoanId::from_string(&id).map_err(bad_id)?;
    state
        .loans
        .reject(loan_id, req.notes)
        .await
        .map(Json)
        .map_err(reject)
}

#[derive(Deserialize)]
struct RepaymentSubmission {
    member_id: String,
    amount_minor: i64,
    proof_file: Option<String>,
}

async fn submit_repayment(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(req): Json<RepaymentSubmission>,
) -> ApiResult<Payment> {
    let loan_id = LoanId::from_string(&id).map_err(bad_id)?;
    let member_id = MemberId::from_string(&req.member_id).map_err(bad_id)?;
    let proof = parse_proof(req.proof_file)?;
    state
        .reconciler
        .submit_repayment(member_id, loan_id, Amount::from_minor(req.amount_minor), proof)
        .await
        .map(Json)
        .map_err(reject)
}

async fn confirm_repayment(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<Payment> {
    let payment_id = PaymentId::from_string(&id).map_err(bad_id)?;
    state
        .reconciler
        .confirm_repayment(payment_id)
        .await
        .map(Json)
        .map_err(reject)
}

async fn reject_repayment(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(req): Json<RejectionRequest>,
) -> ApiResult<Payment> {
    let payment_id = PaymentId::from_string(&id).map_err(bad_id)?;
    state
        .reconciler
        .reject_repayment(payment_id, req.reason)
        .await
        .map(Json)
        .map_err(reject)
}

#[derive(Deserialize)]
struct WithdrawalSubmission {
    member_id: String,
    amount_minor: i64,
    bank_details: BankDetails,
}

async fn request_withdrawal(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<WithdrawalSubmission>,
) -> ApiResult<WithdrawalRequest> {
    let member_id = MemberId::from_string(&req.member_id).map_err(bad_id)?;
    state
        .withdrawals
        .request_withdrawal(member_id, Amount::from_minor(req.amount_minor), req.bank_details)
        .await
        .map(Json)
        .map_err(reject)
}

#[derive(Deserialize)]
struct WithdrawalDecision {
    notes: Option<String>,
}

async fn approve_withdrawal(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(req): Json<WithdrawalDecision>,
) -> ApiResult<WithdrawalRequest> {
    let withdrawal_id = WithdrawalId::from_string(&id).map_err(bad_id)?;
    state
        .withdrawals
        .approve_withdrawal(withdrawal_id, req.notes)
        .await
        .map(Json)
        .map_err(reject)
}

async fn reject_withdrawal(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(req): Json<RejectionRequest>,
) -> ApiResult<WithdrawalRequest> {
    let withdrawal_id = WithdrawalId::from_string(&id).map_err(bad_id)?;
    state
        .withdrawals
        .reject_withdrawal(withdrawal_id, req.reason)
        .await
        .map(Json)
        .map_err(reject)
}

#[derive(Serialize)]
struct UploadResponse {
    file_id: FileId,
    view_url: String,
    download_url: String,
}

async fn upload_payment_proof(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> ApiResult<UploadResponse> {
    let file_id = state
        .files
        .create_file(Bucket::PaymentProofs, body.to_vec())
        .await
        .map_err(reject)?;
    Ok(Json(UploadResponse {
        file_id,
        view_url: state.files.file_view_url(Bucket::PaymentProofs, file_id),
        download_url: state.files.file_download_url(Bucket::PaymentProofs, file_id),
    }))
}
