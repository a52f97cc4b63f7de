use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use CoopLedger::api::rest::{create_router, ApiState};
use CoopLedger::config::AppConfig;
use CoopLedger::ledger::balance::BalanceCalculator;
use CoopLedger::ledger::loan::LoanBook;
use CoopLedger::ledger::reconciliation::Reconciler;
use CoopLedger::ledger::savings::SavingsLedger;
use CoopLedger::ledger::withdrawal::WithdrawalGuard;
use CoopLedger::observability::metrics::register_metrics;
use CoopLedger::store::memory::MemoryStore;
use CoopLedger::store::retry::RetryingStore;
use CoopLedger::DEFAULT_ENV;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let env = std::env::var("COOPLEDGER_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());
    let config = AppConfig::load(&env)?;
    register_metrics();

    // Dev harness: the in-memory store behind the production retry policy.
    // A hosted-store client plugs in behind the same trait.
    let files = Arc::new(MemoryStore::new());
    let store = Arc::new(RetryingStore::new(
        MemoryStore::new(),
        config.store.timeout(),
        config.store.retry_backoff(),
    ));

    let state = Arc::new(ApiState {
        balances: BalanceCalculator::new(store.clone()),
        savings: SavingsLedger::new(store.clone()),
        loans: LoanBook::new(store.clone()),
        withdrawals: WithdrawalGuard::new(store.clone()),
        reconciler: Reconciler::new(store.clone(), config.cooperative.registration_fee()),
        files,
        bank: config.bank.clone(),
    });

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr).await?;
    tracing::info!(addr = %config.server.listen_addr, "ledger service listening");
    axum::serve(listener, router).await?;

    Ok(())
}
