use lazy_static::lazy_static;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Savings metrics
    pub static ref DEPOSITS_SUBMITTED: IntCounter = IntCounter::new(
        "deposits_submitted_total",
        "Total number of deposit entries submitted"
    ).unwrap();

    pub static ref DEPOSITS_CONFIRMED: IntCounter = IntCounter::new(
        "deposits_confirmed_total",
        "Total number of deposit entries confirmed"
    ).unwrap();

    // Withdrawal metrics
    pub static ref WITHDRAWALS_REQUESTED: IntCounter = IntCounter::new(
        "withdrawals_requested_total",
        "Total number of withdrawal requests accepted"
    ).unwrap();

    pub static ref WITHDRAWALS_APPROVED: IntCounter = IntCounter::new(
        "withdrawals_approved_total",
        "Total number of withdrawals approved"
    ).unwrap();

    pub static ref WITHDRAWALS_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "withdrawals_rejected_total",
            "Total number of withdrawals rejected, by reason"
        ),
        &["reason"]
    ).unwrap();

    // Loan metrics
    pub static ref LOANS_APPROVED: IntCounter = IntCounter::new(
        "loans_approved_total",
        "Total number of loans approved"
    ).unwrap();

    pub static ref REPAYMENTS_CONFIRMED: IntCounter = IntCounter::new(
        "repayments_confirmed_total",
        "Total number of loan repayments confirmed"
    ).unwrap();

    // Membership metrics
    pub static ref MEMBERS_ACTIVATED: IntCounter = IntCounter::new(
        "members_activated_total",
        "Total number of members activated"
    ).unwrap();

    pub static ref ACTIVATION_REPAIRS: IntCounter = IntCounter::new(
        "activation_repairs_total",
        "Activations completed by the repair path after a partial failure"
    ).unwrap();

    // Store metrics
    pub static ref STORE_RETRIES: IntCounter = IntCounter::new(
        "store_retries_total",
        "Store calls retried after a transient failure"
    ).unwrap();

    // Latency metrics
    pub static ref BALANCE_COMPUTE_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "balance_compute_latency_seconds",
            "Savings balance computation latency"
        ).buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0])
    ).unwrap();
}

pub fn register_metrics() {
    REGISTRY.register(Box::new(DEPOSITS_SUBMITTED.clone())).unwrap();
    REGISTRY.register(Box::new(DEPOSITS_CONFIRMED.clone())).unwrap();
    REGISTRY.register(Box::new(WITHDRAWALS_REQUESTED.clone())).unwrap();
    REGISTRY.register(Box::new(WITHDRAWALS_APPROVED.clone())).unwrap();
    REGISTRY.register(Box::new(WITHDRAWALS_REJECTED.clone())).unwrap();
    REGISTRY.register(Box::new(LOANS_APPROVED.clone())).unwrap();
    REGISTRY.register(Box::new(REPAYMENTS_CONFIRMED.clone())).unwrap();
    REGISTRY.register(Box::new(MEMBERS_ACTIVATED.clone())).unwrap();
    REGISTRY.register(Box::new(ACTIVATION_REPAIRS.clone())).unwrap();
    REGISTRY.register(Box::new(STORE_RETRIES.clone())).unwrap();
    REGISTRY.register(Box::new(BALANCE_COMPUTE_LATENCY.clone())).unwrap();
}
