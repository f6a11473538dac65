use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::{LazyLock, Once};

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Request counters
pub static REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("openback_requests_total", "Open Payments requests by route"),
        &["route"],
    )
    .unwrap()
});

// Grant counters
pub static GRANTS_REQUESTED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "openback_grants_requested_total",
        "Interactive outgoing-payment grants handed back as pending",
    )
    .unwrap()
});

pub static GRANTS_FINALIZED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "openback_grants_finalized_total",
        "Grants continued into an access token",
    )
    .unwrap()
});

// Payment counters
pub static PAYMENTS_CREATED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "openback_payments_created_total",
            "Payment resources created at resource servers",
        ),
        &["kind"],
    )
    .unwrap()
});

// Error counters
pub static ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("openback_errors_total", "Failed requests by error tag"),
        &["error"],
    )
    .unwrap()
});

static REGISTER: Once = Once::new();

/// Register all metrics with the registry. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        REGISTRY.register(Box::new(REQUESTS_TOTAL.clone())).unwrap();
        REGISTRY
            .register(Box::new(GRANTS_REQUESTED.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(GRANTS_FINALIZED.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(PAYMENTS_CREATED.clone()))
            .unwrap();
        REGISTRY.register(Box::new(ERRORS_TOTAL.clone())).unwrap();
    });
}
