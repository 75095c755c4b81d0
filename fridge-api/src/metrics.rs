use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref HTTP_REQUESTS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "fridge_http_requests_total",
        "Total HTTP requests received"
    ))
    .unwrap();
    pub static ref TELEMETRY_CREATED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "fridge_telemetry_created_total",
        "Total telemetry documents persisted"
    ))
    .unwrap();
    pub static ref INVENTORY_CREATED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "fridge_inventory_created_total",
        "Total inventory documents persisted"
    ))
    .unwrap();
    pub static ref REJECTED_PAYLOADS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "fridge_rejected_payloads_total",
        "Total payloads rejected by validation"
    ))
    .unwrap();
    pub static ref STORE_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "fridge_store_failures_total",
        "Total document store call failures"
    ))
    .unwrap();
    pub static ref STORE_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "fridge_store_latency_seconds",
            "Time taken per document store call"
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0
        ])
    )
    .unwrap();
}

pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(TELEMETRY_CREATED_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(INVENTORY_CREATED_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(REJECTED_PAYLOADS_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(STORE_FAILURES_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(STORE_LATENCY_SECONDS.clone()))
        .unwrap();
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
