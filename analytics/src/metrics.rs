use crate::errors::Result;
use lazy_static::lazy_static;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "analytics_requests_total",
            "Total device API requests by endpoint"
        ),
        &["endpoint"]
    )
    .expect("valid requests_total metric");
    pub static ref QUERY_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "analytics_query_failures_total",
            "Total failed device API requests by error kind"
        ),
        &["kind"]
    )
    .expect("valid query_failures_total metric");
    pub static ref QUERY_LATENCY_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "analytics_query_latency_seconds",
            "Time taken to answer a device API request"
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0
        ]),
        &["endpoint"]
    )
    .expect("valid query_latency_seconds metric");
}

/// Registers all collectors. Registering twice reports an `AlreadyReg` error.
pub fn init_metrics() -> Result<()> {
    REGISTRY.register(Box::new(REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(QUERY_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(QUERY_LATENCY_SECONDS.clone()))?;
    Ok(())
}

pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
