use crate::errors::Result;
use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref CYCLES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "dashboard_cycles_total",
        "Total poll cycles started"
    ))
    .expect("valid counter opts");
    pub static ref CYCLES_SKIPPED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "dashboard_cycles_skipped_total",
        "Ticks skipped because the previous cycle was still in flight"
    ))
    .expect("valid counter opts");
    pub static ref FETCH_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "dashboard_fetch_failures_total",
        "Fetches that returned no usable data"
    ))
    .expect("valid counter opts");
    pub static ref MARKERS: Gauge = Gauge::with_opts(Opts::new(
        "dashboard_markers",
        "Markers currently registered on the map"
    ))
    .expect("valid gauge opts");
    pub static ref CYCLE_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "dashboard_cycle_latency_seconds",
            "Time taken by one fetch-and-render cycle"
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0])
    )
    .expect("valid histogram opts");
}

pub fn init_metrics() -> Result<()> {
    REGISTRY.register(Box::new(CYCLES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CYCLES_SKIPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(FETCH_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(MARKERS.clone()))?;
    REGISTRY.register(Box::new(CYCLE_LATENCY_SECONDS.clone()))?;
    Ok(())
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
