//! Prometheus counters for the synchronization pipeline.
//!
//! Collectors are created unregistered and attached to [`REGISTRY`] on first
//! use of [`gather_text`]; embedders may also attach them to their own
//! registry with [`register_custom_metrics`].

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;

#[cfg(test)]
mod metrics_test;

lazy_static! {
    pub static ref ENDPOINT_UPDATES_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("endpoint_updates_total", "Endpoint updates emitted by the watcher"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref SKIPPED_RECORDS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("skipped_records_total", "Endpoint records skipped because they failed to decode"),
        &["stage"]
    )
    .expect("metric can not be created");

    pub static ref IGNORED_EVENTS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("ignored_events_total", "Watch events dropped without an update"),
        &["action"]
    )
    .expect("metric can not be created");

    pub static ref LABEL_MERGE_CONFLICTS_METRIC: IntCounter = IntCounter::new(
        "label_merge_conflicts_total",
        "Compare-and-swap conflicts hit by the label merge writer"
    )
    .expect("metric can not be created");

    pub static ref LABEL_MERGE_FAILURES_METRIC: IntCounter = IntCounter::new(
        "label_merge_failures_total",
        "Label merges that gave up after exhausting retries"
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER_ONCE: Once = Once::new();

pub fn register_custom_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ENDPOINT_UPDATES_METRIC.clone()),
        Box::new(SKIPPED_RECORDS_METRIC.clone()),
        Box::new(IGNORED_EVENTS_METRIC.clone()),
        Box::new(LABEL_MERGE_CONFLICTS_METRIC.clone()),
        Box::new(LABEL_MERGE_FAILURES_METRIC.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            error!("collector can not be registered: {}", e);
        }
    }
}

/// Text exposition of every collector in [`REGISTRY`]
pub fn gather_text() -> String {
    REGISTER_ONCE.call_once(|| register_custom_metrics(&REGISTRY));

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_else(|e| {
        error!("custom metrics could not be from_utf8'd: {}", e);
        String::default()
    })
}
