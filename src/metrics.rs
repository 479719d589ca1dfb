//! Prometheus metrics for allocator activity
//!
//! Counters are process-wide and shared by every allocator instance. Call
//! [`init_metrics`] once to register them, then scrape [`export_metrics`].

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::{error, info};

use crate::allocator::AssignmentKind;

lazy_static::lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = Registry::new();

    pub static ref ASSIGNMENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("delicounter_assignments_total", "Slot assignments by outcome"),
        &["kind"]
    ).unwrap();

    pub static ref REMOVALS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("delicounter_removals_total", "Remove calls by whether a ticket existed"),
        &["found"]
    ).unwrap();

    pub static ref RECLAIM_PASSES_TOTAL: IntCounter = IntCounter::new(
        "delicounter_reclaim_passes_total",
        "Reclamation passes that consulted an activity oracle"
    ).unwrap();

    pub static ref RECLAIMED_TICKETS_TOTAL: IntCounter = IntCounter::new(
        "delicounter_reclaimed_tickets_total",
        "Tickets evicted because their item was no longer active"
    ).unwrap();
}

/// Register all metrics with the global registry
pub fn init_metrics() {
    info!("Initializing Prometheus metrics");

    METRICS_REGISTRY.register(Box::new(ASSIGNMENTS_TOTAL.clone())).ok();
    METRICS_REGISTRY.register(Box::new(REMOVALS_TOTAL.clone())).ok();
    METRICS_REGISTRY.register(Box::new(RECLAIM_PASSES_TOTAL.clone())).ok();
    METRICS_REGISTRY.register(Box::new(RECLAIMED_TICKETS_TOTAL.clone())).ok();
}

pub(crate) fn record_assignment(kind: AssignmentKind) {
    ASSIGNMENTS_TOTAL.with_label_values(&[kind.as_str()]).inc();
}

pub(crate) fn record_removal(found: bool) {
    let label = if found { "true" } else { "false" };
    REMOVALS_TOTAL.with_label_values(&[label]).inc();
}

pub(crate) fn record_reclaim(evicted: usize) {
    RECLAIM_PASSES_TOTAL.inc();
    RECLAIMED_TICKETS_TOTAL.inc_by(evicted as u64);
}

/// Export metrics in Prometheus text format
pub fn export_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|_| String::from("# Error converting metrics\n"))
}
