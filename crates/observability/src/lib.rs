use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Workspace crates that log at `info` unless `RUST_LOG` says otherwise.
const WALKS_TARGETS: [&str; 4] = [
    "walks_api",
    "walks_agents",
    "walks_catalog",
    "walks_recommender",
];

/// Why a recommender call produced no usable picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommenderFailure {
    Timeout,
    Unreachable,
    BadStatus,
    Malformed,
}

/// Counters for the route pipeline, shared by every request.
#[derive(Debug, Default)]
pub struct AppMetrics {
    route_requests_total: AtomicU64,
    routes_built_total: AtomicU64,
    insufficient_candidates_total: AtomicU64,
    matched_places_total: AtomicU64,
    backfilled_places_total: AtomicU64,
    recommender_timeouts: AtomicU64,
    recommender_unreachable: AtomicU64,
    recommender_bad_status: AtomicU64,
    recommender_malformed: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub route_requests_total: u64,
    pub routes_built_total: u64,
    pub insufficient_candidates_total: u64,
    pub recommender_failures_total: u64,
    pub recommender_failures: RecommenderFailureCounts,
    pub matched_places_total: u64,
    pub backfilled_places_total: u64,
    /// Share of route stops that came from the recommender rather than backfill.
    pub recommender_hit_ratio: f64,
    pub avg_latency_millis: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecommenderFailureCounts {
    pub timeout: u64,
    pub unreachable: u64,
    pub bad_status: u64,
    pub malformed: u64,
}

impl RecommenderFailureCounts {
    pub fn total(&self) -> u64 {
        self.timeout + self.unreachable + self.bad_status + self.malformed
    }
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_route_request(&self) {
        self.route_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_route_built(&self) {
        self.routes_built_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_insufficient_candidates(&self) {
        self.insufficient_candidates_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_recommender_failure(&self, failure: RecommenderFailure) {
        let counter = match failure {
            RecommenderFailure::Timeout => &self.recommender_timeouts,
            RecommenderFailure::Unreachable => &self.recommender_unreachable,
            RecommenderFailure::BadStatus => &self.recommender_bad_status,
            RecommenderFailure::Malformed => &self.recommender_malformed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Records how the stops of one built route were chosen.
    pub fn record_reconciliation(&self, matched: usize, backfilled: usize) {
        self.matched_places_total
            .fetch_add(matched as u64, Ordering::Relaxed);
        self.backfilled_places_total
            .fetch_add(backfilled as u64, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.route_requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);
        let matched = self.matched_places_total.load(Ordering::Relaxed);
        let backfilled = self.backfilled_places_total.load(Ordering::Relaxed);
        let failures = RecommenderFailureCounts {
            timeout: self.recommender_timeouts.load(Ordering::Relaxed),
            unreachable: self.recommender_unreachable.load(Ordering::Relaxed),
            bad_status: self.recommender_bad_status.load(Ordering::Relaxed),
            malformed: self.recommender_malformed.load(Ordering::Relaxed),
        };

        MetricsSnapshot {
            route_requests_total: requests,
            routes_built_total: self.routes_built_total.load(Ordering::Relaxed),
            insufficient_candidates_total: self
                .insufficient_candidates_total
                .load(Ordering::Relaxed),
            recommender_failures_total: failures.total(),
            recommender_failures: failures,
            matched_places_total: matched,
            backfilled_places_total: backfilled,
            recommender_hit_ratio: ratio(matched, matched + backfilled),
            avg_latency_millis: ratio(latency, requests),
        }
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn default_directives(service_name: &str) -> String {
    std::iter::once(service_name)
        .chain(WALKS_TARGETS.iter().copied().filter(|target| *target != service_name))
        .map(|target| format!("{target}=info"))
        .collect::<Vec<_>>()
        .join(",")
}

/// JSON logs to stdout. Safe to call more than once; only the first call
/// installs the subscriber.
pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name)));

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .init();
    });
}
