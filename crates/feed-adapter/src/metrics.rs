use std::sync::atomic::{AtomicU64, Ordering};

use lazy_static::lazy_static;
use prometheus::{core::Collector, IntCounter, Registry};
use tracing::error;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedMetricsSnapshot {
    pub connects: u64,
    pub frames: u64,
    pub decode_failures: u64,
    pub server_errors: u64,
    pub disconnects: u64,
}

static CONNECTS: AtomicU64 = AtomicU64::new(0);
static FRAMES: AtomicU64 = AtomicU64::new(0);
static DECODE_FAILURES: AtomicU64 = AtomicU64::new(0);
static SERVER_ERRORS: AtomicU64 = AtomicU64::new(0);
static DISCONNECTS: AtomicU64 = AtomicU64::new(0);

lazy_static! {
    static ref FEED_CONNECTS_TOTAL: IntCounter = IntCounter::new(
        "jobpulse_feed_connects_total",
        "Total feed connections established"
    )
    .unwrap();
    static ref FEED_FRAMES_TOTAL: IntCounter = IntCounter::new(
        "jobpulse_feed_frames_total",
        "Total inbound frames received"
    )
    .unwrap();
    static ref FEED_DECODE_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "jobpulse_feed_decode_failures_total",
        "Total frames rejected by the decoder"
    )
    .unwrap();
    static ref FEED_SERVER_ERRORS_TOTAL: IntCounter = IntCounter::new(
        "jobpulse_feed_server_errors_total",
        "Total server-reported error frames"
    )
    .unwrap();
    static ref FEED_DISCONNECTS_TOTAL: IntCounter = IntCounter::new(
        "jobpulse_feed_disconnects_total",
        "Total feed connections closed"
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register feed metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, FEED_CONNECTS_TOTAL.clone());
    register(registry, FEED_FRAMES_TOTAL.clone());
    register(registry, FEED_DECODE_FAILURES_TOTAL.clone());
    register(registry, FEED_SERVER_ERRORS_TOTAL.clone());
    register(registry, FEED_DISCONNECTS_TOTAL.clone());
}

pub fn record_connect() {
    CONNECTS.fetch_add(1, Ordering::Relaxed);
    FEED_CONNECTS_TOTAL.inc();
}

pub fn record_frame() {
    FRAMES.fetch_add(1, Ordering::Relaxed);
    FEED_FRAMES_TOTAL.inc();
}

pub fn record_decode_failure() {
    DECODE_FAILURES.fetch_add(1, Ordering::Relaxed);
    FEED_DECODE_FAILURES_TOTAL.inc();
}

pub fn record_server_error() {
    SERVER_ERRORS.fetch_add(1, Ordering::Relaxed);
    FEED_SERVER_ERRORS_TOTAL.inc();
}

pub fn record_disconnect() {
    DISCONNECTS.fetch_add(1, Ordering::Relaxed);
    FEED_DISCONNECTS_TOTAL.inc();
}

pub fn snapshot() -> FeedMetricsSnapshot {
    FeedMetricsSnapshot {
        connects: CONNECTS.load(Ordering::Relaxed),
        frames: FRAMES.load(Ordering::Relaxed),
        decode_failures: DECODE_FAILURES.load(Ordering::Relaxed),
        server_errors: SERVER_ERRORS.load(Ordering::Relaxed),
        disconnects: DISCONNECTS.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    CONNECTS.store(0, Ordering::Relaxed);
    FRAMES.store(0, Ordering::Relaxed);
    DECODE_FAILURES.store(0, Ordering::Relaxed);
    SERVER_ERRORS.store(0, Ordering::Relaxed);
    DISCONNECTS.store(0, Ordering::Relaxed);
}
