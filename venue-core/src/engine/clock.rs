//! Clock abstraction and the metadata oracle. The core never reads the
//! wall clock directly; time and sequencing enter only through these traits,
//! so a test can hold both fixed and replay is reproducible.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Produces nanosecond timestamps. Production uses the host monotonic-ish
/// wall clock; tests substitute a fixed or manually-advanced one.
pub trait Clock: Send + Sync {
    fn now_ns(&self) -> i64;
}

/// Production clock, backed by the system wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ns(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_nanos() as i64
    }
}

/// Deterministic clock for tests: returns a fixed value until advanced.
#[derive(Debug)]
pub struct ManualClock {
    now_ns: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ns: i64) -> Self {
        Self {
            now_ns: AtomicI64::new(start_ns),
        }
    }

    pub fn advance(&self, delta_ns: i64) {
        self.now_ns.fetch_add(delta_ns, Ordering::Relaxed);
    }

    pub fn set(&self, ns: i64) {
        self.now_ns.store(ns, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> i64 {
        self.now_ns.load(Ordering::Relaxed)
    }
}

/// Pairs a monotonic sequence counter with a clock to produce `(seq, ts_ns)`
/// pairs for every event. The venue owns one instance shared across all of
/// its engines so that `seq` is strictly increasing across instruments.
pub struct NextMeta {
    seq: AtomicU64,
    clock: Box<dyn Clock>,
}

impl NextMeta {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            seq: AtomicU64::new(0),
            clock,
        }
    }

    /// A counter that starts past `initial_seq`, for resuming replay.
    pub fn resuming_from(clock: Box<dyn Clock>, initial_seq: u64) -> Self {
        Self {
            seq: AtomicU64::new(initial_seq),
            clock,
        }
    }

    pub fn next(&self) -> (u64, i64) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        (seq, self.clock.now_ns())
    }

    pub fn current_seq(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }
}
