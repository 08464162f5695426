use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use secidx_types::Command;

/// Atomic counters tracking what has flowed through one endpoint
/// (spec.md §4.C).
#[derive(Debug, Default)]
pub struct EndpointStats {
    pub mut_count: AtomicU64,
    pub upsert_count: AtomicU64,
    pub delete_count: AtomicU64,
    pub upsdel_count: AtomicU64,
    pub sync_count: AtomicU64,
    pub begin_count: AtomicU64,
    pub end_count: AtomicU64,
    pub snap_count: AtomicU64,
    pub flush_count: AtomicU64,
    closed: AtomicBool,
    /// Exponential moving average of flush latency, in microseconds,
    /// stored as bits of an f64 so it can be updated with a CAS loop.
    avg_latency_us_bits: AtomicU64,
}

const EMA_ALPHA: f64 = 0.2;

/// Immutable point-in-time view, safe to hand to a `/stats` caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointStatsSnapshot {
    pub mut_count: u64,
    pub upsert_count: u64,
    pub delete_count: u64,
    pub upsdel_count: u64,
    pub sync_count: u64,
    pub begin_count: u64,
    pub end_count: u64,
    pub snap_count: u64,
    pub flush_count: u64,
    pub closed: bool,
    pub avg_latency_us: f64,
}

impl EndpointStats {
    pub fn record_command(&self, command: Command) {
        self.mut_count.fetch_add(1, Ordering::Relaxed);
        let counter = match command {
            Command::Upsert => &self.upsert_count,
            Command::Deletion => &self.delete_count,
            Command::UpsertDeletion => &self.upsdel_count,
            Command::Sync => &self.sync_count,
            Command::StreamBegin => &self.begin_count,
            Command::StreamEnd => &self.end_count,
            Command::Snapshot => &self.snap_count,
            Command::DropData => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flush(&self, latency_us: f64) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        let mut prev_bits = self.avg_latency_us_bits.load(Ordering::Relaxed);
        loop {
            let prev = f64::from_bits(prev_bits);
            let next = if prev == 0.0 {
                latency_us
            } else {
                prev + EMA_ALPHA * (latency_us - prev)
            };
            match self.avg_latency_us_bits.compare_exchange_weak(
                prev_bits,
                next.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => prev_bits = actual,
            }
        }
    }

    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> EndpointStatsSnapshot {
        EndpointStatsSnapshot {
            mut_count: self.mut_count.load(Ordering::Relaxed),
            upsert_count: self.upsert_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
            upsdel_count: self.upsdel_count.load(Ordering::Relaxed),
            sync_count: self.sync_count.load(Ordering::Relaxed),
            begin_count: self.begin_count.load(Ordering::Relaxed),
            end_count: self.end_count.load(Ordering::Relaxed),
            snap_count: self.snap_count.load(Ordering::Relaxed),
            flush_count: self.flush_count.load(Ordering::Relaxed),
            closed: self.is_closed(),
            avg_latency_us: f64::from_bits(self.avg_latency_us_bits.load(Ordering::Relaxed)),
        }
    }
}
