use std::sync::atomic::{AtomicU64, Ordering};

/// Per-path counters updated on every dispatch (spec.md §4.B).
#[derive(Debug, Default)]
pub struct PathStats {
    pub requests: AtomicU64,
    pub responses: AtomicU64,
    pub errors: AtomicU64,
    pub bytes_in: AtomicU64,
    pub bytes_out: AtomicU64,
}

/// Point-in-time snapshot of [`PathStats`], safe to serialize for `/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathStatsSnapshot {
    pub requests: u64,
    pub responses: u64,
    pub errors: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl PathStats {
    pub fn snapshot(&self) -> PathStatsSnapshot {
        PathStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            responses: self.responses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
        }
    }

    pub fn record_request(&self, bytes_in: usize) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.bytes_in.fetch_add(bytes_in as u64, Ordering::Relaxed);
    }

    pub fn record_response(&self, bytes_out: usize) {
        self.responses.fetch_add(1, Ordering::Relaxed);
        self.bytes_out.fetch_add(bytes_out as u64, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}
