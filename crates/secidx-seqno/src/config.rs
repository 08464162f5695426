use std::time::Duration;

/// Tunables for one bucket's sequence-number reader.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Number of sticky-dispatch worker actors (spec default: 10).
    pub worker_count: usize,
    /// Cached VB count; a fan-out result shorter than this is an error.
    pub vb_count: usize,
    /// How often the background sweeper re-validates node connectivity
    /// and topology.
    pub sweep_interval: Duration,
    /// Bound on the reader's and each worker's command queue.
    pub queue_size: usize,
}

impl ReaderConfig {
    pub fn new(worker_count: usize, vb_count: usize) -> Self {
        Self {
            worker_count,
            vb_count,
            sweep_interval: Duration::from_secs(10),
            queue_size: 256,
        }
    }
}
