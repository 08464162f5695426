use std::sync::atomic::{AtomicU32, Ordering};

use tracing::info;

use crate::cid::Cid;

/// Tracks the cluster's observed minimum-compat version and gates the
/// collection-aware protocol on it (spec.md §4.D: "Cluster-version
/// detection is folded in: when the observed cluster minimum-compat
/// crosses a threshold, subsequent default-collection queries switch to
/// the collection-aware protocol").
pub struct ClusterCompat {
    threshold: u32,
    observed: AtomicU32,
}

impl ClusterCompat {
    pub fn new(threshold: u32) -> Self {
        Self { threshold, observed: AtomicU32::new(0) }
    }

    /// Records a freshly observed cluster minimum-compat version, e.g.
    /// from a `poolsStreaming` watch. Logs once on the transition.
    pub fn observe(&self, version: u32) {
        let previous = self.observed.swap(version, Ordering::SeqCst);
        if previous < self.threshold && version >= self.threshold {
            info!(version, threshold = self.threshold, "cluster crossed collection-aware compat threshold");
        }
    }

    pub fn is_collection_aware(&self) -> bool {
        self.observed.load(Ordering::SeqCst) >= self.threshold
    }

    /// The cid a default-collection query should carry given the
    /// current compat state.
    pub fn default_collection_cid(&self) -> Cid {
        if self.is_collection_aware() {
            Cid::DEFAULT_COLLECTION
        } else {
            Cid::BUCKET
        }
    }
}
