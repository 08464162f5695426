use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free snapshot of one feed's VB distribution across states,
/// kept current by every state-mutating operation while it holds the
/// feed's internal mutex (spec.md §4.E: "reads of statistics are
/// lock-free atomic snapshots").
#[derive(Debug, Default)]
pub struct FeedStats {
    pub vbs_idle: AtomicU64,
    pub vbs_requested: AtomicU64,
    pub vbs_active: AtomicU64,
    pub vbs_ended: AtomicU64,
    pub vbs_errored: AtomicU64,
    pub vbs_rollback: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStatsSnapshot {
    pub vbs_idle: u64,
    pub vbs_requested: u64,
    pub vbs_active: u64,
    pub vbs_ended: u64,
    pub vbs_errored: u64,
    pub vbs_rollback: u64,
}

impl FeedStats {
    pub fn counter(&self, state: &crate::vbstate::VbState) -> &AtomicU64 {
        use crate::vbstate::VbState;
        match state {
            VbState::Idle => &self.vbs_idle,
            VbState::Requested => &self.vbs_requested,
            VbState::Active { .. } => &self.vbs_active,
            VbState::Ended => &self.vbs_ended,
            VbState::Errored => &self.vbs_errored,
            VbState::Rollback { .. } => &self.vbs_rollback,
        }
    }

    pub fn record_transition(
        &self,
        from: Option<&crate::vbstate::VbState>,
        to: &crate::vbstate::VbState,
    ) {
        if let Some(from) = from {
            self.counter(from).fetch_sub(1, Ordering::Relaxed);
        }
        self.counter(to).fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FeedStatsSnapshot {
        FeedStatsSnapshot {
            vbs_idle: self.vbs_idle.load(Ordering::Relaxed),
            vbs_requested: self.vbs_requested.load(Ordering::Relaxed),
            vbs_active: self.vbs_active.load(Ordering::Relaxed),
            vbs_ended: self.vbs_ended.load(Ordering::Relaxed),
            vbs_errored: self.vbs_errored.load(Ordering::Relaxed),
            vbs_rollback: self.vbs_rollback.load(Ordering::Relaxed),
        }
    }
}
