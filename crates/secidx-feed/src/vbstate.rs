/// Per-VB lifecycle within one feed (spec.md §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VbState {
    Idle,
    Requested,
    Active { vbuuid: u64, seqno: u64 },
    Ended,
    Errored,
    /// Carries the `(vbuuid, seqno)` lower bound the caller must resume
    /// from after a rollback.
    Rollback { vbuuid: u64, seqno: u64 },
}

impl VbState {
    pub fn is_terminal_for_restart(self) -> bool {
        matches!(self, VbState::Ended | VbState::Errored | VbState::Rollback { .. })
    }
}
