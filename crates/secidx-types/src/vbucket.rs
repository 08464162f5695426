use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Tenant namespace identifier (a "bucket" in the source database).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Bucket(String);

impl Bucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Virtual-bucket (partition) ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Vbno(pub u16);

impl Display for Vbno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for one failover branch of a VB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VbUuid(pub u64);

/// Ordered sequence of `(vbuuid, high_seqno)` pairs for one VB.
///
/// [`FailoverLog::latest`] returns the head (most recent branch);
/// [`FailoverLog::lowest_vbuuid_for_seqno`] finds the branch whose
/// `high_seqno` is the smallest value still `>= seqno`, used to validate
/// a restart request's `(vbuuid, seqno)` lower bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailoverLog {
    /// Ordered newest-first: `entries[0]` is the current branch.
    entries: Vec<(VbUuid, u64)>,
}

impl FailoverLog {
    pub fn new(entries: Vec<(VbUuid, u64)>) -> Self {
        Self { entries }
    }

    /// The current (most recent) branch, if any history exists.
    pub fn latest(&self) -> Option<(VbUuid, u64)> {
        self.entries.first().copied()
    }

    /// Whether `vbuuid` is a known branch of this VB's history.
    pub fn contains(&self, vbuuid: VbUuid) -> bool {
        self.entries.iter().any(|(v, _)| *v == vbuuid)
    }

    /// The branch with the lowest `high_seqno` that is still `>= seqno`,
    /// used to find a safe resume point after a rollback.
    pub fn lowest_vbuuid_for_seqno(&self, seqno: u64) -> Option<(VbUuid, u64)> {
        self.entries
            .iter()
            .filter(|(_, high)| *high >= seqno)
            .min_by_key(|(_, high)| *high)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_is_head_of_history() {
        let log = FailoverLog::new(vec![(VbUuid(3), 100), (VbUuid(2), 50), (VbUuid(1), 10)]);
        assert_eq!(log.latest(), Some((VbUuid(3), 100)));
    }

    #[test]
    fn contains_checks_known_branches() {
        let log = FailoverLog::new(vec![(VbUuid(3), 100), (VbUuid(2), 50)]);
        assert!(log.contains(VbUuid(2)));
        assert!(!log.contains(VbUuid(99)));
    }

    #[test]
    fn lowest_vbuuid_for_seqno_finds_safe_branch() {
        let log = FailoverLog::new(vec![(VbUuid(3), 100), (VbUuid(2), 50), (VbUuid(1), 10)]);
        assert_eq!(log.lowest_vbuuid_for_seqno(40), Some((VbUuid(2), 50)));
        assert_eq!(log.lowest_vbuuid_for_seqno(200), None);
    }
}
