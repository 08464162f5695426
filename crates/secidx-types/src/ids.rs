use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Globally unique identifier for an index definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DefnId(u64);

impl DefnId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl From<u64> for DefnId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<DefnId> for u64 {
    fn from(id: DefnId) -> Self {
        id.0
    }
}

impl Display for DefnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a single materialized instance of an [`DefnId`].
///
/// Distinct from `DefnId` because a definition may be replicated: each
/// replica of the same definition is a separate `InstId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstId(u64);

impl InstId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl From<u64> for InstId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<InstId> for u64 {
    fn from(id: InstId) -> Self {
        id.0
    }
}

impl Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Replica ordinal within `[0, NumReplica]` for a given [`DefnId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReplicaId(pub u32);

impl Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Partition ordinal for a partitioned index; `0` for non-partitioned indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct PartnId(pub u32);

impl Display for PartnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name identifying a long-lived ingestion subscription (a "topic").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TopicId(String);

impl TopicId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic 16-bit correlation id stamping every outbound operation of
/// one topic's epoch. A response whose opaque does not match the topic's
/// current value is discarded by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Opaque(u16);

impl Opaque {
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Returns the next opaque in sequence, wrapping at `u16::MAX`.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl Default for Opaque {
    fn default() -> Self {
        Self(0)
    }
}

impl From<Opaque> for u16 {
    fn from(value: Opaque) -> Self {
        value.0
    }
}

impl Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_wraps() {
        let o = Opaque::new(u16::MAX);
        assert_eq!(o.next(), Opaque::new(0));
    }

    #[test]
    fn defn_id_roundtrips_through_u64() {
        let id = DefnId::from(42u64);
        assert_eq!(u64::from(id), 42);
    }
}
