//! # secidx-types: core types for the secondary-index cluster
//!
//! Shared types used across the projector, endpoint, sequence-number
//! reader and placement planner:
//!
//! - Topic/bucket identity ([`TopicId`], [`Bucket`], [`Vbno`], [`Opaque`])
//! - Failover branches ([`VbUuid`], [`FailoverLog`])
//! - Index identity ([`DefnId`], [`InstId`], [`ReplicaId`], [`PartnId`])
//! - Index lifecycle ([`IndexState`], [`IndexDefn`], [`IndexInstance`])
//! - Mutation events ([`KeyVersion`], [`Command`])
//! - Placement model ([`IndexerNode`], [`ServerGroup`], [`SubCluster`])

mod ids;
mod index;
mod keyversion;
mod placement;
mod vbucket;

pub use ids::{DefnId, InstId, Opaque, PartnId, ReplicaId, TopicId};
pub use index::{IndexDefn, IndexInstance, IndexState, SizingHints};
pub use keyversion::{Command, KeyVersion, Projection};
pub use placement::{IndexerNode, IndexUsage, NodeId, NodeUuid, ServerGroup, SubCluster};
pub use vbucket::{Bucket, FailoverLog, Vbno, VbUuid};
