//! # secidx-feed: per-topic DCP control-plane state machine
//!
//! Implements spec.md §4.E: one [`Feed`] tracks the bucket/instance
//! schema of a single ingestion topic and the lifecycle of every VB it
//! streams (`Idle -> Requested -> Active | Ended | Errored | Rollback`).
//! The upstream DCP client, the failover-log store, and the
//! per-bucket storage nodes backing sequence-number reads are out of
//! scope (spec.md §1); this crate only depends on narrow trait objects
//! ([`FailoverLogLookup`], [`DcpStreamOpener`], [`SeqnoSourceFactory`])
//! a caller supplies.

mod error;
mod feed;
mod source;
mod stats;
mod vbstate;

pub use error::{Error, Result};
pub use feed::Feed;
pub use source::{DcpOutcome, DcpStreamOpener, FailoverLogLookup, SeqnoSourceFactory};
pub use stats::{FeedStats, FeedStatsSnapshot};
pub use vbstate::VbState;

#[cfg(any(test, feature = "test-support"))]
pub use source::test_support;
