//! # secidx-seqno: per-bucket sequence-number aggregation reader
//!
//! One [`reader::ReaderHandle`] per bucket fans a `GetSeqnos`/`GetMinSeqnos`
//! request out to every storage node hosting that bucket's VBs, merges the
//! per-VB results, and coalesces concurrent callers sharing a collection id
//! onto a single in-flight fetch.

mod cid;
mod compat;
mod config;
mod error;
mod merge;
mod reader;
mod registry;
mod source;
mod worker;

pub use cid::Cid;
pub use compat::ClusterCompat;
pub use config::ReaderConfig;
pub use error::{Error, Result};
pub use reader::{spawn, ReaderHandle};
pub use registry::SeqnoReaderRegistry;
pub use source::NodeSeqnoSource;

#[cfg(any(test, feature = "test-support"))]
pub use source::test_support;
