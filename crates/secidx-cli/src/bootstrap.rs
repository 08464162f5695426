//! Placeholder external collaborators the real admin RPC server shell
//! and DCP client would supply (spec.md §1 lists both as out of scope).
//! They let this process wire a [`secidx_projector::Projector`] end to
//! end without a real cluster transport, matching SPEC_FULL.md §2.4
//! ("does not implement clustering transport").

use std::sync::Arc;

use async_trait::async_trait;

use secidx_feed::{DcpOutcome, DcpStreamOpener, FailoverLogLookup, SeqnoSourceFactory};
use secidx_types::{Bucket, FailoverLog, Vbno};
use secidx_wire::VbRestartPoint;

/// Reports no failover history for any VB. A real deployment looks this
/// up in the storage engine; until that collaborator is wired in,
/// restart-point validation is simply skipped rather than fabricated.
pub struct NoFailoverHistory;

#[async_trait]
impl FailoverLogLookup for NoFailoverHistory {
    async fn lookup(&self, _bucket: &Bucket, _vb: Vbno) -> Option<FailoverLog> {
        None
    }
}

/// Always refuses to open a DCP stream. There is no DCP client in this
/// core (spec.md §1); a real process links one in here.
pub struct NoDcpClient;

#[async_trait]
impl DcpStreamOpener for NoDcpClient {
    async fn open_stream(&self, _bucket: &Bucket, _point: VbRestartPoint) -> Result<DcpOutcome, String> {
        Err("no dcp client wired into this process".to_string())
    }
}

/// Reports no storage nodes for any bucket. The real implementation
/// resolves a bucket's vbucket map into one `NodeSeqnoSource` per node
/// (spec.md §1); until that's wired in, seqno observation at stream
/// start-up is simply skipped.
pub struct NoSeqnoSources;

impl SeqnoSourceFactory for NoSeqnoSources {
    fn nodes_for(&self, _bucket: &Bucket) -> Vec<Arc<dyn secidx_seqno::NodeSeqnoSource>> {
        Vec::new()
    }
}
