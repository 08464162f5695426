use std::sync::Arc;

use async_trait::async_trait;

use secidx_types::{Bucket, FailoverLog, Vbno};
use secidx_wire::VbRestartPoint;

/// Resolves a bucket/VB's failover history, used to validate a restart
/// point's `vbuuid` before opening a DCP stream. The real implementation
/// queries the storage engine; out of scope here.
#[async_trait]
pub trait FailoverLogLookup: Send + Sync {
    async fn lookup(&self, bucket: &Bucket, vb: Vbno) -> Option<FailoverLog>;
}

/// Outcome of attempting to open one upstream DCP stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DcpOutcome {
    /// `StreamBegin` arrived with the branch active at `(vbuuid, seqno)`.
    Active { vbuuid: u64, seqno: u64 },
    /// The storage node rejected the requested `(vbuuid, seqno)` and
    /// proposed resuming from this lower bound instead.
    Rollback { vbuuid: u64, seqno: u64 },
}

/// Opens one upstream DCP stream for a `(bucket, vb)` pair. The real
/// implementation is a DCP client; out of scope here.
#[async_trait]
pub trait DcpStreamOpener: Send + Sync {
    async fn open_stream(
        &self,
        bucket: &Bucket,
        point: VbRestartPoint,
    ) -> std::result::Result<DcpOutcome, String>;
}

/// Supplies the per-node seqno sources backing a bucket's
/// sequence-number reader (spec.md §4.D, §4.E "(D) used by ... (E)
/// during stream start-up"). The real implementation builds one
/// `NodeSeqnoSource` per storage node hosting the bucket; out of scope
/// here.
pub trait SeqnoSourceFactory: Send + Sync {
    fn nodes_for(&self, bucket: &Bucket) -> Vec<Arc<dyn secidx_seqno::NodeSeqnoSource>>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    #[derive(Default)]
    pub struct FakeFailoverLogs {
        logs: Mutex<HashMap<(Bucket, Vbno), FailoverLog>>,
    }

    impl FakeFailoverLogs {
        pub fn insert(&self, bucket: Bucket, vb: Vbno, log: FailoverLog) {
            self.logs.lock().unwrap().insert((bucket, vb), log);
        }
    }

    #[async_trait]
    impl FailoverLogLookup for FakeFailoverLogs {
        async fn lookup(&self, bucket: &Bucket, vb: Vbno) -> Option<FailoverLog> {
            self.logs.lock().unwrap().get(&(bucket.clone(), vb)).cloned()
        }
    }

    pub struct FakeDcp {
        pub outcome: DcpOutcome,
        pub fail: bool,
        pub delay: Option<Duration>,
    }

    impl FakeDcp {
        pub fn active(vbuuid: u64, seqno: u64) -> Self {
            Self {
                outcome: DcpOutcome::Active { vbuuid, seqno },
                fail: false,
                delay: None,
            }
        }

        pub fn rollback_to(vbuuid: u64, seqno: u64) -> Self {
            Self {
                outcome: DcpOutcome::Rollback { vbuuid, seqno },
                fail: false,
                delay: None,
            }
        }

        pub fn slow(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl DcpStreamOpener for FakeDcp {
        async fn open_stream(
            &self,
            _bucket: &Bucket,
            _point: VbRestartPoint,
        ) -> std::result::Result<DcpOutcome, String> {
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            if self.fail {
                return Err("simulated dcp failure".to_string());
            }
            Ok(self.outcome)
        }
    }

    /// A `SeqnoSourceFactory` backed by a single canned node, or none at
    /// all when a bucket has no storage nodes to fan out to.
    pub struct FakeSeqnoSources {
        entries: Vec<(u16, u64)>,
    }

    impl FakeSeqnoSources {
        pub fn empty() -> Self {
            Self { entries: vec![] }
        }

        pub fn with_entries(entries: Vec<(u16, u64)>) -> Self {
            Self { entries }
        }
    }

    impl SeqnoSourceFactory for FakeSeqnoSources {
        fn nodes_for(&self, _bucket: &Bucket) -> Vec<Arc<dyn secidx_seqno::NodeSeqnoSource>> {
            if self.entries.is_empty() {
                return Vec::new();
            }
            vec![Arc::new(secidx_seqno::test_support::FakeNode::new(self.entries.clone()))]
        }
    }
}
