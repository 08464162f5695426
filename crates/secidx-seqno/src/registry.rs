use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use secidx_types::Bucket;

use crate::config::ReaderConfig;
use crate::reader::{spawn, ReaderHandle};
use crate::source::NodeSeqnoSource;

/// Bucket-keyed registry of running readers (spec.md §4.D: "one reader
/// actor per bucket"). Lazily spawns a reader on first use; a caller
/// that observes a bucket's reader has gone error-tainted should
/// `close` it so the next `get_or_create` spawns a fresh one.
pub struct SeqnoReaderRegistry {
    readers: RwLock<HashMap<Bucket, ReaderHandle>>,
}

impl SeqnoReaderRegistry {
    pub fn new() -> Self {
        Self { readers: RwLock::new(HashMap::new()) }
    }

    /// Returns the reader for `bucket`, spawning one via `nodes` and
    /// `config` if this is the first request seen for it.
    pub async fn get_or_create(
        &self,
        bucket: &Bucket,
        nodes: impl FnOnce() -> Vec<Arc<dyn NodeSeqnoSource>>,
        config: ReaderConfig,
    ) -> ReaderHandle {
        if let Some(handle) = self.readers.read().await.get(bucket) {
            return handle.clone();
        }
        let mut readers = self.readers.write().await;
        if let Some(handle) = readers.get(bucket) {
            return handle.clone();
        }
        let handle = spawn(nodes(), config);
        readers.insert(bucket.clone(), handle.clone());
        handle
    }

    /// Tears down and removes `bucket`'s reader, if one is running.
    pub async fn close(&self, bucket: &Bucket) {
        if let Some(handle) = self.readers.write().await.remove(bucket) {
            handle.close().await;
            debug!(%bucket, "closed seqno reader");
        }
    }

    pub async fn bucket_count(&self) -> usize {
        self.readers.read().await.len()
    }
}

impl Default for SeqnoReaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_support::FakeNode;

    fn nodes() -> Vec<Arc<dyn NodeSeqnoSource>> {
        vec![Arc::new(FakeNode::new(vec![(0, 1)]))]
    }

    #[tokio::test]
    async fn get_or_create_reuses_the_reader_for_the_same_bucket() {
        let registry = SeqnoReaderRegistry::new();
        let bucket = Bucket::new("b1");
        registry.get_or_create(&bucket, nodes, ReaderConfig::new(1, 1)).await;
        assert_eq!(registry.bucket_count().await, 1);
        registry.get_or_create(&bucket, nodes, ReaderConfig::new(1, 1)).await;
        assert_eq!(registry.bucket_count().await, 1);
    }

    #[tokio::test]
    async fn close_removes_the_bucket_so_the_next_call_spawns_fresh() {
        let registry = SeqnoReaderRegistry::new();
        let bucket = Bucket::new("b1");
        registry.get_or_create(&bucket, nodes, ReaderConfig::new(1, 1)).await;
        registry.close(&bucket).await;
        assert_eq!(registry.bucket_count().await, 0);
    }
}
