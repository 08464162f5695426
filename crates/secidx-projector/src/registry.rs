use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, instrument};

use secidx_feed::{DcpStreamOpener, FailoverLogLookup, Feed, SeqnoSourceFactory};
use secidx_seqno::{ClusterCompat, SeqnoReaderRegistry};
use secidx_types::TopicId;

use crate::error::{Error, Result};

/// Cluster minimum-compat version past which default-collection seqno
/// queries switch to the collection-aware protocol (spec.md §4.D). Not
/// part of the recognized config surface (spec.md §9); fixed here as
/// the watcher that would observe it is external (spec.md §1).
const COLLECTION_AWARE_COMPAT_THRESHOLD: u32 = 70;

/// `topic -> Feed` registry guarded by a single reader/writer lock
/// (spec.md §5: "the topic-to-feed map is guarded by a reader/writer
/// lock"). Lookups for an existing feed take the read half; only
/// creation and reclaim take the write half.
pub struct FeedRegistry {
    feeds: RwLock<HashMap<TopicId, Arc<Feed>>>,
    failover: Arc<dyn FailoverLogLookup>,
    dcp: Arc<dyn DcpStreamOpener>,
    stream_deadline: Duration,
    seqno_registry: Arc<SeqnoReaderRegistry>,
    seqno_sources: Arc<dyn SeqnoSourceFactory>,
    seqno_compat: Arc<ClusterCompat>,
}

impl FeedRegistry {
    pub fn new(
        failover: Arc<dyn FailoverLogLookup>,
        dcp: Arc<dyn DcpStreamOpener>,
        stream_deadline: Duration,
        seqno_sources: Arc<dyn SeqnoSourceFactory>,
    ) -> Self {
        Self {
            feeds: RwLock::new(HashMap::new()),
            failover,
            dcp,
            stream_deadline,
            seqno_registry: Arc::new(SeqnoReaderRegistry::new()),
            seqno_sources,
            seqno_compat: Arc::new(ClusterCompat::new(COLLECTION_AWARE_COMPAT_THRESHOLD)),
        }
    }

    /// Returns the feed for `topic`, creating it if this is the first
    /// request seen for that topic.
    #[instrument(skip(self), fields(topic = %topic))]
    pub async fn get_or_create(&self, topic: &TopicId) -> Arc<Feed> {
        if let Some(feed) = self.feeds.read().await.get(topic) {
            return feed.clone();
        }
        let mut feeds = self.feeds.write().await;
        feeds
            .entry(topic.clone())
            .or_insert_with(|| {
                Arc::new(Feed::new(
                    topic.clone(),
                    self.failover.clone(),
                    self.dcp.clone(),
                    self.stream_deadline,
                    self.seqno_registry.clone(),
                    self.seqno_sources.clone(),
                    self.seqno_compat.clone(),
                ))
            })
            .clone()
    }

    pub async fn get(&self, topic: &TopicId) -> Result<Arc<Feed>> {
        self.feeds.read().await.get(topic).cloned().ok_or_else(|| Error::FeedNotFound(topic.clone()))
    }

    /// Records a freshly observed cluster minimum-compat version
    /// (spec.md §4.D). The watcher that polls `/poolsStreaming/default`
    /// is external (spec.md §1); this only applies what it reports.
    pub fn observe_cluster_compat(&self, version: u32) {
        self.seqno_compat.observe(version);
    }

    /// Removes `topic` from the registry immediately. Used by reclaim
    /// scheduling after a feed has been shut down.
    #[instrument(skip(self), fields(topic = %topic))]
    pub async fn reclaim(&self, topic: &TopicId) {
        if self.feeds.write().await.remove(topic).is_some() {
            debug!("reclaimed feed");
        }
    }

    pub async fn topic_count(&self) -> usize {
        self.feeds.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secidx_feed::test_support::{FakeDcp, FakeFailoverLogs, FakeSeqnoSources};

    use super::*;

    fn registry() -> FeedRegistry {
        FeedRegistry::new(
            Arc::new(FakeFailoverLogs::default()),
            Arc::new(FakeDcp::active(1, 1)),
            Duration::from_secs(1),
            Arc::new(FakeSeqnoSources::empty()),
        )
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent_per_topic() {
        let registry = registry();
        let topic = TopicId::new("t1");
        let a = registry.get_or_create(&topic).await;
        let b = registry.get_or_create(&topic).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.topic_count().await, 1);
    }

    #[tokio::test]
    async fn reclaim_removes_the_feed() {
        let registry = registry();
        let topic = TopicId::new("t1");
        registry.get_or_create(&topic).await;
        registry.reclaim(&topic).await;
        assert_eq!(registry.topic_count().await, 0);
        assert!(registry.get(&topic).await.is_err());
    }
}
