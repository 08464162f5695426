use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, instrument};

use secidx_config::{ConfigUpdate, SecIdxConfig};
use secidx_wire::message::{
    AddBucketsRequest, AddInstancesRequest, DelBucketsRequest, DelInstancesRequest,
    MutationTopicRequest, RepairEndpointsRequest, RestartVbucketsRequest, ShutdownTopicRequest,
    ShutdownVbucketsRequest, TopicResponse,
};

use crate::error::Result;
use crate::registry::FeedRegistry;

/// Delay between a topic's `shutdown_topic` completing and its [`Feed`]
/// being dropped from the registry (spec.md §4.F "reclaim scheduling").
/// Kept short and fixed rather than configurable: nothing in the
/// recognized config surface (spec.md §9) names this knob.
const RECLAIM_DELAY: Duration = Duration::from_secs(5);

/// Binds the feed registry to the admin surface: decodes nothing itself
/// (that is [`crate::handlers`]'s job) but owns the live configuration
/// and schedules reclaim after a topic shuts down.
pub struct Projector {
    registry: Arc<FeedRegistry>,
    config: RwLock<SecIdxConfig>,
}

impl Projector {
    pub fn new(registry: Arc<FeedRegistry>, config: SecIdxConfig) -> Self {
        Self { registry, config: RwLock::new(config) }
    }

    pub async fn config(&self) -> SecIdxConfig {
        self.config.read().await.clone()
    }

    /// Applies a live configuration update (spec.md §4.F). The transport
    /// that delivers it is external; this only merges the present
    /// fields into the held configuration.
    #[instrument(skip(self, update))]
    pub async fn apply_config_update(&self, update: ConfigUpdate) {
        let mut config = self.config.write().await;
        if let Some(size) = update.buffer_size {
            config.buffer_size = size;
        }
        if let Some(timeout) = update.buffer_timeout_ms {
            config.buffer_timeout_ms = timeout;
        }
        if let Some(timeout) = update.harakiri_timeout_ms {
            config.harakiri_timeout_ms = timeout;
        }
        info!("applied live configuration update");
    }

    pub async fn mutation_topic(&self, request: MutationTopicRequest) -> Result<TopicResponse> {
        let feed = self.registry.get_or_create(&request.topic).await;
        Ok(feed.mutation_topic(request).await?)
    }

    pub async fn restart_vbuckets(&self, request: RestartVbucketsRequest) -> Result<TopicResponse> {
        let feed = self.registry.get(&request.topic).await?;
        Ok(feed.restart_vbuckets(request).await?)
    }

    pub async fn shutdown_vbuckets(&self, request: ShutdownVbucketsRequest) -> Result<()> {
        let feed = self.registry.get(&request.topic).await?;
        Ok(feed.shutdown_vbuckets(request).await?)
    }

    pub async fn add_buckets(&self, request: AddBucketsRequest) -> Result<()> {
        let feed = self.registry.get(&request.topic).await?;
        Ok(feed.add_buckets(request).await?)
    }

    pub async fn del_buckets(&self, request: DelBucketsRequest) -> Result<()> {
        let feed = self.registry.get(&request.topic).await?;
        Ok(feed.del_buckets(request).await?)
    }

    pub async fn add_instances(&self, request: AddInstancesRequest) -> Result<()> {
        let feed = self.registry.get(&request.topic).await?;
        Ok(feed.add_instances(request).await?)
    }

    pub async fn del_instances(&self, request: DelInstancesRequest) -> Result<()> {
        let feed = self.registry.get(&request.topic).await?;
        Ok(feed.del_instances(request).await?)
    }

    pub async fn repair_endpoints(&self, request: RepairEndpointsRequest) -> Result<()> {
        let feed = self.registry.get(&request.topic).await?;
        Ok(feed.repair_endpoints(request).await?)
    }

    /// Shuts the topic's feed down and schedules its removal from the
    /// registry after [`RECLAIM_DELAY`], rather than reclaiming it
    /// inline: a straggling in-flight admin call for the same topic
    /// should still find the feed (now closed, returning errors on any
    /// further mutation) instead of racing a fresh one into existence.
    #[instrument(skip(self, request), fields(topic = %request.topic))]
    pub async fn shutdown_topic(&self, request: ShutdownTopicRequest) -> Result<()> {
        let topic = request.topic.clone();
        let feed = self.registry.get(&topic).await?;
        feed.shutdown_topic(request).await?;

        let registry = self.registry.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RECLAIM_DELAY).await;
            registry.reclaim(&topic).await;
        });
        Ok(())
    }
}
