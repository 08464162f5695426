use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use secidx_seqno::{ClusterCompat, ReaderConfig, SeqnoReaderRegistry};
use secidx_types::{Bucket, FailoverLog, InstId, Opaque, TopicId, VbUuid, Vbno};
use secidx_wire::message::{
    AddBucketsRequest, AddInstancesRequest, DelBucketsRequest, DelInstancesRequest,
    MutationTopicRequest, RepairEndpointsRequest, RestartVbucketsRequest, ShutdownTopicRequest,
    ShutdownVbucketsRequest, TopicResponse,
};
use secidx_wire::VbRestartPoint;

use crate::error::{Error, Result};
use crate::source::{DcpOutcome, DcpStreamOpener, FailoverLogLookup, SeqnoSourceFactory};
use crate::stats::{FeedStats, FeedStatsSnapshot};
use crate::vbstate::VbState;

/// Worker count handed to every per-bucket seqno reader this feed
/// spawns. Not part of the recognized config surface (spec.md §9);
/// fixed at the spec's example worker count.
const SEQNO_READER_WORKERS: usize = 10;

fn validate_endpoints(endpoints: &[String]) -> Result<()> {
    if endpoints.iter().any(|e| !e.contains(':')) {
        return Err(Error::InvalidKVaddrs);
    }
    Ok(())
}

struct FeedState {
    schema_established: bool,
    buckets: HashSet<Bucket>,
    instances: HashSet<InstId>,
    endpoints: HashSet<String>,
    vb_states: HashMap<(Bucket, Vbno), VbState>,
    opaque: Opaque,
    closed: bool,
}

impl FeedState {
    fn new() -> Self {
        Self {
            schema_established: false,
            buckets: HashSet::new(),
            instances: HashSet::new(),
            endpoints: HashSet::new(),
            vb_states: HashMap::new(),
            opaque: Opaque::default(),
            closed: false,
        }
    }

    fn set_vb_state(&mut self, stats: &FeedStats, key: (Bucket, Vbno), to: VbState) {
        let from = self.vb_states.insert(key, to);
        stats.record_transition(from.as_ref(), &to);
    }

    fn remove_vb(&mut self, stats: &FeedStats, key: &(Bucket, Vbno)) {
        if let Some(prev) = self.vb_states.remove(key) {
            stats.counter(&prev).fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
        }
    }
}

/// Per-topic DCP control-plane state machine (spec.md §4.E).
///
/// Serializes every mutating operation behind an internal mutex, which
/// is the concrete realization of "operations are serialized through a
/// per-topic mutex" -- the projector owns one `Feed` per topic and never
/// needs a lock of its own around it.
pub struct Feed {
    topic: TopicId,
    state: Mutex<FeedState>,
    stats: Arc<FeedStats>,
    failover: Arc<dyn FailoverLogLookup>,
    dcp: Arc<dyn DcpStreamOpener>,
    stream_deadline: Duration,
    seqno_registry: Arc<SeqnoReaderRegistry>,
    seqno_sources: Arc<dyn SeqnoSourceFactory>,
    seqno_compat: Arc<ClusterCompat>,
}

impl Feed {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        topic: TopicId,
        failover: Arc<dyn FailoverLogLookup>,
        dcp: Arc<dyn DcpStreamOpener>,
        stream_deadline: Duration,
        seqno_registry: Arc<SeqnoReaderRegistry>,
        seqno_sources: Arc<dyn SeqnoSourceFactory>,
        seqno_compat: Arc<ClusterCompat>,
    ) -> Self {
        Self {
            topic,
            state: Mutex::new(FeedState::new()),
            stats: Arc::new(FeedStats::default()),
            failover,
            dcp,
            stream_deadline,
            seqno_registry,
            seqno_sources,
            seqno_compat,
        }
    }

    /// Returns the bucket's current high-seqnos via its
    /// sequence-number reader (spec.md §4.D), as consulted by
    /// session-consistent scans. `vb_count` is the caller's expected VB
    /// count for the bucket; a short aggregate fails with
    /// `IncompleteSeqnos`.
    pub async fn current_seqnos(&self, bucket: &Bucket, vb_count: usize) -> secidx_seqno::Result<Vec<(Vbno, u64)>> {
        let reader = self
            .seqno_registry
            .get_or_create(bucket, || self.seqno_sources.nodes_for(bucket), ReaderConfig::new(SEQNO_READER_WORKERS, vb_count))
            .await;
        reader.get(self.seqno_compat.default_collection_cid()).await
    }

    /// Best-effort read of a bucket's current high-seqnos at stream
    /// start-up (spec.md §2: "(D) used by ... (E) during stream
    /// start-up"). The reader is a catch-up/observability aid here, not
    /// part of `MutationTopic`'s error contract, so a reader failure is
    /// logged and does not fail the open.
    async fn observe_bucket_seqnos(&self, bucket: &Bucket, vb_count: usize) {
        match self.current_seqnos(bucket, vb_count).await {
            Ok(seqnos) => debug!(%bucket, observed = seqnos.len(), "observed current high-seqnos at stream start-up"),
            Err(err) => warn!(%bucket, error = %err, "seqno reader unavailable at stream start-up"),
        }
    }

    pub fn topic(&self) -> &TopicId {
        &self.topic
    }

    pub fn stats(&self) -> FeedStatsSnapshot {
        self.stats.snapshot()
    }

    /// Opens a DCP stream for one `(bucket, point)`, validating the
    /// restart point's vbuuid against the failover log when one is on
    /// record, and resolving the outcome into a VB state transition.
    async fn open_one(
        &self,
        state: &mut FeedState,
        bucket: &Bucket,
        point: VbRestartPoint,
    ) -> Result<VbRestartPoint> {
        let key = (bucket.clone(), point.vb);
        state.set_vb_state(&self.stats, key.clone(), VbState::Requested);

        if let Some(log) = self.failover.lookup(bucket, point.vb).await {
            if !log.contains(VbUuid(point.vbuuid)) {
                state.set_vb_state(&self.stats, key, VbState::Errored);
                return Err(Error::InvalidVbucketBranch(point.vb.0));
            }
        }

        let opened = tokio::time::timeout(
            self.stream_deadline,
            self.dcp.open_stream(bucket, point),
        )
        .await;

        match opened {
            Err(_elapsed) => {
                state.set_vb_state(&self.stats, key, VbState::Errored);
                Err(Error::ResponseTimeout(point.vb.0))
            }
            Ok(Err(msg)) => {
                state.set_vb_state(&self.stats, key, VbState::Errored);
                Err(Error::DcpError(point.vb.0, msg))
            }
            Ok(Ok(DcpOutcome::Active { vbuuid, seqno })) => {
                state.set_vb_state(&self.stats, key, VbState::Active { vbuuid, seqno });
                Ok(VbRestartPoint { vb: point.vb, vbuuid, seqno })
            }
            Ok(Ok(DcpOutcome::Rollback { vbuuid, seqno })) => {
                state.set_vb_state(&self.stats, key, VbState::Rollback { vbuuid, seqno });
                Ok(VbRestartPoint { vb: point.vb, vbuuid, seqno })
            }
        }
    }

    #[instrument(skip_all, fields(topic = %self.topic))]
    pub async fn mutation_topic(&self, request: MutationTopicRequest) -> Result<TopicResponse> {
        validate_endpoints(&request.endpoints)?;
        if request.restart_points.is_empty() {
            return Err(Error::InconsistentFeed);
        }
        let buckets: HashSet<Bucket> = request.buckets.iter().map(|b| Bucket::new(b.clone())).collect();

        let mut state = self.state.lock().await;
        if state.schema_established && state.buckets != buckets {
            return Err(Error::InconsistentFeed);
        }
        state.buckets = buckets.clone();
        state.schema_established = true;
        state.endpoints.extend(request.endpoints.iter().cloned());
        state.opaque = request.opaque;

        for bucket in &buckets {
            self.observe_bucket_seqnos(bucket, request.restart_points.len()).await;
        }

        let mut active = Vec::with_capacity(buckets.len() * request.restart_points.len());
        for bucket in &buckets {
            for point in &request.restart_points {
                let resolved = self.open_one(&mut state, bucket, *point).await?;
                active.push(resolved);
            }
        }

        Ok(TopicResponse { topic: self.topic.clone(), opaque: request.opaque, active })
    }

    #[instrument(skip_all, fields(topic = %self.topic))]
    pub async fn restart_vbuckets(&self, request: RestartVbucketsRequest) -> Result<TopicResponse> {
        let mut state = self.state.lock().await;
        if !state.schema_established {
            return Err(Error::TopicMissing);
        }
        state.opaque = request.opaque;

        let mut active = Vec::with_capacity(request.restart_points.len());
        for point in &request.restart_points {
            let bucket = state
                .vb_states
                .keys()
                .find(|(_, vb)| *vb == point.vb)
                .map(|(b, _)| b.clone())
                .ok_or(Error::InvalidBucket)?;
            let resolved = self.open_one(&mut state, &bucket, *point).await?;
            active.push(resolved);
        }

        Ok(TopicResponse { topic: self.topic.clone(), opaque: request.opaque, active })
    }

    #[instrument(skip_all, fields(topic = %self.topic))]
    pub async fn shutdown_vbuckets(&self, request: ShutdownVbucketsRequest) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.schema_established {
            return Err(Error::TopicMissing);
        }
        let keys: Vec<(Bucket, Vbno)> = state
            .vb_states
            .keys()
            .filter(|(_, vb)| request.vbs.contains(vb))
            .cloned()
            .collect();
        for key in keys {
            state.set_vb_state(&self.stats, key, VbState::Ended);
        }
        Ok(())
    }

    #[instrument(skip_all, fields(topic = %self.topic))]
    pub async fn add_buckets(&self, request: AddBucketsRequest) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.schema_established {
            return Err(Error::TopicMissing);
        }
        for name in &request.buckets {
            let bucket = Bucket::new(name.clone());
            if state.buckets.contains(&bucket) {
                continue;
            }
            state.buckets.insert(bucket.clone());
            for point in &request.restart_points {
                self.open_one(&mut state, &bucket, *point).await?;
            }
        }
        Ok(())
    }

    #[instrument(skip_all, fields(topic = %self.topic))]
    pub async fn del_buckets(&self, request: DelBucketsRequest) -> Result<()> {
        let mut state = self.state.lock().await;
        for name in &request.buckets {
            let bucket = Bucket::new(name.clone());
            if !state.buckets.remove(&bucket) {
                continue;
            }
            let keys: Vec<(Bucket, Vbno)> = state
                .vb_states
                .keys()
                .filter(|(b, _)| *b == bucket)
                .cloned()
                .collect();
            for key in keys {
                state.remove_vb(&self.stats, &key);
            }
        }
        Ok(())
    }

    #[instrument(skip_all, fields(topic = %self.topic))]
    pub async fn add_instances(&self, request: AddInstancesRequest) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.schema_established {
            return Err(Error::TopicMissing);
        }
        for id in request.inst_ids {
            state.instances.insert(InstId::new(id));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(topic = %self.topic))]
    pub async fn del_instances(&self, request: DelInstancesRequest) -> Result<()> {
        let mut state = self.state.lock().await;
        for id in request.inst_ids {
            state.instances.remove(&InstId::new(id));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(topic = %self.topic))]
    pub async fn repair_endpoints(&self, request: RepairEndpointsRequest) -> Result<()> {
        validate_endpoints(&request.endpoints)?;
        let mut state = self.state.lock().await;
        if !state.schema_established {
            return Err(Error::TopicMissing);
        }
        state.endpoints = request.endpoints.into_iter().collect();
        Ok(())
    }

    #[instrument(skip_all, fields(topic = %self.topic))]
    pub async fn shutdown_topic(&self, _request: ShutdownTopicRequest) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(());
        }
        let keys: Vec<(Bucket, Vbno)> = state.vb_states.keys().cloned().collect();
        for key in keys {
            state.set_vb_state(&self.stats, key, VbState::Ended);
        }
        state.buckets.clear();
        state.instances.clear();
        state.endpoints.clear();
        state.closed = true;
        warn!("feed shut down");
        Ok(())
    }
}
