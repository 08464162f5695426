use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::error;

use secidx_admin::AdminHandler;
use secidx_wire::message::{
    AddBucketsRequest, AddInstancesRequest, DelBucketsRequest, DelInstancesRequest,
    MutationTopicRequest, RepairEndpointsRequest, RestartVbucketsRequest, ShutdownTopicRequest,
    ShutdownVbucketsRequest,
};

use crate::projector::Projector;

fn decode<T: serde::de::DeserializeOwned>(body: &Bytes) -> secidx_admin::Result<T> {
    serde_json::from_slice(body).map_err(|e| secidx_admin::Error::DecodeRequest(e.to_string()))
}

fn encode<T: serde::Serialize>(value: &T) -> secidx_admin::Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| secidx_admin::Error::EncodeResponse(e.to_string()))
}

/// Lifts an operational projector/feed error to the generic handler
/// boundary. Known semantic faults (spec.md §7) cross unchanged as
/// `Error::Semantic` so the client-facing policy table still applies;
/// only faults with no named kind (decode/encode already map 1:1, and
/// DCP-layer errors have no taxonomy entry) fall back to `Internal`,
/// matching how a panicking handler already recovers.
fn into_admin_error(err: crate::error::Error) -> secidx_admin::Error {
    use secidx_admin::SemanticKind;

    let kind = match &err {
        crate::error::Error::FeedNotFound(_) => Some(SemanticKind::TopicMissing),
        crate::error::Error::FeedAlreadyExists(_) => Some(SemanticKind::TopicExist),
        crate::error::Error::Decode(_) | crate::error::Error::Encode(_) => None,
        crate::error::Error::Feed(feed_err) => match feed_err {
            secidx_feed::Error::InvalidKVaddrs => Some(SemanticKind::InvalidKVaddrs),
            secidx_feed::Error::InconsistentFeed => Some(SemanticKind::InconsistentFeed),
            secidx_feed::Error::InvalidVbucketBranch(_) => Some(SemanticKind::InvalidVbucketBranch),
            secidx_feed::Error::ResponseTimeout(_) => Some(SemanticKind::ResponseTimeout),
            secidx_feed::Error::TopicMissing => Some(SemanticKind::TopicMissing),
            secidx_feed::Error::InvalidBucket => Some(SemanticKind::InvalidBucket),
            secidx_feed::Error::ConnClosed => Some(SemanticKind::ConnClosed),
            secidx_feed::Error::DcpError(..) => None,
        },
    };

    if let Some(kind) = kind {
        return secidx_admin::Error::Semantic { kind, detail: err.to_string() };
    }

    match err {
        crate::error::Error::Decode(msg) => secidx_admin::Error::DecodeRequest(msg),
        crate::error::Error::Encode(msg) => secidx_admin::Error::EncodeResponse(msg),
        other => {
            error!(error = %other, "admin handler operation failed with no named semantic kind");
            secidx_admin::Error::Internal
        }
    }
}

macro_rules! feed_handler {
    ($name:ident, $request:ty, $method:ident) => {
        pub struct $name(pub Arc<Projector>);

        #[async_trait]
        impl AdminHandler for $name {
            async fn handle(&self, body: Bytes) -> secidx_admin::Result<Bytes> {
                let request: $request = decode(&body)?;
                let response = self.0.$method(request).await.map_err(into_admin_error)?;
                encode(&response)
            }
        }
    };
}

feed_handler!(MutationTopicHandler, MutationTopicRequest, mutation_topic);
feed_handler!(RestartVbucketsHandler, RestartVbucketsRequest, restart_vbuckets);
feed_handler!(ShutdownVbucketsHandler, ShutdownVbucketsRequest, shutdown_vbuckets);
feed_handler!(AddBucketsHandler, AddBucketsRequest, add_buckets);
feed_handler!(DelBucketsHandler, DelBucketsRequest, del_buckets);
feed_handler!(AddInstancesHandler, AddInstancesRequest, add_instances);
feed_handler!(DelInstancesHandler, DelInstancesRequest, del_instances);
feed_handler!(RepairEndpointsHandler, RepairEndpointsRequest, repair_endpoints);
feed_handler!(ShutdownTopicHandler, ShutdownTopicRequest, shutdown_topic);

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secidx_feed::test_support::{FakeDcp, FakeFailoverLogs, FakeSeqnoSources};
    use secidx_types::{Opaque, TopicId};

    use super::*;
    use crate::registry::FeedRegistry;

    fn projector() -> Arc<Projector> {
        let registry = Arc::new(FeedRegistry::new(
            Arc::new(FakeFailoverLogs::default()),
            Arc::new(FakeDcp::active(1, 1)),
            Duration::from_secs(1),
            Arc::new(FakeSeqnoSources::empty()),
        ));
        Arc::new(Projector::new(registry, secidx_config::SecIdxConfig::default()))
    }

    #[tokio::test]
    async fn mutation_topic_handler_roundtrips_through_json() {
        let handler = MutationTopicHandler(projector());
        let request = MutationTopicRequest {
            topic: TopicId::new("t1"),
            opaque: Opaque::default(),
            buckets: vec!["b1".to_string()],
            restart_points: vec![],
            endpoints: vec!["127.0.0.1:9000".to_string()],
        };
        let body = Bytes::from(serde_json::to_vec(&request).unwrap());
        let response = handler.handle(body).await.unwrap();
        let decoded: secidx_wire::message::TopicResponse = serde_json::from_slice(&response).unwrap();
        assert_eq!(decoded.topic, TopicId::new("t1"));
    }

    #[tokio::test]
    async fn malformed_body_reports_decode_error() {
        let handler = MutationTopicHandler(projector());
        let err = handler.handle(Bytes::from_static(b"not json")).await.unwrap_err();
        assert!(matches!(err, secidx_admin::Error::DecodeRequest(_)));
    }

    #[tokio::test]
    async fn restart_on_unknown_topic_reports_topic_missing_unchanged() {
        let handler = RestartVbucketsHandler(projector());
        let request = RestartVbucketsRequest {
            topic: TopicId::new("never-opened"),
            opaque: Opaque::default(),
            restart_points: vec![],
        };
        let body = Bytes::from(serde_json::to_vec(&request).unwrap());
        let err = handler.handle(body).await.unwrap_err();
        assert!(matches!(
            err,
            secidx_admin::Error::Semantic { kind: secidx_admin::SemanticKind::TopicMissing, .. }
        ));
    }
}
