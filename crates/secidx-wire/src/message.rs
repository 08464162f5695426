use serde::{Deserialize, Serialize};

use secidx_types::{Opaque, TopicId, Vbno};

/// Symbolic name of a registered admin operation (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageName {
    VbmapRequest,
    FailoverLogRequest,
    MutationTopicRequest,
    RestartVbucketsRequest,
    ShutdownVbucketsRequest,
    AddBucketsRequest,
    DelBucketsRequest,
    AddInstancesRequest,
    DelInstancesRequest,
    RepairEndpointsRequest,
    ShutdownTopicRequest,
}

impl MessageName {
    /// The URL-path suffix this message is registered under
    /// (`urlPrefix + MessageName`).
    pub fn path_suffix(self) -> &'static str {
        match self {
            MessageName::VbmapRequest => "VbmapRequest",
            MessageName::FailoverLogRequest => "FailoverLogRequest",
            MessageName::MutationTopicRequest => "MutationTopicRequest",
            MessageName::RestartVbucketsRequest => "RestartVbucketsRequest",
            MessageName::ShutdownVbucketsRequest => "ShutdownVbucketsRequest",
            MessageName::AddBucketsRequest => "AddBucketsRequest",
            MessageName::DelBucketsRequest => "DelBucketsRequest",
            MessageName::AddInstancesRequest => "AddInstancesRequest",
            MessageName::DelInstancesRequest => "DelInstancesRequest",
            MessageName::RepairEndpointsRequest => "RepairEndpointsRequest",
            MessageName::ShutdownTopicRequest => "ShutdownTopicRequest",
        }
    }
}

/// `(vbuuid, seqno)` lower bound a caller wants a VB stream to resume from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VbRestartPoint {
    pub vb: Vbno,
    pub vbuuid: u64,
    pub seqno: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationTopicRequest {
    pub topic: TopicId,
    pub opaque: Opaque,
    pub buckets: Vec<String>,
    pub restart_points: Vec<VbRestartPoint>,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicResponse {
    pub topic: TopicId,
    pub opaque: Opaque,
    pub active: Vec<VbRestartPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartVbucketsRequest {
    pub topic: TopicId,
    pub opaque: Opaque,
    pub restart_points: Vec<VbRestartPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownVbucketsRequest {
    pub topic: TopicId,
    pub opaque: Opaque,
    pub vbs: Vec<Vbno>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddBucketsRequest {
    pub topic: TopicId,
    pub opaque: Opaque,
    pub buckets: Vec<String>,
    pub restart_points: Vec<VbRestartPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelBucketsRequest {
    pub topic: TopicId,
    pub opaque: Opaque,
    pub buckets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddInstancesRequest {
    pub topic: TopicId,
    pub opaque: Opaque,
    pub inst_ids: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelInstancesRequest {
    pub topic: TopicId,
    pub opaque: Opaque,
    pub inst_ids: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairEndpointsRequest {
    pub topic: TopicId,
    pub opaque: Opaque,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownTopicRequest {
    pub topic: TopicId,
    pub opaque: Opaque,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VbmapRequest {
    pub bucket: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VbmapResponse {
    pub bucket: String,
    /// `vbucket -> server-address` routing table.
    pub vb_to_server: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverLogRequest {
    pub bucket: String,
    pub vbs: Vec<Vbno>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverLogResponse {
    pub bucket: String,
    pub logs: Vec<(Vbno, Vec<(u64, u64)>)>,
}
