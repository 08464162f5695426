//! # secidx-projector: topic registry and admin-surface glue
//!
//! Implements spec.md §4.F: a `topic -> Feed` registry
//! ([`FeedRegistry`]) behind a single reader/writer lock, plus one
//! [`secidx_admin::AdminHandler`] per [`secidx_wire::message::MessageName`]
//! that decodes its JSON body, forwards to the matching [`Projector`]
//! method, and encodes the response. `VbmapRequest`/`FailoverLogRequest`
//! are cluster-topology queries answered elsewhere and are not wired
//! here.

mod error;
mod handlers;
mod projector;
mod registry;

pub use error::{Error, Result};
pub use handlers::{
    AddBucketsHandler, AddInstancesHandler, DelBucketsHandler, DelInstancesHandler,
    MutationTopicHandler, RepairEndpointsHandler, RestartVbucketsHandler, ShutdownTopicHandler,
    ShutdownVbucketsHandler,
};
pub use projector::Projector;
pub use registry::FeedRegistry;

use std::sync::Arc;

use secidx_admin::Dispatcher;
use secidx_wire::message::MessageName;

/// Registers every feed-backed admin operation on `dispatcher` under its
/// wire path suffix. Call before [`secidx_admin::Dispatcher::start`].
pub fn register_handlers(dispatcher: &mut Dispatcher, projector: Arc<Projector>) -> secidx_admin::Result<()> {
    dispatcher.register(MessageName::MutationTopicRequest.path_suffix(), Arc::new(MutationTopicHandler(projector.clone())))?;
    dispatcher.register(MessageName::RestartVbucketsRequest.path_suffix(), Arc::new(RestartVbucketsHandler(projector.clone())))?;
    dispatcher.register(MessageName::ShutdownVbucketsRequest.path_suffix(), Arc::new(ShutdownVbucketsHandler(projector.clone())))?;
    dispatcher.register(MessageName::AddBucketsRequest.path_suffix(), Arc::new(AddBucketsHandler(projector.clone())))?;
    dispatcher.register(MessageName::DelBucketsRequest.path_suffix(), Arc::new(DelBucketsHandler(projector.clone())))?;
    dispatcher.register(MessageName::AddInstancesRequest.path_suffix(), Arc::new(AddInstancesHandler(projector.clone())))?;
    dispatcher.register(MessageName::DelInstancesRequest.path_suffix(), Arc::new(DelInstancesHandler(projector.clone())))?;
    dispatcher.register(MessageName::RepairEndpointsRequest.path_suffix(), Arc::new(RepairEndpointsHandler(projector.clone())))?;
    dispatcher.register(MessageName::ShutdownTopicRequest.path_suffix(), Arc::new(ShutdownTopicHandler(projector)))?;
    Ok(())
}
