use tokio::sync::oneshot;

use secidx_types::{Bucket, KeyVersion, Vbno};

use crate::config::EndpointConfig;
use crate::error::Result;
use crate::stats::EndpointStatsSnapshot;

/// A batch of key-versions for one or more `(bucket, vb)` pairs, as
/// accepted by one `Send` command.
pub type DataportKeyVersions = Vec<(Bucket, Vbno, Vec<KeyVersion>)>;

/// Commands accepted by one endpoint actor (spec.md §4.C).
pub enum Command {
    Send {
        batch: DataportKeyVersions,
        reply: oneshot::Sender<Result<()>>,
    },
    Ping {
        reply: oneshot::Sender<bool>,
    },
    ResetConfig {
        config: EndpointConfig,
        reply: oneshot::Sender<()>,
    },
    GetStatistics {
        reply: oneshot::Sender<EndpointStatsSnapshot>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}
