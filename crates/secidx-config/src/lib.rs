//! # secidx-config: typed runtime configuration
//!
//! A `#[serde(default)]` struct covering exactly the recognized keys
//! spec.md §9 enumerates. Unknown keys are not rejected: they are
//! captured into [`SecIdxConfig::overflow`] via `#[serde(flatten)]` and
//! logged at `warn` by [`SecIdxConfig::load`], so a newer admin surface
//! talking to an older binary degrades gracefully instead of failing to
//! parse.

mod error;
mod loader;

use serde::{Deserialize, Serialize};

pub use error::ConfigError;
pub use loader::ConfigLoader;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    pub queue_size: u32,
    pub max_concurrency: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { queue_size: 16_384, max_concurrency: 32 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    #[serde(rename = "allowCJsonScanFormat")]
    pub allow_cjson_scan_format: bool,
    #[serde(rename = "usePlanner")]
    pub use_planner: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { allow_cjson_scan_format: true, use_planner: true }
    }
}

/// Recognized configuration surface for the indexer/projector core
/// (spec.md §9's enumerated key list).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecIdxConfig {
    #[serde(rename = "statsLogDumpInterval")]
    pub stats_log_dump_interval_secs: u64,
    #[serde(rename = "vbseqnosLogIntervalMultiplier")]
    pub vbseqnos_log_interval_multiplier: u32,
    #[serde(rename = "bufferSize")]
    pub buffer_size: usize,
    #[serde(rename = "bufferTimeout")]
    pub buffer_timeout_ms: u64,
    #[serde(rename = "harakiriTimeout")]
    pub harakiri_timeout_ms: u64,
    #[serde(rename = "maxPayload")]
    pub max_payload: u32,
    #[serde(rename = "keyChanSize")]
    pub key_chan_size: usize,
    #[serde(rename = "remoteBlock")]
    pub remote_block: bool,
    #[serde(rename = "numPartitions")]
    pub num_partitions: u32,
    #[serde(rename = "num_replica")]
    pub num_replica: u32,
    #[serde(rename = "allowPartialQuorum")]
    pub allow_partial_quorum: bool,
    #[serde(rename = "scanLagPercent")]
    pub scan_lag_percent: u32,
    #[serde(rename = "scanLagItem")]
    pub scan_lag_item: u32,
    pub scan: ScanConfig,
    pub client: ClientConfig,
    #[serde(rename = "restRequestTimeout")]
    pub rest_request_timeout_ms: u64,
    #[serde(rename = "storage_mode")]
    pub storage_mode: String,

    /// Keys not recognized by this version, preserved for forward
    /// compatibility instead of rejected.
    #[serde(flatten)]
    pub overflow: serde_json::Map<String, serde_json::Value>,
}

impl Default for SecIdxConfig {
    fn default() -> Self {
        Self {
            stats_log_dump_interval_secs: 60,
            vbseqnos_log_interval_multiplier: 10,
            buffer_size: 1024,
            buffer_timeout_ms: 1000,
            harakiri_timeout_ms: 300_000,
            max_payload: 1 << 20,
            key_chan_size: 10_000,
            remote_block: true,
            num_partitions: 8,
            num_replica: 0,
            allow_partial_quorum: false,
            scan_lag_percent: 5,
            scan_lag_item: 100,
            scan: ScanConfig::default(),
            client: ClientConfig::default(),
            rest_request_timeout_ms: 10_000,
            storage_mode: "plasma".to_string(),
            overflow: serde_json::Map::new(),
        }
    }
}

impl SecIdxConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = ConfigLoader::new().load()?;
        config.warn_unrecognized_keys();
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let config = ConfigLoader::new().with_file(path).load()?;
        config.warn_unrecognized_keys();
        Ok(config)
    }

    fn warn_unrecognized_keys(&self) {
        for key in self.overflow.keys() {
            tracing::warn!(key, "unrecognized configuration key, preserved in overflow");
        }
    }
}

/// A live configuration update applied to a running projector (spec.md
/// §4.F "Accepts live configuration updates"). The transport that
/// delivers it -- metakv or similar -- is external; this is only the
/// payload shape callers apply.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigUpdate {
    pub log_level: Option<String>,
    pub buffer_size: Option<usize>,
    pub buffer_timeout_ms: Option<u64>,
    pub harakiri_timeout_ms: Option<u64>,
}
