use std::time::Duration;

/// Tunables for one endpoint, propagated from `secidx-config`'s
/// `bufferSize`/`bufferTimeout`/`harakiriTimeout`/`remoteBlock` keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointConfig {
    /// Flush once the number of queued key-versions exceeds this.
    pub buffer_size: usize,
    /// Flush at least this often even if `buffer_size` isn't reached.
    pub buffer_tick: Duration,
    /// Self-close after this much time with no activity.
    pub harakiri_tm: Duration,
    /// `true`: `Send` awaits queue capacity. `false`: `Send` fails
    /// immediately with `ChannelFull` when the queue is full.
    pub remote_block: bool,
    /// Bound on the command channel.
    pub command_queue_size: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            buffer_size: 100,
            buffer_tick: Duration::from_millis(500),
            harakiri_tm: Duration::from_secs(30),
            remote_block: true,
            command_queue_size: 256,
        }
    }
}
