use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::command::{Command, DataportKeyVersions};
use crate::config::EndpointConfig;
use crate::error::{Error, Result};
use crate::stats::EndpointStatsSnapshot;

/// A cheap, cloneable front-end to one endpoint actor. Dropping every
/// handle lets the actor exit once its command channel drains.
#[derive(Clone)]
pub struct EndpointHandle {
    tx: mpsc::Sender<Command>,
}

impl EndpointHandle {
    pub(crate) fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }

    /// Sends a batch of key-versions. Blocking (`remote_block = true`)
    /// awaits queue capacity; non-blocking fails immediately with
    /// [`Error::ChannelFull`] when the command queue is full.
    pub async fn send(&self, batch: DataportKeyVersions, remote_block: bool) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = Command::Send {
            batch,
            reply: reply_tx,
        };
        if remote_block {
            self.tx.send(cmd).await.map_err(|_| Error::ConnClosed)?;
        } else {
            self.tx
                .try_send(cmd)
                .map_err(|e| match e {
                    mpsc::error::TrySendError::Full(_) => Error::ChannelFull,
                    mpsc::error::TrySendError::Closed(_) => Error::ConnClosed,
                })?;
        }
        reply_rx.await.map_err(|_| Error::ConnClosed)?
    }

    pub async fn ping(&self) -> bool {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(Command::Ping { reply: reply_tx }).await.is_err() {
            return false;
        }
        reply_rx.await.unwrap_or(false)
    }

    pub async fn reset_config(&self, config: EndpointConfig) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::ResetConfig {
                config,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::ConnClosed)?;
        reply_rx.await.map_err(|_| Error::ConnClosed)
    }

    pub async fn statistics(&self) -> Result<EndpointStatsSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::GetStatistics { reply: reply_tx })
            .await
            .map_err(|_| Error::ConnClosed)?;
        reply_rx.await.map_err(|_| Error::ConnClosed)
    }

    pub async fn close(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Close { reply: reply_tx })
            .await
            .map_err(|_| Error::ConnClosed)?;
        reply_rx.await.map_err(|_| Error::ConnClosed)
    }
}

/// Spawns an endpoint actor bound to `sink`, returning a handle to it.
pub fn spawn<S: crate::sink::Sink + 'static>(
    sink: S,
    config: EndpointConfig,
) -> (EndpointHandle, Arc<crate::stats::EndpointStats>) {
    let stats = Arc::new(crate::stats::EndpointStats::default());
    let (tx, rx) = mpsc::channel(config.command_queue_size);
    let actor_stats = stats.clone();
    tokio::spawn(crate::actor::run(sink, config, actor_stats, rx));
    (EndpointHandle::new(tx), stats)
}
