use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, warn};

use secidx_types::{Bucket, KeyVersion, Vbno};

use crate::command::Command;
use crate::config::EndpointConfig;
use crate::error::Error;
use crate::sink::Sink;
use crate::stats::EndpointStats;

/// Runs one endpoint's buffering and flush discipline until `Close` or
/// all command senders are dropped. Spawn this on its own task.
pub async fn run<S: Sink>(
    mut sink: S,
    config: EndpointConfig,
    stats: Arc<EndpointStats>,
    mut rx: mpsc::Receiver<Command>,
) {
    let mut buffers: HashMap<(Bucket, Vbno), VecDeque<KeyVersion>> = HashMap::new();
    let mut queued = 0usize;
    let mut config = config;
    let mut last_active = Instant::now();

    let mut buffer_tick = interval(config.buffer_tick);
    let harakiri_quantum = (config.harakiri_tm / 4).max(std::time::Duration::from_millis(1));
    let mut harakiri_tick = interval(harakiri_quantum);

    loop {
        tokio::select! {
            maybe_cmd = rx.recv() => {
                let Some(cmd) = maybe_cmd else { break };
                last_active = Instant::now();
                match cmd {
                    Command::Send { batch, reply } => {
                        for (bucket, vb, kvs) in batch {
                            queued += kvs.len();
                            buffers.entry((bucket, vb)).or_default().extend(kvs);
                        }
                        let result = if queued > config.buffer_size {
                            flush(&mut sink, &mut buffers, &mut queued, &stats)
                        } else {
                            Ok(())
                        };
                        let aborted = result.is_err();
                        let _ = reply.send(result);
                        if aborted {
                            break;
                        }
                    }
                    Command::Ping { reply } => {
                        let _ = reply.send(!stats.is_closed());
                    }
                    Command::ResetConfig { config: new_config, reply } => {
                        config = new_config;
                        buffer_tick = interval(config.buffer_tick);
                        let _ = reply.send(());
                    }
                    Command::GetStatistics { reply } => {
                        let _ = reply.send(stats.snapshot());
                    }
                    Command::Close { reply } => {
                        let _ = flush(&mut sink, &mut buffers, &mut queued, &stats);
                        stats.mark_closed();
                        let _ = reply.send(());
                        debug!("endpoint closed by command");
                        break;
                    }
                }
            }
            _ = buffer_tick.tick() => {
                if flush(&mut sink, &mut buffers, &mut queued, &stats).is_err() {
                    break;
                }
            }
            _ = harakiri_tick.tick() => {
                if last_active.elapsed() > config.harakiri_tm {
                    debug!("endpoint harakiri: idle past harakiri_tm");
                    let _ = flush(&mut sink, &mut buffers, &mut queued, &stats);
                    stats.mark_closed();
                    break;
                }
            }
        }
    }

    // Drain any commands still queued behind us with a closed error so
    // callers awaiting a reply don't hang forever.
    while let Ok(cmd) = rx.try_recv() {
        match cmd {
            Command::Send { reply, .. } => {
                let _ = reply.send(Err(Error::ConnClosed));
            }
            Command::Ping { reply } => {
                let _ = reply.send(false);
            }
            Command::ResetConfig { reply, .. } => {
                let _ = reply.send(());
            }
            Command::GetStatistics { reply } => {
                let _ = reply.send(stats.snapshot());
            }
            Command::Close { reply } => {
                let _ = reply.send(());
            }
        }
    }
}

fn flush<S: Sink>(
    sink: &mut S,
    buffers: &mut HashMap<(Bucket, Vbno), VecDeque<KeyVersion>>,
    queued: &mut usize,
    stats: &Arc<EndpointStats>,
) -> Result<(), Error> {
    let start = Instant::now();
    // Ordering is only guaranteed within a single (bucket, vb): drain each
    // queue front-to-back, but the relative order between different keys
    // is unspecified.
    for queue in buffers.values_mut() {
        for kv in queue.drain(..) {
            for proj in &kv.projections {
                stats.record_command(proj.command);
            }
            let encoded = match serde_json::to_vec(&kv) {
                Ok(bytes) => bytes::Bytes::from(bytes),
                Err(e) => return Err(Error::FlushFailed(e.to_string())),
            };
            if let Err(e) = sink.write_frame(encoded) {
                warn!(error = %e, "endpoint flush failed, aborting");
                stats.mark_closed();
                return Err(Error::FlushFailed(e.to_string()));
            }
        }
    }
    *queued = 0;
    stats.record_flush(start.elapsed().as_micros() as f64);
    Ok(())
}
