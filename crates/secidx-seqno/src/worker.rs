use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::warn;

use secidx_types::Vbno;

use crate::cid::Cid;
use crate::error::{Error, Result};
use crate::merge::{merge_max, merge_min};
use crate::source::NodeSeqnoSource;

type Reply = oneshot::Sender<Result<Vec<(Vbno, u64)>>>;

pub enum WorkerCommand {
    Get { cid: Cid, reply: Reply },
    GetMin { reply: Reply },
    Close,
}

enum Internal {
    External(WorkerCommand),
    FanOutDone {
        cid: Cid,
        result: Result<Vec<(Vbno, u64)>>,
    },
    MinFanOutDone {
        result: Result<Vec<(Vbno, u64)>>,
    },
}

/// Runs one worker's sticky per-cid coalescing fan-out loop. One worker
/// owns connections (here, `Arc<dyn NodeSeqnoSource>` handles) to every
/// storage node hosting the bucket's VBs.
pub async fn run(
    nodes: Vec<Arc<dyn NodeSeqnoSource>>,
    vb_count: usize,
    mut rx: mpsc::Receiver<WorkerCommand>,
    drained_tx: mpsc::UnboundedSender<(Cid, bool)>,
) {
    let (internal_tx, mut internal_rx) = mpsc::unbounded_channel::<Internal>();
    let mut pending: HashMap<Cid, Vec<Reply>> = HashMap::new();
    let mut min_pending: Vec<Reply> = Vec::new();
    let mut min_in_flight = false;
    let mut closing = false;

    // Close stops admitting new work but, per the no-forced-cancellation
    // rule, lets any fan-out already in flight complete or fail
    // naturally before the actor exits.
    loop {
        if closing && pending.is_empty() && !min_in_flight {
            break;
        }
        let next = tokio::select! {
            maybe_cmd = rx.recv(), if !closing => match maybe_cmd {
                Some(cmd) => Internal::External(cmd),
                None => { closing = true; continue; }
            },
            Some(done) = internal_rx.recv() => done,
            else => break,
        };

        match next {
            Internal::External(WorkerCommand::Close) => {
                closing = true;
            }
            Internal::External(WorkerCommand::Get { cid, reply }) => {
                let first = !pending.contains_key(&cid);
                pending.entry(cid).or_default().push(reply);
                if first {
                    spawn_fan_out(nodes.clone(), vb_count, cid, internal_tx.clone());
                }
            }
            Internal::External(WorkerCommand::GetMin { reply }) => {
                min_pending.push(reply);
                if !min_in_flight {
                    min_in_flight = true;
                    spawn_min_fan_out(nodes.clone(), vb_count, internal_tx.clone());
                }
            }
            Internal::FanOutDone { cid, result } => {
                let failed = result.is_err();
                if let Some(replies) = pending.remove(&cid) {
                    for reply in replies {
                        let _ = reply.send(result.clone());
                    }
                }
                let _ = drained_tx.send((cid, failed));
            }
            Internal::MinFanOutDone { result } => {
                min_in_flight = false;
                for reply in min_pending.drain(..) {
                    let _ = reply.send(result.clone());
                }
            }
        }
    }

    for replies in pending.into_values() {
        for reply in replies {
            let _ = reply.send(Err(Error::ConnClosed));
        }
    }
    for reply in min_pending {
        let _ = reply.send(Err(Error::ConnClosed));
    }
}

fn spawn_fan_out(
    nodes: Vec<Arc<dyn NodeSeqnoSource>>,
    vb_count: usize,
    cid: Cid,
    internal_tx: mpsc::UnboundedSender<Internal>,
) {
    tokio::spawn(async move {
        let result = fan_out(
            &nodes,
            vb_count,
            |n| {
                let n = n.clone();
                async move { n.high_seqnos().await }
            },
            merge_max,
        )
        .await;
        let _ = internal_tx.send(Internal::FanOutDone { cid, result });
    });
}

fn spawn_min_fan_out(
    nodes: Vec<Arc<dyn NodeSeqnoSource>>,
    vb_count: usize,
    internal_tx: mpsc::UnboundedSender<Internal>,
) {
    tokio::spawn(async move {
        let result = fan_out(
            &nodes,
            vb_count,
            |n| {
                let n = n.clone();
                async move { n.min_seqnos().await }
            },
            merge_min,
        )
        .await;
        let _ = internal_tx.send(Internal::MinFanOutDone { result });
    });
}

async fn fan_out<F, Fut, M>(
    nodes: &[Arc<dyn NodeSeqnoSource>],
    vb_count: usize,
    fetch: F,
    merge: M,
) -> Result<Vec<(Vbno, u64)>>
where
    F: Fn(&Arc<dyn NodeSeqnoSource>) -> Fut,
    Fut: std::future::Future<Output = std::result::Result<Vec<(Vbno, u64)>, String>> + Send + 'static,
    M: Fn(&[Vec<(Vbno, u64)>], usize) -> Result<Vec<(Vbno, u64)>>,
{
    let mut set = JoinSet::new();
    for node in nodes {
        set.spawn(fetch(node));
    }
    let mut per_node = Vec::with_capacity(nodes.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(entries)) => per_node.push(entries),
            Ok(Err(msg)) => {
                warn!(error = %msg, "node fetch failed during seqno fan-out");
                return Err(Error::NodeFetchFailed("unknown".to_string(), msg));
            }
            Err(join_err) => {
                warn!(error = %join_err, "node fetch task panicked");
                return Err(Error::NodeFetchFailed("unknown".to_string(), join_err.to_string()));
            }
        }
    }
    merge(&per_node, vb_count)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::source::test_support::FakeNode;

    use super::*;

    fn spawn_worker(
        nodes: Vec<Arc<dyn NodeSeqnoSource>>,
        vb_count: usize,
    ) -> (
        mpsc::Sender<WorkerCommand>,
        mpsc::UnboundedReceiver<(Cid, bool)>,
    ) {
        let (tx, rx) = mpsc::channel(32);
        let (drained_tx, drained_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(nodes, vb_count, rx, drained_tx));
        (tx, drained_rx)
    }

    #[tokio::test]
    async fn coalesces_concurrent_requests_for_same_cid() {
        let node_a: Arc<dyn NodeSeqnoSource> =
            Arc::new(FakeNode::new(vec![(0, 10), (1, 20)]));
        let (tx, mut drained) = spawn_worker(vec![node_a], 2);

        let (r1_tx, r1_rx) = oneshot::channel();
        let (r2_tx, r2_rx) = oneshot::channel();
        tx.send(WorkerCommand::Get {
            cid: Cid::new(5),
            reply: r1_tx,
        })
        .await
        .unwrap();
        tx.send(WorkerCommand::Get {
            cid: Cid::new(5),
            reply: r2_tx,
        })
        .await
        .unwrap();

        let a = r1_rx.await.unwrap().unwrap();
        let b = r2_rx.await.unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, vec![(Vbno(0), 10), (Vbno(1), 20)]);
        assert_eq!(drained.recv().await, Some((Cid::new(5), false)));
    }

    #[tokio::test]
    async fn node_failure_surfaces_as_fetch_error() {
        let failing: Arc<dyn NodeSeqnoSource> = Arc::new(FakeNode::failing());
        let (tx, _drained) = spawn_worker(vec![failing], 1);
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(WorkerCommand::Get {
            cid: Cid::new(1),
            reply: reply_tx,
        })
        .await
        .unwrap();
        let result = reply_rx.await.unwrap();
        assert!(matches!(result, Err(Error::NodeFetchFailed(_, _))));
    }

    #[tokio::test]
    async fn close_lets_in_flight_fan_out_complete_before_exit() {
        let fake = FakeNode::new(vec![(0, 1)]);
        *fake.delay.lock().unwrap() = Some(Duration::from_millis(50));
        let node: Arc<dyn NodeSeqnoSource> = Arc::new(fake);
        let (tx, _drained) = spawn_worker(vec![node], 1);

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(WorkerCommand::Get {
            cid: Cid::new(1),
            reply: reply_tx,
        })
        .await
        .unwrap();
        tx.send(WorkerCommand::Close).await.unwrap();

        let result = reply_rx.await.unwrap();
        assert_eq!(result.unwrap(), vec![(Vbno(0), 1)]);
    }
}
