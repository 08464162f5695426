use async_trait::async_trait;

use secidx_types::Vbno;

/// One storage node's view of high-seqnos (or min-seqnos across its
/// replicas) for the VBs it hosts. A worker holds one of these per node.
#[async_trait]
pub trait NodeSeqnoSource: Send + Sync {
    /// Current high-seqno per VB this node hosts.
    async fn high_seqnos(&self) -> Result<Vec<(Vbno, u64)>, String>;

    /// Current min-seqno (across replicas) per VB this node hosts. `0`
    /// means "no replica caught up yet" and is excluded from the merge.
    async fn min_seqnos(&self) -> Result<Vec<(Vbno, u64)>, String>;

    /// Cheap liveness check used by the background sweeper.
    async fn ping(&self) -> bool;
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// A scriptable node source for tests: returns canned per-VB data,
    /// optionally failing or going unreachable.
    pub struct FakeNode {
        pub high: Vec<(Vbno, u64)>,
        pub min: Vec<(Vbno, u64)>,
        pub fail: bool,
        pub alive: AtomicBool,
        pub calls: AtomicUsize,
        pub delay: Mutex<Option<std::time::Duration>>,
    }

    impl FakeNode {
        pub fn new(entries: Vec<(u16, u64)>) -> Self {
            let high = entries.iter().map(|(vb, s)| (Vbno(*vb), *s)).collect();
            let min = entries.into_iter().map(|(vb, s)| (Vbno(vb), s)).collect();
            Self {
                high,
                min,
                fail: false,
                alive: AtomicBool::new(true),
                calls: AtomicUsize::new(0),
                delay: Mutex::new(None),
            }
        }

        pub fn failing() -> Self {
            Self {
                high: vec![],
                min: vec![],
                fail: true,
                alive: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
                delay: Mutex::new(None),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn set_alive(&self, alive: bool) {
            self.alive.store(alive, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl NodeSeqnoSource for FakeNode {
        async fn high_seqnos(&self) -> Result<Vec<(Vbno, u64)>, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(d) = *self.delay.lock().unwrap() {
                tokio::time::sleep(d).await;
            }
            if self.fail {
                return Err("simulated node failure".to_string());
            }
            Ok(self.high.clone())
        }

        async fn min_seqnos(&self) -> Result<Vec<(Vbno, u64)>, String> {
            if self.fail {
                return Err("simulated node failure".to_string());
            }
            Ok(self.min.clone())
        }

        async fn ping(&self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }
    }
}
