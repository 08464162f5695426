use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::instrument;

use crate::auth::CredentialValidator;
use crate::error::{Error, Result};
use crate::stats::{PathStats, PathStatsSnapshot};

/// A registered operation: decodes its own request body, performs the
/// operation (typically by forwarding to a feed/projector actor over a
/// one-shot reply channel), and encodes its own response.
///
/// Implementations own the decode/encode step themselves rather than the
/// dispatcher doing it generically, mirroring a request handler that
/// pattern-matches a closed payload enum per operation.
#[async_trait]
pub trait AdminHandler: Send + Sync {
    async fn handle(&self, body: Bytes) -> Result<Bytes>;
}

/// Registers typed request handlers by URL-path suffix and synchronously
/// marshals `request -> handler -> response` (spec.md §4.B).
///
/// Registration is only permitted before [`Dispatcher::start`] is called;
/// afterwards `register`/`unregister` fail with
/// [`Error::RegisteringRequest`]. This models the admin RPC server shell
/// as an external caller: the dispatcher never binds a socket itself.
pub struct Dispatcher {
    handlers: HashMap<String, Arc<dyn AdminHandler>>,
    stats: HashMap<String, Arc<PathStats>>,
    started: AtomicBool,
    validator: Arc<dyn CredentialValidator>,
}

impl Dispatcher {
    pub fn new(validator: Arc<dyn CredentialValidator>) -> Self {
        Self {
            handlers: HashMap::new(),
            stats: HashMap::new(),
            started: AtomicBool::new(false),
            validator,
        }
    }

    /// Registers `handler` under `path`. Fails if the listener has
    /// already started or if `path` is already registered.
    pub fn register(&mut self, path: impl Into<String>, handler: Arc<dyn AdminHandler>) -> Result<()> {
        if self.started.load(Ordering::Acquire) {
            return Err(Error::RegisteringRequest);
        }
        let path = path.into();
        self.handlers.insert(path.clone(), handler);
        self.stats.entry(path).or_insert_with(|| Arc::new(PathStats::default()));
        Ok(())
    }

    /// Removes a previously registered path. Fails if the listener has
    /// already started.
    pub fn unregister(&mut self, path: &str) -> Result<()> {
        if self.started.load(Ordering::Acquire) {
            return Err(Error::RegisteringRequest);
        }
        self.handlers.remove(path);
        Ok(())
    }

    /// Marks the dispatcher as live; after this call registration is
    /// frozen. Idempotent.
    pub fn start(&self) {
        self.started.store(true, Ordering::Release);
    }

    /// Returns a snapshot of one path's counters, for the `/stats` surface.
    pub fn path_stats(&self, path: &str) -> Option<PathStatsSnapshot> {
        self.stats.get(path).map(|s| s.snapshot())
    }

    pub fn all_stats(&self) -> HashMap<String, PathStatsSnapshot> {
        self.stats
            .iter()
            .map(|(path, stats)| (path.clone(), stats.snapshot()))
            .collect()
    }

    /// Dispatches one request: auth gate, handler invocation with panic
    /// recovery, and counter updates. `auth_header` is consulted for
    /// every path (mutating and stats alike), per spec.md §4.B.
    #[instrument(skip(self, body, auth_header), fields(path = %path))]
    pub async fn dispatch(
        &self,
        path: &str,
        body: Bytes,
        auth_header: Option<&str>,
    ) -> Result<Bytes> {
        let stats = match self.stats.get(path) {
            Some(s) => s.clone(),
            None => return Err(Error::PathNotFound(path.to_string())),
        };
        stats.record_request(body.len());

        if !self.validator.validate(auth_header) {
            stats.record_error();
            return Err(Error::Unauthorized);
        }

        let handler = match self.handlers.get(path) {
            Some(h) => h.clone(),
            None => {
                stats.record_error();
                return Err(Error::PathNotFound(path.to_string()));
            }
        };

        let result = tokio::spawn(async move { handler.handle(body).await }).await;

        match result {
            Ok(Ok(response)) => {
                stats.record_response(response.len());
                Ok(response)
            }
            Ok(Err(e)) => {
                stats.record_error();
                Err(e)
            }
            Err(join_err) => {
                stats.record_error();
                tracing::error!(error = %join_err, "admin handler panicked");
                Err(Error::Internal)
            }
        }
    }
}
