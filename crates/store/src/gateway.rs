//! Shared store connection with a lazy, lock-guarded lifecycle
//!
//! The engine talks to its document and key-value backends through one
//! [`StoreGateway`]. The gateway connects on first use, hands out a shared
//! handle afterwards, and can be shut down and reconnected. Initialization
//! runs entirely under an async mutex so concurrent first calls produce
//! exactly one connection; there is no unguarded fast path to race with.

use crate::doc_store::{DocumentStore, MemoryDocumentStore};
use crate::kv_store::{KvStore, MemoryKvStore};
use async_trait::async_trait;
use kbindex_core::{Error, Result};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Default deadline applied to each store call.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(10);

/// A connected pair of backends.
#[derive(Clone)]
pub struct Backends {
    /// Document index backend.
    pub documents: Arc<dyn DocumentStore>,
    /// Opaque-key JSON backend.
    pub kv: Arc<dyn KvStore>,
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}

/// Produces connected [`Backends`] on demand.
///
/// Implementations hold connection configuration (endpoints, credentials)
/// and perform the actual dial in [`connect`](Connector::connect). The
/// gateway calls it at most once per open/close cycle.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Backends>;
}

/// Lazily-connected shared access to the backends.
pub struct StoreGateway {
    connector: Arc<dyn Connector>,
    state: Mutex<Option<Arc<Backends>>>,
    op_timeout: Duration,
}

impl StoreGateway {
    /// Create a gateway over a connector. No connection happens here.
    pub fn new(connector: Arc<dyn Connector>, op_timeout: Duration) -> Self {
        StoreGateway {
            connector,
            state: Mutex::new(None),
            op_timeout,
        }
    }

    /// Deadline applied by [`bound`](StoreGateway::bound).
    pub fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    /// Get the connected backends, dialing on first use.
    ///
    /// The mutex is held across the dial, so concurrent first callers
    /// queue behind one connection attempt instead of racing their own.
    /// The dial itself is bounded by the configured op deadline; a hung
    /// connector surfaces as a retryable `Timeout` instead of stalling
    /// every queued caller.
    pub async fn acquire(&self) -> Result<Arc<Backends>> {
        let mut state = self.state.lock().await;
        if let Some(backends) = state.as_ref() {
            return Ok(backends.clone());
        }
        debug!("connecting store backends");
        let connected = match tokio::time::timeout(self.op_timeout, self.connector.connect()).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Timeout {
                    op: "connect".to_string(),
                    elapsed_ms: self.op_timeout.as_millis() as u64,
                })
            }
        };
        let backends = Arc::new(connected);
        *state = Some(backends.clone());
        Ok(backends)
    }

    /// Drop the connection. The next [`acquire`](StoreGateway::acquire)
    /// reconnects.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if state.take().is_some() {
            debug!("store backends disconnected");
        }
    }

    /// Run a store call under the configured deadline.
    pub async fn bound<T, F>(&self, op: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                op: op.to_string(),
                elapsed_ms: self.op_timeout.as_millis() as u64,
            }),
        }
    }
}

/// Connector over prebuilt in-process backends.
///
/// Counts connect calls so tests can assert the dial-once and
/// reconnect-after-shutdown behavior.
pub struct MemoryConnector {
    backends: Backends,
    connects: AtomicUsize,
}

impl MemoryConnector {
    /// Wrap existing backends.
    pub fn new(backends: Backends) -> Self {
        MemoryConnector {
            backends,
            connects: AtomicUsize::new(0),
        }
    }

    /// Fresh in-memory document and key-value stores.
    pub fn in_memory() -> Self {
        Self::new(Backends {
            documents: Arc::new(MemoryDocumentStore::new()),
            kv: Arc::new(MemoryKvStore::new()),
        })
    }

    /// Number of completed connect calls.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<Backends> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.backends.clone())
    }
}
