//! Client Data Path
//!
//! `Tapestry` is the public face of a node: store, lookup, get, and remove
//! objects, plus the process lifecycle (start, graceful leave, kill).

use super::server::build_router;
use crate::blob::{BlobStore, BlobTransport};
use crate::config::NodeConfig;
use crate::directory::ObjectDirectory;
use crate::error::TapestryError;
use crate::identifier::Id;
use crate::overlay::{Node, OverlayService, PeerClient, ReadySignal, Router};

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Background work owned by a started node.
struct Lifecycle {
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<()>,
    reaper: JoinHandle<()>,
}

pub struct Tapestry {
    local: Node,
    router: Arc<dyn Router>,
    transport: Arc<dyn BlobTransport>,
    blobs: Arc<BlobStore>,
    directory: Arc<ObjectDirectory>,
    closed: AtomicBool,
    lifecycle: Mutex<Option<Lifecycle>>,
    shutdown_grace: Duration,
}

impl Tapestry {
    /// Assembles a node from its collaborators without starting a server.
    pub fn new(
        local: Node,
        router: Arc<dyn Router>,
        transport: Arc<dyn BlobTransport>,
        directory: Arc<ObjectDirectory>,
    ) -> Self {
        Self {
            local,
            router,
            transport,
            blobs: Arc::new(BlobStore::new()),
            directory,
            closed: AtomicBool::new(false),
            lifecycle: Mutex::new(None),
            shutdown_grace: NodeConfig::default().shutdown_grace,
        }
    }

    /// Starts a node listening on `config.port`, joining `config.connect_to` if set.
    pub async fn start(config: NodeConfig) -> Result<Arc<Self>, TapestryError> {
        config.validate()?;

        let listener = TcpListener::bind(config.bind_addr()).await?;
        let address = listener.local_addr()?;
        let local = Node::new(config.id.unwrap_or_else(Id::random), address);

        let directory = Arc::new(ObjectDirectory::new());
        let client = PeerClient::new(&config);
        let overlay = OverlayService::new(local, directory.clone(), client.clone(), &config);

        let mut tapestry = Self::new(
            local,
            Arc::new(overlay.clone()),
            Arc::new(client),
            directory.clone(),
        );
        tapestry.shutdown_grace = config.shutdown_grace;
        let tapestry = Arc::new(tapestry);

        let reaper = directory.start_reaper(config.reap_interval);
        let app = build_router(tapestry.clone(), overlay);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!("RPC server stopped with error: {}", e);
            }
        });

        *tapestry.lifecycle.lock() = Some(Lifecycle {
            shutdown: shutdown_tx,
            server,
            reaper,
        });
        tracing::info!("Tapestry node {} listening on {}", local.id, address);

        if let Some(seed) = config.connect_to
            && let Err(source) = tapestry.router.join(seed).await
        {
            tapestry.kill().await;
            return Err(TapestryError::Join { seed, source });
        }

        Ok(tapestry)
    }

    pub fn local_node(&self) -> Node {
        self.local
    }

    pub fn directory(&self) -> &Arc<ObjectDirectory> {
        &self.directory
    }

    pub fn blobs(&self) -> &Arc<BlobStore> {
        &self.blobs
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), TapestryError> {
        if self.is_closed() {
            return Err(TapestryError::Closed);
        }
        Ok(())
    }

    /// Stores a blob locally and starts advertising it.
    ///
    /// Nothing is stored if publishing cannot start. The returned signal fires
    /// once the root has first registered this node.
    pub async fn store(&self, key: &str, value: Vec<u8>) -> Result<ReadySignal, TapestryError> {
        self.ensure_open()?;

        let publication = self
            .router
            .publish(key)
            .await
            .map_err(|source| TapestryError::Publish {
                key: key.to_string(),
                source,
            })?;
        let ready = publication.ready_signal();
        self.blobs.put(key, value, publication);

        Ok(ready)
    }

    /// Nodes currently advertising `key`, as reported by its root.
    pub async fn lookup(&self, key: &str) -> Result<Vec<Node>, TapestryError> {
        self.ensure_open()?;

        self.router
            .lookup(key)
            .await
            .map_err(|source| TapestryError::Lookup {
                key: key.to_string(),
                source,
            })
    }

    /// Fetches the blob for `key` from the first replica that has it.
    ///
    /// Replicas are tried in the order the lookup returned them. Failures are
    /// collected and only reported if no replica produces data.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>, TapestryError> {
        let replicas = self.lookup(key).await?;
        if replicas.is_empty() {
            return Err(TapestryError::NoReplicas(key.to_string()));
        }

        let mut errors = Vec::new();
        for replica in &replicas {
            match self.transport.fetch_blob(replica, key).await {
                Ok(Some(blob)) => return Ok(blob),
                Ok(None) => tracing::debug!("Replica {} holds no copy of {}", replica, key),
                Err(e) => {
                    tracing::debug!("Fetching {} from {} failed: {}", key, replica, e);
                    errors.push(format!("{}: {}", replica, e));
                }
            }
        }

        Err(TapestryError::ReplicasFailed {
            key: key.to_string(),
            replicas,
            errors,
        })
    }

    /// Drops the local copy and stops advertising it.
    ///
    /// The root's entry is not withdrawn; it lapses once republishing has stopped
    /// for one registration timeout.
    pub fn remove(&self, key: &str) -> bool {
        self.blobs.delete(key)
    }

    /// Leaves gracefully: hands directory state to the remaining members, then shuts down.
    pub async fn leave(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.router.leave().await;
        self.shutdown().await;
        tracing::info!("{} left", self);
    }

    /// Shuts down without handing off any state.
    pub async fn kill(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown().await;
        tracing::info!("{} killed", self);
    }

    async fn shutdown(&self) {
        self.blobs.clear();

        let lifecycle = self.lifecycle.lock().take();
        let Some(lifecycle) = lifecycle else {
            return;
        };

        lifecycle.reaper.abort();
        let _ = lifecycle.shutdown.send(());
        let mut server = lifecycle.server;
        if tokio::time::timeout(self.shutdown_grace, &mut server)
            .await
            .is_err()
        {
            tracing::warn!("RPC server did not drain in {:?}, aborting", self.shutdown_grace);
            server.abort();
        }
    }
}

impl fmt::Display for Tapestry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tapestry node {} at {}", self.local.id, self.local.address)
    }
}
