use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to the republish loop that keeps one key advertised at its root.
///
/// Republishing runs until the handle is dropped. The blob store owns it, so
/// deleting (or replacing) a blob stops advertising it.
pub struct Publication {
    ready: watch::Receiver<bool>,
    republisher: Option<JoinHandle<()>>,
}

impl Publication {
    pub fn new(ready: watch::Receiver<bool>, republisher: JoinHandle<()>) -> Self {
        Self {
            ready,
            republisher: Some(republisher),
        }
    }

    /// A publication with no background loop that is already registered.
    pub fn published() -> Self {
        let (_, ready) = watch::channel(true);
        Self {
            ready,
            republisher: None,
        }
    }

    pub fn ready_signal(&self) -> ReadySignal {
        ReadySignal {
            ready: self.ready.clone(),
        }
    }
}

impl Drop for Publication {
    fn drop(&mut self) {
        if let Some(republisher) = self.republisher.take() {
            republisher.abort();
        }
    }
}

/// Fires once the first registration round-trip at the key's root has succeeded.
///
/// There is no cancel: callers that stop caring simply drop it.
#[derive(Clone, Debug)]
pub struct ReadySignal {
    ready: watch::Receiver<bool>,
}

impl ReadySignal {
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Waits for the first successful publish. Returns `false` if publishing
    /// stopped before it ever succeeded.
    pub async fn wait(&mut self) -> bool {
        self.ready.wait_for(|ready| *ready).await.is_ok()
    }
}
