//! Change notification: fire-and-forget fan-out of changed resource identifiers.

use crate::uri::ResourceUri;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Receives the identifier of every successful mutation. Must never fail the caller.
pub trait ChangeNotifier: Send + Sync {
    fn notify(&self, uri: &ResourceUri);
}

/// Broadcast bus for changed identifiers.
#[derive(Clone, Debug)]
pub struct ChangeBus {
    tx: broadcast::Sender<ResourceUri>,
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Observe changes equal to or beneath `uri`.
    pub fn subscribe(&self, uri: ResourceUri) -> ChangeSubscription {
        ChangeSubscription {
            watched: uri,
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        ChangeBus::new(256)
    }
}

impl ChangeNotifier for ChangeBus {
    fn notify(&self, uri: &ResourceUri) {
        // No subscribers is not an error.
        if self.tx.send(uri.clone()).is_err() {
            tracing::trace!(uri = %uri, "change notification had no subscribers");
        }
    }
}

/// Notifier that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn notify(&self, _uri: &ResourceUri) {}
}

pub struct ChangeSubscription {
    watched: ResourceUri,
    rx: broadcast::Receiver<ResourceUri>,
}

impl ChangeSubscription {
    pub fn watched(&self) -> &ResourceUri {
        &self.watched
    }

    /// Next change at or beneath the watched uri. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<ResourceUri> {
        loop {
            match self.rx.recv().await {
                Ok(uri) if uri.is_same_or_descendant_of(&self.watched) => return Some(uri),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(watched = %self.watched, skipped, "change subscription lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<ResourceUri> {
        loop {
            match self.rx.try_recv() {
                Ok(uri) if uri.is_same_or_descendant_of(&self.watched) => return Some(uri),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
