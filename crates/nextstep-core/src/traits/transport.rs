//! Events emitted by the transport layer.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::state::Generation;

/// A transport-level observation the session state reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// The service answered 401 to a request that carried the credential of
    /// the given generation.
    CredentialRejected { generation: Generation },
}

/// Observer of transport events.
pub trait TransportListener: Send + Sync {
    fn on_transport_event(&self, event: &TransportEvent);
}

impl<F> TransportListener for F
where
    F: Fn(&TransportEvent) + Send + Sync,
{
    fn on_transport_event(&self, event: &TransportEvent) {
        self(event)
    }
}

/// Fan-out hub between the transport layer and its observers.
///
/// Cheap to clone; clones share the listener list.
#[derive(Clone, Default)]
pub struct TransportEvents {
    listeners: Arc<RwLock<Vec<Arc<dyn TransportListener>>>>,
}

impl TransportEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn TransportListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Deliver an event to every listener before returning.
    pub fn emit(&self, event: TransportEvent) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        trace!(?event, listeners = listeners.len(), "transport event");
        for listener in listeners {
            listener.on_transport_event(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for TransportEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn emit_reaches_every_listener() {
        let events = TransportEvents::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = hits.clone();
            events.subscribe(Arc::new(move |_: &TransportEvent| {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }

        events.emit(TransportEvent::CredentialRejected {
            generation: Generation::default(),
        });

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(events.listener_count(), 3);
    }
}
