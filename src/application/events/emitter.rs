//! Event emitter - fans raw transport events out to listeners

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::application::errors::{BotError, EmitterError};
use crate::domain::entities::{EventKind, GatewayEvent};

/// Listener callback. Each invocation owns its copy of the event.
pub type Listener = Arc<dyn Fn(GatewayEvent) -> BoxFuture<'static, Result<(), BotError>> + Send + Sync>;

/// Wrap an async closure as a [`Listener`]
pub fn listener<F, Fut>(f: F) -> Listener
where
    F: Fn(GatewayEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BotError>> + Send + 'static,
{
    Arc::new(move |event| f(event).boxed())
}

/// Handle returned by [`EventEmitter::on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

struct Entry {
    id: ListenerId,
    kind: EventKind,
    label: String,
    listener: Listener,
}

/// Raw-event bus owned by the bot shell
pub struct EventEmitter {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener for one event kind. `label` names it in logs.
    pub fn on(&self, kind: EventKind, label: impl Into<String>, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(Entry {
            id,
            kind,
            label: label.into(),
            listener,
        });
        id
    }

    /// Remove a listener previously returned by [`on`](Self::on)
    pub fn off(&self, kind: EventKind, id: ListenerId) -> Result<(), EmitterError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.iter().position(|e| e.id == id && e.kind == kind) {
            Some(index) => {
                entries.remove(index);
                Ok(())
            }
            None => Err(EmitterError::UnknownListener { kind, id: id.0 }),
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    /// Run every listener for the event's kind in registration order.
    ///
    /// Listeners are isolated: an `Err` or a panic is logged and the next
    /// listener still runs. Returns how many listeners were invoked.
    pub async fn emit(&self, event: &GatewayEvent) -> usize {
        let kind = event.kind();
        let snapshot: Vec<(String, Listener)> = {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| (e.label.clone(), e.listener.clone()))
                .collect()
        };

        for (label, listener) in &snapshot {
            match AssertUnwindSafe(listener(event.clone())).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("[{}] {} listener failed: {}", label, kind, e),
                Err(_) => tracing::error!("[{}] {} listener panicked", label, kind),
            }
        }
        snapshot.len()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
