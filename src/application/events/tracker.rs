//! Subscription tracker - remembers what an extension subscribed to

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::FutureExt;

use crate::application::errors::TeardownError;
use crate::domain::entities::EventKind;
use super::emitter::{EventEmitter, Listener, ListenerId};

struct Subscription {
    emitter: Arc<EventEmitter>,
    kind: EventKind,
    id: ListenerId,
    active: Arc<AtomicBool>,
}

/// Ordered record of `(emitter, kind, listener)` bindings owned by one extension
pub struct SubscriptionTracker {
    owner: String,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl SubscriptionTracker {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Register `listener` on `emitter` and record the binding.
    ///
    /// The registered callback goes inert as soon as the binding is removed,
    /// even if an in-progress emit already holds it.
    pub fn add_event_listener(&self, emitter: &Arc<EventEmitter>, kind: EventKind, listener: Listener) -> ListenerId {
        let active = Arc::new(AtomicBool::new(true));
        let guard = active.clone();
        let wrapped: Listener = Arc::new(move |event| {
            if guard.load(Ordering::Acquire) {
                listener(event)
            } else {
                async { Ok(()) }.boxed()
            }
        });

        let id = emitter.on(kind, self.owner.clone(), wrapped);
        self.subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Subscription {
                emitter: emitter.clone(),
                kind,
                id,
                active,
            });
        id
    }

    /// Remove every recorded binding and clear the list.
    ///
    /// All removals are attempted; failures come back as one aggregated error.
    pub fn remove_registered_event_listeners(&self) -> Result<(), TeardownError> {
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock().unwrap_or_else(|e| e.into_inner()));

        let mut failures = Vec::new();
        for sub in subscriptions {
            sub.active.store(false, Ordering::Release);
            if let Err(e) = sub.emitter.off(sub.kind, sub.id) {
                failures.push(e);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TeardownError { failures })
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }
}
