//! Ready gate - run callbacks now if connected, otherwise once the ready signal arrives

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Mutex;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::application::errors::BotError;

/// Deferred work waiting for the connection to become ready
pub type ReadyCallback = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), BotError>> + Send>;

/// Wrap an async closure as a [`ReadyCallback`]
pub fn ready_callback<F, Fut>(f: F) -> ReadyCallback
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), BotError>> + Send + 'static,
{
    Box::new(move || f().boxed())
}

enum GateState {
    Pending(Vec<(String, ReadyCallback)>),
    Ready,
}

/// Two-state gate. Callbacks queued while pending are drained exactly once
/// when the gate opens; later callbacks run immediately.
pub struct ReadyGate {
    state: Mutex<GateState>,
}

impl ReadyGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Pending(Vec::new())),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.lock().unwrap_or_else(|e| e.into_inner()), GateState::Ready)
    }

    /// Number of callbacks still waiting
    pub fn pending(&self) -> usize {
        match &*self.state.lock().unwrap_or_else(|e| e.into_inner()) {
            GateState::Pending(queue) => queue.len(),
            GateState::Ready => 0,
        }
    }

    /// Run `callback` now if the gate is open, otherwise queue it
    pub async fn on_ready(&self, label: impl Into<String>, callback: ReadyCallback) {
        let label = label.into();
        let run_now = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            match &mut *state {
                GateState::Pending(queue) => {
                    queue.push((label, callback));
                    None
                }
                GateState::Ready => Some((label, callback)),
            }
        };

        if let Some((label, callback)) = run_now {
            run(&label, callback).await;
        }
    }

    /// Open the gate and drain the queue in registration order.
    ///
    /// Opening an already open gate does nothing. Returns how many queued
    /// callbacks ran.
    pub async fn open(&self) -> usize {
        let drained = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            match std::mem::replace(&mut *state, GateState::Ready) {
                GateState::Pending(queue) => queue,
                GateState::Ready => Vec::new(),
            }
        };

        let count = drained.len();
        for (label, callback) in drained {
            run(&label, callback).await;
        }
        count
    }
}

impl Default for ReadyGate {
    fn default() -> Self {
        Self::new()
    }
}

async fn run(label: &str, callback: ReadyCallback) {
    match AssertUnwindSafe(callback()).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("[{}] ready callback failed: {}", label, e),
        Err(_) => tracing::error!("[{}] ready callback panicked", label),
    }
}
