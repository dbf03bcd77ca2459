//! Event plumbing - raw event bus, per-extension subscription bookkeeping, ready gate

pub mod emitter;
pub mod tracker;
pub mod ready;

pub use emitter::{listener, EventEmitter, Listener, ListenerId};
pub use tracker::SubscriptionTracker;
pub use ready::{ready_callback, ReadyCallback, ReadyGate};
