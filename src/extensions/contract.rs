//! Extension contract - the lifecycle every feature module shares

use std::sync::{Arc, Mutex};

use crate::application::errors::{ExtensionError, TeardownError};
use crate::application::events::{ready_callback, Listener, ListenerId, ReadyCallback, SubscriptionTracker};
use crate::application::shell::BotShell;
use crate::domain::entities::EventKind;
use crate::infrastructure::config::{PersonalSettings, SharedSettings};

/// Where an extension is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Built, may still be loading data
    Constructed,
    /// Subscribed, waiting for the connection
    PendingReady,
    /// Connection is up and the extension reacts to events
    Active,
    /// Torn down; never comes back
    Disabled,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Constructed => "constructed",
            LifecycleState::PendingReady => "pending-ready",
            LifecycleState::Active => "active",
            LifecycleState::Disabled => "disabled",
        }
    }
}

/// Cloneable view of an extension's state for spawned continuations.
///
/// Work that resumes after an await checks [`is_alive`](Self::is_alive)
/// before touching shared state; a disabled extension's late results are
/// dropped.
#[derive(Clone)]
pub struct Liveness {
    state: Arc<Mutex<LifecycleState>>,
}

impl Liveness {
    pub fn is_alive(&self) -> bool {
        self.state() != LifecycleState::Disabled
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn advance(&self, to: LifecycleState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        // Only ever moves forward; Disabled is terminal
        let rank = |s: LifecycleState| match s {
            LifecycleState::Constructed => 0,
            LifecycleState::PendingReady => 1,
            LifecycleState::Active => 2,
            LifecycleState::Disabled => 3,
        };
        if rank(to) > rank(*state) {
            *state = to;
        }
    }
}

/// State every extension embeds: the shell, both settings, and its subscriptions
pub struct ExtensionBase {
    name: String,
    bot: Arc<BotShell>,
    shared: Arc<SharedSettings>,
    personal: Arc<PersonalSettings>,
    tracker: SubscriptionTracker,
    liveness: Liveness,
}

impl ExtensionBase {
    pub fn new(
        name: impl Into<String>,
        bot: Arc<BotShell>,
        shared: Arc<SharedSettings>,
        personal: Arc<PersonalSettings>,
    ) -> Self {
        let name = name.into();
        Self {
            tracker: SubscriptionTracker::new(name.clone()),
            name,
            bot,
            shared,
            personal,
            liveness: Liveness {
                state: Arc::new(Mutex::new(LifecycleState::Constructed)),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bot(&self) -> &Arc<BotShell> {
        &self.bot
    }

    pub fn shared_settings(&self) -> &SharedSettings {
        &self.shared
    }

    pub fn personal_settings(&self) -> &PersonalSettings {
        &self.personal
    }

    pub fn state(&self) -> LifecycleState {
        self.liveness.state()
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn is_disabled(&self) -> bool {
        !self.liveness.is_alive()
    }

    /// Subscribe to a raw shell event through the tracker
    pub fn add_event_listener(&self, kind: EventKind, listener: Listener) -> Result<ListenerId, ExtensionError> {
        if self.is_disabled() {
            return Err(ExtensionError::Disabled(self.name.clone()));
        }
        let id = self.tracker.add_event_listener(self.bot.emitter(), kind, listener);
        self.liveness.advance(LifecycleState::PendingReady);
        Ok(id)
    }

    /// Run `callback` once the connection is ready (now, if it already is).
    ///
    /// The extension becomes Active when the callback runs. Callbacks still
    /// queued when the extension is disabled are dropped.
    pub async fn on_client_ready(&self, callback: ReadyCallback) {
        let liveness = self.liveness.clone();
        let name = self.name.clone();
        liveness.advance(LifecycleState::PendingReady);

        let guarded = ready_callback(move || async move {
            if !liveness.is_alive() {
                tracing::debug!("[{}] disabled before ready, skipping", name);
                return Ok(());
            }
            liveness.advance(LifecycleState::Active);
            callback().await
        });
        self.bot.on_client_ready(self.name.clone(), guarded).await;
    }

    pub fn remove_registered_event_listeners(&self) -> Result<(), TeardownError> {
        self.tracker.remove_registered_event_listeners()
    }

    /// Number of live subscriptions
    pub fn subscriptions(&self) -> usize {
        self.tracker.len()
    }

    /// Mark disabled and remove every subscription. Calling it again is a no-op.
    pub fn disable(&self) -> Result<(), ExtensionError> {
        if self.is_disabled() {
            return Ok(());
        }
        self.liveness.advance(LifecycleState::Disabled);
        tracing::info!("Disabling {} extension.", self.name);

        self.remove_registered_event_listeners()
            .map_err(|source| ExtensionError::Teardown {
                name: self.name.clone(),
                source,
            })
    }
}

/// Core extension trait that all feature modules implement
pub trait Extension: Send + Sync {
    fn base(&self) -> &ExtensionBase;

    /// Unique identifier for the extension
    fn name(&self) -> &str {
        self.base().name()
    }

    fn state(&self) -> LifecycleState {
        self.base().state()
    }

    /// Release every subscription. Safe to call more than once.
    fn disable(&self) -> Result<(), ExtensionError> {
        self.base().disable()
    }
}
