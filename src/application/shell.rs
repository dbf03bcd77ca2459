//! Bot shell - owns the connection and the command registry, routes every inbound event

use std::future::Future;
use std::sync::Arc;

use crate::application::errors::BotError;
use crate::application::events::{listener, EventEmitter, ReadyCallback, ReadyGate};
use crate::application::messaging::{presence, CommandDispatcher};
use crate::domain::entities::{Command, CommandHandler, CommandRegistry, EventKind, GatewayEvent};
use crate::domain::traits::Transport;
use crate::infrastructure::config::{PersonalSettings, SharedSettings};

const LABEL: &str = "botty";

/// The bot shell.
///
/// Extensions hold an `Arc<BotShell>` and subscribe to its [`EventEmitter`];
/// the shell's own listeners are registered first, so they run before any
/// extension's for the same event.
pub struct BotShell {
    transport: Arc<dyn Transport>,
    emitter: Arc<EventEmitter>,
    dispatcher: CommandDispatcher,
    ready: ReadyGate,
    shared: Arc<SharedSettings>,
    personal: Arc<PersonalSettings>,
}

impl BotShell {
    pub fn new(
        transport: Arc<dyn Transport>,
        shared: Arc<SharedSettings>,
        personal: Arc<PersonalSettings>,
    ) -> Arc<Self> {
        let registry = Arc::new(CommandRegistry::new());
        let dispatcher = CommandDispatcher::new(shared.botty.prefix.clone(), registry)
            .with_ignore_bots(shared.botty.ignore_bots);

        let shell = Arc::new(Self {
            transport,
            emitter: Arc::new(EventEmitter::new()),
            dispatcher,
            ready: ReadyGate::new(),
            shared,
            personal,
        });
        tracing::info!("Successfully loaded bot settings.");

        shell.init_listeners();
        shell
    }

    /// Log in and pump transport events until the stream closes
    pub async fn start(self: &Arc<Self>) -> Result<(), BotError> {
        let mut events = self.transport.login(&self.personal.discord.key).await?;
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        tracing::warn!("Event stream closed");
        Ok(())
    }

    /// Emit one raw event to every listener for its kind
    pub async fn handle_event(&self, event: GatewayEvent) {
        self.emitter.emit(&event).await;
    }

    /// Wait for command handlers still running in the background
    pub async fn wait_for_commands(&self) {
        self.dispatcher.wait_idle().await;
    }

    /// Append one holder per command, then tell the handler it is live
    pub fn register_command(&self, commands: Vec<Command>, handler: Arc<dyn CommandHandler>) {
        let names: Vec<String> = commands.iter().flat_map(|c| c.aliases.clone()).collect();
        self.dispatcher.registry().register(commands, handler.clone());
        handler.on_ready(&self.transport);
        tracing::debug!("Registered commands: {}", names.join(", "));
    }

    /// Run `callback` now if connected, otherwise once the ready signal arrives
    pub async fn on_client_ready(&self, label: impl Into<String>, callback: ReadyCallback) {
        self.ready.on_ready(label, callback).await;
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_ready()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn emitter(&self) -> &Arc<EventEmitter> {
        &self.emitter
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        self.dispatcher.registry()
    }

    pub fn shared_settings(&self) -> &Arc<SharedSettings> {
        &self.shared
    }

    pub fn personal_settings(&self) -> &Arc<PersonalSettings> {
        &self.personal
    }

    fn init_listeners(self: &Arc<Self>) {
        let emitter = &self.emitter;

        emitter.on(EventKind::Error, LABEL, listener(|event| async move {
            if let GatewayEvent::Error(e) = event {
                tracing::error!("{}", e);
            }
            Ok(())
        }));
        emitter.on(EventKind::Warn, LABEL, listener(|event| async move {
            if let GatewayEvent::Warn(w) = event {
                tracing::warn!("{}", w);
            }
            Ok(())
        }));
        emitter.on(EventKind::Disconnect, LABEL, listener(|_| async {
            tracing::warn!("Disconnected!");
            Ok(())
        }));
        emitter.on(EventKind::Reconnecting, LABEL, listener(|_| async {
            tracing::warn!("Reconnecting...");
            Ok(())
        }));
        emitter.on(EventKind::Connect, LABEL, listener(|_| async {
            tracing::info!("Connected.");
            Ok(())
        }));

        self.bind(EventKind::Ready, |shell, _| async move {
            shell.on_connect().await;
            shell.ready.open().await;
            Ok(())
        });

        self.bind(EventKind::Message, |shell, event| async move {
            if let GatewayEvent::Message(message) = event {
                shell.dispatcher.dispatch(&message, &shell.transport).await?;
            }
            Ok(())
        });

        emitter.on(EventKind::MemberAdd, LABEL, listener(|event| async move {
            if let GatewayEvent::MemberAdd(member) = event {
                tracing::info!("{}", presence::joined(&member));
            }
            Ok(())
        }));
        emitter.on(EventKind::MemberRemove, LABEL, listener(|event| async move {
            if let GatewayEvent::MemberRemove(member) = event {
                tracing::info!("{}", presence::left(&member));
            }
            Ok(())
        }));
        emitter.on(EventKind::MemberUpdate, LABEL, listener(|event| async move {
            if let GatewayEvent::MemberUpdate { old, new } = event {
                for line in presence::member_changes(&old, &new) {
                    tracing::info!("{}", line);
                }
            }
            Ok(())
        }));

        tracing::info!("Initialised listeners.");
    }

    /// Register a listener that needs the shell. Holds only a weak reference.
    fn bind<F, Fut>(self: &Arc<Self>, kind: EventKind, f: F)
    where
        F: Fn(Arc<Self>, GatewayEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BotError>> + Send + 'static,
    {
        let weak = Arc::downgrade(self);
        let f = Arc::new(f);
        self.emitter.on(kind, LABEL, listener(move |event| {
            let weak = weak.clone();
            let f = f.clone();
            async move {
                match weak.upgrade() {
                    Some(shell) => f(shell, event).await,
                    None => Ok(()),
                }
            }
        }));
    }

    /// Resolve the configured guild and set our nickname there
    async fn on_connect(&self) {
        tracing::info!("Bot is logged in and ready.");

        let server = &self.shared.server;
        let guild = match self.transport.guild(server).await {
            Ok(Some(guild)) => guild,
            Ok(None) => {
                tracing::error!("Incorrect setting for the server: {}", server);
                return;
            }
            Err(e) => {
                tracing::error!("Failed to resolve server {}: {}", server, e);
                return;
            }
        };

        if let Err(e) = self.transport.set_nickname(&guild.id, &self.shared.botty.nickname).await {
            tracing::error!("Failed to set nickname in {}: {}", guild.name, e);
        }
    }
}
