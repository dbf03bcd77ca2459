//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use tokio::sync::mpsc;

use botty::application::errors::{BotError, CommandError};
use botty::application::shell::BotShell;
use botty::domain::entities::{
    Channel, CommandHandler, Embed, GatewayEvent, Guild, Member, Message, User,
};
use botty::domain::traits::Transport;
use botty::infrastructure::config::{PersonalSettings, SharedSettings};

pub const GUILD: &str = "guild-1";
pub const BOT_ID: &str = "bot-1";

static INIT: Once = Once::new();

pub fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Transport that records everything the bot sends
pub struct MockTransport {
    user: User,
    guilds: Vec<Guild>,
    channels: Vec<Channel>,
    script: Mutex<Vec<GatewayEvent>>,
    pub replies: Mutex<Vec<(String, String)>>,
    pub sent: Mutex<Vec<(String, String)>>,
    pub embeds: Mutex<Vec<(String, Embed)>>,
    pub nicknames: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            user: User::new(BOT_ID, "botty").bot(),
            guilds: vec![Guild::new(GUILD, "Test Guild")],
            channels: vec![Channel::new("chan-announce", "announcements", GUILD)],
            script: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            embeds: Mutex::new(Vec::new()),
            nicknames: Mutex::new(Vec::new()),
        }
    }

    /// Events delivered, in order, by the next login
    pub fn with_script(self, events: Vec<GatewayEvent>) -> Self {
        *self.script.lock().unwrap() = events;
        self
    }

    pub fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn nicknames(&self) -> Vec<(String, String)> {
        self.nicknames.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn login(&self, _token: &str) -> Result<mpsc::Receiver<GatewayEvent>, BotError> {
        let events: Vec<GatewayEvent> = std::mem::take(&mut *self.script.lock().unwrap());
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            tx.send(event).await.map_err(|e| BotError::Network(e.to_string()))?;
        }
        Ok(rx)
    }

    async fn reply(&self, message: &Message, text: &str) -> Result<(), BotError> {
        self.replies.lock().unwrap().push((message.author.id.clone(), text.to_string()));
        Ok(())
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), BotError> {
        self.sent.lock().unwrap().push((channel_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<(), BotError> {
        self.embeds.lock().unwrap().push((channel_id.to_string(), embed.clone()));
        Ok(())
    }

    async fn set_nickname(&self, guild_id: &str, nickname: &str) -> Result<(), BotError> {
        self.nicknames.lock().unwrap().push((guild_id.to_string(), nickname.to_string()));
        Ok(())
    }

    async fn guild(&self, guild_id: &str) -> Result<Option<Guild>, BotError> {
        Ok(self.guilds.iter().find(|g| g.id == guild_id).cloned())
    }

    async fn find_channel(&self, guild_id: &str, name: &str) -> Result<Option<Channel>, BotError> {
        Ok(self
            .channels
            .iter()
            .find(|c| c.guild_id == guild_id && c.name == name)
            .cloned())
    }

    fn bot_user(&self) -> User {
        self.user.clone()
    }
}

/// Records every invocation and answers with a fixed reply
pub struct RecordingHandler {
    pub reply: Option<String>,
    pub fail: bool,
    pub calls: Mutex<Vec<(String, Vec<String>)>>,
    pub ready_calls: Mutex<usize>,
    transport: Mutex<Option<Arc<dyn Transport>>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Self::build(None, false)
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::build(Some(text.to_string()), false)
    }

    pub fn failing() -> Arc<Self> {
        Self::build(None, true)
    }

    fn build(reply: Option<String>, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            reply,
            fail,
            calls: Mutex::new(Vec::new()),
            ready_calls: Mutex::new(0),
            transport: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ready_calls(&self) -> usize {
        *self.ready_calls.lock().unwrap()
    }
}

#[async_trait]
impl CommandHandler for RecordingHandler {
    fn on_ready(&self, transport: &Arc<dyn Transport>) {
        *self.ready_calls.lock().unwrap() += 1;
        *self.transport.lock().unwrap() = Some(transport.clone());
    }

    async fn on_command(&self, message: &Message, command: &str, args: &[String]) -> Result<(), CommandError> {
        self.calls.lock().unwrap().push((command.to_string(), args.to_vec()));
        if self.fail {
            return Err(CommandError::ExecutionFailed("boom".to_string()));
        }
        let transport = self.transport.lock().unwrap().clone();
        if let (Some(reply), Some(transport)) = (&self.reply, transport) {
            transport.reply(message, reply).await?;
        }
        Ok(())
    }
}

pub fn settings() -> SharedSettings {
    let mut shared = SharedSettings::default();
    shared.server = GUILD.to_string();
    shared.info.allowed_roles = vec!["admin".to_string()];
    shared
}

pub fn shell_with(transport: Arc<MockTransport>, shared: SharedSettings) -> Arc<BotShell> {
    ensure_init();
    BotShell::new(transport, Arc::new(shared), Arc::new(PersonalSettings::default()))
}

pub fn shell() -> (Arc<BotShell>, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::new());
    (shell_with(transport.clone(), settings()), transport)
}

pub fn user(id: &str) -> User {
    User::new(id, format!("user-{}", id))
}

pub fn message(author: User, content: &str) -> GatewayEvent {
    GatewayEvent::Message(Message::new("general", author, content).in_guild(GUILD))
}

pub fn admin_message(author: User, content: &str) -> GatewayEvent {
    let member = Member::new(GUILD, author.clone()).with_role("admin");
    GatewayEvent::Message(Message::new("general", author, content).with_member(member))
}
