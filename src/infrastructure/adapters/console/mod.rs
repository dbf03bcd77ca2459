//! Console transport for development/testing
//!
//! Each stdin line arrives as a message from a local operator; everything the
//! bot sends is printed.

use async_trait::async_trait;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::{Channel, Embed, GatewayEvent, Guild, Member, Message, User};
use crate::domain::traits::Transport;

const CONSOLE_CHANNEL: &str = "console";

/// Console transport for local development
pub struct ConsoleTransport {
    user: User,
    operator: User,
    operator_roles: Vec<String>,
    guild: Guild,
    channels: Vec<Channel>,
    nickname: Mutex<Option<String>>,
}

impl ConsoleTransport {
    /// A single guild `guild_id` holding a console channel plus `channel_names`
    pub fn new(guild_id: impl Into<String>, channel_names: &[String]) -> Self {
        let guild = Guild::new(guild_id, "console");
        let mut channels = vec![Channel::new(CONSOLE_CHANNEL, CONSOLE_CHANNEL, guild.id.clone())];
        for name in channel_names {
            channels.push(Channel::new(format!("console-{}", name), name.clone(), guild.id.clone()));
        }

        Self {
            user: User::new("botty", "botty").bot(),
            operator: User::new("operator", "operator"),
            operator_roles: Vec::new(),
            guild,
            channels,
            nickname: Mutex::new(None),
        }
    }

    /// Roles the console operator holds
    pub fn with_operator_roles(mut self, roles: Vec<String>) -> Self {
        self.operator_roles = roles;
        self
    }

    pub fn nickname(&self) -> Option<String> {
        self.nickname.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn operator_message(&self, text: String) -> Message {
        let mut member = Member::new(self.guild.id.clone(), self.operator.clone());
        member.roles = self.operator_roles.clone();
        Message::new(CONSOLE_CHANNEL, self.operator.clone(), text).with_member(member)
    }

    fn channel_name(&self, channel_id: &str) -> String {
        self.channels
            .iter()
            .find(|c| c.id == channel_id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| channel_id.to_string())
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn login(&self, _token: &str) -> Result<mpsc::Receiver<GatewayEvent>, BotError> {
        tracing::info!("Starting console transport (dev mode)");
        let (tx, rx) = mpsc::channel(64);

        // Lines are turned into messages on the reader task; the transport
        // itself is not moved there.
        let template = self.operator_message(String::new());

        tokio::spawn(async move {
            if tx.send(GatewayEvent::Connect).await.is_err() || tx.send(GatewayEvent::Ready).await.is_err() {
                return;
            }

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        let mut message = template.clone();
                        message.id = uuid::Uuid::new_v4().to_string();
                        message.timestamp = chrono::Utc::now();
                        message.content = line.to_string();
                        if tx.send(GatewayEvent::Message(message)).await.is_err() {
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(GatewayEvent::Error(format!("stdin: {}", e))).await;
                        break;
                    }
                }
            }
            let _ = tx.send(GatewayEvent::Disconnect).await;
        });

        Ok(rx)
    }

    async fn reply(&self, message: &Message, text: &str) -> Result<(), BotError> {
        println!("[BOT] @{}, {}", message.author.username, text);
        Ok(())
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), BotError> {
        println!("[BOT #{}] {}", self.channel_name(channel_id), text);
        Ok(())
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<(), BotError> {
        println!("[BOT #{}] == {} ==", self.channel_name(channel_id), embed.title);
        println!("{}", embed.description);
        if let Some(url) = &embed.url {
            println!("  [Link] {}", url);
        }
        Ok(())
    }

    async fn set_nickname(&self, guild_id: &str, nickname: &str) -> Result<(), BotError> {
        if guild_id != self.guild.id {
            return Err(BotError::NotFound(format!("guild {}", guild_id)));
        }
        *self.nickname.lock().unwrap_or_else(|e| e.into_inner()) = Some(nickname.to_string());
        tracing::info!("Nickname set to {}", nickname);
        Ok(())
    }

    async fn guild(&self, guild_id: &str) -> Result<Option<Guild>, BotError> {
        Ok((guild_id == self.guild.id).then(|| self.guild.clone()))
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
