use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::{Channel, Embed, GatewayEvent, Guild, Message, User};

/// Transport trait - abstraction for the chat platform connection
#[async_trait]
pub trait Transport: Send + Sync {
    /// Log in and start receiving events
    async fn login(&self, token: &str) -> Result<mpsc::Receiver<GatewayEvent>, BotError>;

    /// Reply in the conversation the message came from
    async fn reply(&self, message: &Message, text: &str) -> Result<(), BotError>;

    /// Send a message to a channel
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), BotError>;

    /// Send a rich embed to a channel
    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<(), BotError>;

    /// Set the bot's own nickname within a guild
    async fn set_nickname(&self, guild_id: &str, nickname: &str) -> Result<(), BotError>;

    /// Resolve a guild by id
    async fn guild(&self, guild_id: &str) -> Result<Option<Guild>, BotError>;

    /// Resolve a channel by name within a guild
    async fn find_channel(&self, guild_id: &str, name: &str) -> Result<Option<Channel>, BotError>;

    /// The account the bot is logged in as
    fn bot_user(&self) -> User;
}
