//! Command dispatcher - Routes prefixed messages to registered handlers

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tokio::task::JoinSet;

use crate::application::errors::BotError;
use crate::domain::entities::{CommandHolder, CommandRegistry, Message};
use crate::domain::traits::Transport;
use super::parser::CommandParser;

/// Reserved command word that lists every registered command
pub const HELP: &str = "help";

/// What to do with one inbound message
pub enum Dispatch {
    /// Sent by a bot, or not a command
    Ignored,
    /// Reply with the help listing
    Help(String),
    /// Invoke every matching holder; may be empty
    Commands {
        word: String,
        args: Vec<String>,
        holders: Vec<CommandHolder>,
    },
}

/// Routes messages through the command registry
pub struct CommandDispatcher {
    parser: CommandParser,
    registry: Arc<CommandRegistry>,
    ignore_bots: bool,
    /// Handler invocations still running
    tasks: Mutex<JoinSet<()>>,
}

impl CommandDispatcher {
    pub fn new(prefix: impl Into<String>, registry: Arc<CommandRegistry>) -> Self {
        Self {
            parser: CommandParser::new(prefix),
            registry,
            ignore_bots: true,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Also ignore bot accounts other than our own (on by default)
    pub fn with_ignore_bots(mut self, ignore: bool) -> Self {
        self.ignore_bots = ignore;
        self
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Decide what a message should trigger
    pub fn route(&self, message: &Message, self_id: &str) -> Dispatch {
        if message.author.id == self_id || (self.ignore_bots && message.author.is_bot) {
            return Dispatch::Ignored;
        }

        let Some(parsed) = self.parser.parse(&message.content) else {
            return Dispatch::Ignored;
        };

        if parsed.word == HELP {
            return Dispatch::Help(self.registry.help_text());
        }

        let holders = self.registry.matching(&parsed.word);
        Dispatch::Commands {
            word: parsed.word,
            args: parsed.args,
            holders,
        }
    }

    /// Route and execute. Returns how many handlers were started.
    ///
    /// Filtering, parsing and `help` happen before this returns. Each matching
    /// holder's handler is started in registration order on its own task, so a
    /// handler that waits never holds up later events. A failing handler is
    /// logged and does not affect the others.
    pub async fn dispatch(&self, message: &Message, transport: &Arc<dyn Transport>) -> Result<usize, BotError> {
        let self_id = transport.bot_user().id;

        match self.route(message, &self_id) {
            Dispatch::Ignored => Ok(0),
            Dispatch::Help(text) => {
                tracing::debug!("[{}] help requested", message.channel_id);
                transport.reply(message, &text).await?;
                Ok(0)
            }
            Dispatch::Commands { word, args, holders } => {
                if holders.is_empty() {
                    tracing::debug!("[{}] no handler for '{}'", message.channel_id, word);
                }
                let count = holders.len();
                self.spawn_handlers(message, &word, &args, holders);
                Ok(count)
            }
        }
    }

    fn spawn_handlers(&self, message: &Message, word: &str, args: &[String], holders: Vec<CommandHolder>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        // Reap finished invocations
        while tasks.try_join_next().is_some() {}

        for holder in holders {
            let message = message.clone();
            let word = word.to_string();
            let args = args.to_vec();
            tasks.spawn(async move {
                let call = holder.handler.on_command(&message, &word, &args);
                match AssertUnwindSafe(call).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!("Command '{}' failed: {}", word, e),
                    Err(_) => tracing::error!("Command '{}' panicked", word),
                }
            });
        }
    }

    /// Wait until every handler started so far has returned
    pub async fn wait_idle(&self) {
        loop {
            let mut running = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(|e| e.into_inner()));
            if running.is_empty() {
                break;
            }
            while running.join_next().await.is_some() {}
        }
    }
}
