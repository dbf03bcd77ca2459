use std::sync::{Arc, RwLock};
use async_trait::async_trait;

use crate::application::errors::CommandError;
use crate::domain::entities::Message;
use crate::domain::traits::Transport;

/// Represents a bot command: one or more aliases sharing a description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub aliases: Vec<String>,
    pub description: String,
}

impl Command {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            aliases: vec![alias.into()],
            description: String::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        if !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Case-sensitive alias match
    pub fn matches(&self, word: &str) -> bool {
        self.aliases.iter().any(|a| a == word)
    }

    /// `alias1,alias2: description`
    pub fn help_line(&self) -> String {
        format!("{}: {}", self.aliases.join(","), self.description)
    }
}

/// Executes the commands it was registered for
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Called once per registration batch, before any command can fire
    fn on_ready(&self, transport: &Arc<dyn Transport>);

    /// Called for every message whose command word matched one of the aliases
    async fn on_command(&self, message: &Message, command: &str, args: &[String]) -> Result<(), CommandError>;
}

/// A command paired with the handler responsible for it
#[derive(Clone)]
pub struct CommandHolder {
    pub command: Command,
    pub handler: Arc<dyn CommandHandler>,
}

/// Append-only list of command holders.
///
/// Registration order is help order and fan-out order. Aliases may collide;
/// every matching holder is returned.
#[derive(Default)]
pub struct CommandRegistry {
    holders: RwLock<Vec<CommandHolder>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, commands: Vec<Command>, handler: Arc<dyn CommandHandler>) {
        let mut holders = self.holders.write().unwrap_or_else(|e| e.into_inner());
        for command in commands {
            holders.push(CommandHolder {
                command,
                handler: handler.clone(),
            });
        }
    }

    /// Every holder whose aliases contain `word`, in registration order
    pub fn matching(&self, word: &str) -> Vec<CommandHolder> {
        self.holders
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|h| h.command.matches(word))
            .cloned()
            .collect()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.holders
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|h| h.command.clone())
            .collect()
    }

    /// One line per holder, registration order
    pub fn help_text(&self) -> String {
        let mut help = String::new();
        for command in self.commands() {
            help.push_str(&command.help_line());
            help.push('\n');
        }
        help
    }

    pub fn len(&self) -> usize {
        self.holders.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
