//! Info extension - admin-curated snippets fetched with `!info <key>`

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::application::errors::BotError;
use crate::application::events::{listener, ready_callback};
use crate::application::shell::BotShell;
use crate::domain::entities::{EventKind, GatewayEvent, Message};
use crate::domain::traits::{load_record, save_record, Store};
use crate::infrastructure::config::{PersonalSettings, SharedSettings};
use super::contract::{Extension, ExtensionBase};

const STORE_KEY: &str = "info";

/// One stored snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoData {
    pub command: String,
    pub message: String,
}

/// What an info message asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoRequest {
    Add { key: String, text: String },
    Remove { key: String },
    List,
    Fetch { key: String },
}

/// Parse `!info <sub> ...` or the glued form `!info<sub> ...`.
///
/// Accepts `!` or `/` as prefix regardless of the bot's command prefix.
pub fn parse_request(command: &str, content: &str) -> Option<InfoRequest> {
    let split: Vec<&str> = content.split_whitespace().collect();
    let first = split.first()?;
    let word = first.strip_prefix('!').or_else(|| first.strip_prefix('/'))?;
    let glued = word.strip_prefix(command)?;

    // `!info add` vs `!infoadd`
    let (sub, next) = if glued.is_empty() {
        (split.get(1).copied(), 2)
    } else {
        (Some(glued), 1)
    };

    match sub? {
        "add" => {
            if split.len() <= next + 1 {
                return None;
            }
            Some(InfoRequest::Add {
                key: split[next].to_string(),
                text: split[next + 1..].join(" "),
            })
        }
        "remove" => split.get(next).map(|key| InfoRequest::Remove { key: key.to_string() }),
        "list" => Some(InfoRequest::List),
        key => Some(InfoRequest::Fetch { key: key.to_string() }),
    }
}

/// Info extension
pub struct Info {
    base: ExtensionBase,
    command: String,
    allowed_roles: Vec<String>,
    store: Arc<dyn Store>,
    infos: Mutex<Vec<InfoData>>,
}

impl Info {
    pub async fn load(
        bot: Arc<BotShell>,
        shared: Arc<SharedSettings>,
        personal: Arc<PersonalSettings>,
        store: Arc<dyn Store>,
    ) -> Result<Arc<Self>, BotError> {
        tracing::info!("Requested Info extension..");
        let infos: Vec<InfoData> = load_record(store.as_ref(), STORE_KEY).await?;
        tracing::info!("Successfully loaded info file.");

        let info = Arc::new(Self {
            command: shared.info.command.clone(),
            allowed_roles: shared.info.allowed_roles.clone(),
            base: ExtensionBase::new("info", bot, shared, personal),
            store,
            infos: Mutex::new(infos),
        });

        info.base
            .on_client_ready(ready_callback(|| async {
                tracing::info!("Info extension loaded.");
                Ok(())
            }))
            .await;

        let weak = Arc::downgrade(&info);
        info.base.add_event_listener(EventKind::Message, listener(move |event| {
            let weak = weak.clone();
            async move {
                if let (Some(info), GatewayEvent::Message(message)) = (weak.upgrade(), event) {
                    info.on_info(&message).await?;
                }
                Ok(())
            }
        }))?;

        Ok(info)
    }

    async fn on_info(&self, message: &Message) -> Result<(), BotError> {
        if message.author.is_bot {
            return Ok(());
        }
        let Some(request) = parse_request(&self.command, &message.content) else {
            return Ok(());
        };

        if matches!(request, InfoRequest::Add { .. } | InfoRequest::Remove { .. }) && !self.is_allowed(message) {
            return Ok(());
        }

        if let Some(response) = self.handle(request).await? {
            self.base.bot().transport().send_message(&message.channel_id, &response).await?;
        }
        Ok(())
    }

    fn is_allowed(&self, message: &Message) -> bool {
        message
            .member
            .as_ref()
            .map(|m| m.has_any_role(&self.allowed_roles))
            .unwrap_or(false)
    }

    /// Apply a request; `None` means stay quiet
    pub async fn handle(&self, request: InfoRequest) -> Result<Option<String>, BotError> {
        match request {
            InfoRequest::Add { key, text } => self.add_info(key, text).await,
            InfoRequest::Remove { key } => self.remove_info(&key).await,
            InfoRequest::List => Ok(Some(self.list_info().await)),
            InfoRequest::Fetch { key } => Ok(self.fetch_info(&key).await),
        }
    }

    async fn add_info(&self, key: String, text: String) -> Result<Option<String>, BotError> {
        let mut infos = self.infos.lock().await;
        if self.base.is_disabled() || infos.iter().any(|i| i.command == key) {
            return Ok(None);
        }

        infos.push(InfoData {
            command: key.clone(),
            message: text,
        });
        save_record(self.store.as_ref(), STORE_KEY, &*infos).await?;
        Ok(Some(format!("Successfully added {}", key)))
    }

    async fn remove_info(&self, key: &str) -> Result<Option<String>, BotError> {
        let mut infos = self.infos.lock().await;
        if self.base.is_disabled() {
            return Ok(None);
        }
        let Some(index) = infos.iter().position(|i| i.command == key) else {
            return Ok(None);
        };

        infos.remove(index);
        save_record(self.store.as_ref(), STORE_KEY, &*infos).await?;
        Ok(Some(format!("Successfully removed {}", key)))
    }

    async fn list_info(&self) -> String {
        let mut message = "The available info commands are: \n".to_string();
        for info in self.infos.lock().await.iter() {
            message.push_str(&format!("- `!{} {}`\n", self.command, info.command));
        }
        message
    }

    async fn fetch_info(&self, key: &str) -> Option<String> {
        self.infos
            .lock()
            .await
            .iter()
            .find(|i| i.command == key)
            .map(|i| i.message.clone())
    }
}

impl Extension for Info {
    fn base(&self) -> &ExtensionBase {
        &self.base
    }
}
