//! Extension manager - loads the enabled extensions and tears them down

use std::sync::Arc;
use tracing::{info, warn};

use crate::application::errors::{BotError, ExtensionError};
use crate::application::shell::BotShell;
use crate::domain::traits::Store;
use super::contract::{Extension, LifecycleState};
use super::{Info, Uptime, VersionChecker};

/// Manages all extensions attached to one shell
#[derive(Default)]
pub struct ExtensionManager {
    extensions: Vec<Arc<dyn Extension>>,
}

impl ExtensionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension. Names are unique.
    pub fn register(&mut self, extension: Arc<dyn Extension>) -> Result<(), ExtensionError> {
        let name = extension.name().to_string();

        if self.has_extension(&name) {
            return Err(ExtensionError::Load {
                name,
                reason: "already registered".to_string(),
            });
        }

        info!("Registering extension: {}", name);
        self.extensions.push(extension);
        Ok(())
    }

    /// Load every extension switched on in the shell's shared settings
    pub async fn load_enabled(bot: &Arc<BotShell>, store: Arc<dyn Store>) -> Result<Self, BotError> {
        let shared = bot.shared_settings().clone();
        let personal = bot.personal_settings().clone();
        let mut manager = Self::new();

        if shared.info.enabled {
            let info = Info::load(bot.clone(), shared.clone(), personal.clone(), store.clone()).await?;
            manager.register(info)?;
        }
        if shared.uptime.enabled {
            let uptime = Uptime::load(bot.clone(), shared.clone(), personal.clone(), store.clone()).await?;
            manager.register(uptime)?;
        }
        if shared.version_checker.enabled {
            let checker = VersionChecker::load(bot.clone(), shared.clone(), personal.clone(), store).await?;
            manager.register(checker)?;
        }

        info!("Loaded {} extension(s)", manager.len());
        Ok(manager)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Extension>> {
        self.extensions.iter().find(|e| e.name() == name)
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// List all registered extensions
    pub fn list(&self) -> Vec<ExtensionInfo> {
        self.extensions
            .iter()
            .map(|e| ExtensionInfo {
                name: e.name().to_string(),
                state: e.state(),
            })
            .collect()
    }

    /// Disable one extension by name
    pub fn disable(&self, name: &str) -> Result<(), ExtensionError> {
        match self.get(name) {
            Some(extension) => extension.disable(),
            None => Err(ExtensionError::Load {
                name: name.to_string(),
                reason: "not registered".to_string(),
            }),
        }
    }

    /// Disable everything, in registration order. One failure does not stop the rest.
    pub fn disable_all(&self) -> Vec<ExtensionError> {
        let mut failures = Vec::new();
        for extension in &self.extensions {
            if let Err(e) = extension.disable() {
                warn!("{}", e);
                failures.push(e);
            }
        }
        failures
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// Extension information for listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionInfo {
    pub name: String,
    pub state: LifecycleState,
}
