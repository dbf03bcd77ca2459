//! Version checker - announces new game patches and data dragon releases

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::application::errors::{BotError, ExtensionError};
use crate::application::events::ready_callback;
use crate::application::shell::BotShell;
use crate::domain::entities::{Channel, Embed};
use crate::domain::traits::{load_record, save_record, Store, Transport};
use crate::infrastructure::config::{PersonalSettings, SharedSettings, VersionCheckerConfig};
use super::contract::{Extension, ExtensionBase, Liveness};

const STORE_KEY: &str = "version-checker";
const DDRAGON_TOOL: &str = "http://ddragon.leagueoflegends.com/tool";
const DDRAGON_COLOR: u32 = 0x42f456;
const GAME_COLOR: u32 = 0xf442e5;

static HTTP: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent("Botty/1.0")
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// Last versions announced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCheckerData {
    pub latest_game_version: String,
    pub latest_data_dragon_version: String,
}

/// `major.minor`
pub fn parse_game_version(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.trim().split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

/// The `v` field of a realm document
pub fn parse_realm_version(realm: &serde_json::Value) -> Option<String> {
    realm.get("v")?.as_str().filter(|v| !v.is_empty()).map(|v| v.to_string())
}

pub fn patch_notes_url(pattern: &str, major: u32, minor: u32) -> String {
    pattern
        .replace("{major}", &major.to_string())
        .replace("{minor}", &minor.to_string())
}

/// A patch whose notes are online
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundPatch {
    pub major: u32,
    pub minor: u32,
    pub url: String,
}

impl FoundPatch {
    pub fn version(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

/// Walk forward from `current` checking patch-notes pages.
///
/// Each step tries the next minor; on 404 it tries the first patch of the
/// next major, and stops when that is missing too. `fetch_status` returns the HTTP
/// status, or `None` on a transport failure, which ends the walk.
pub async fn find_latest_patch<F, Fut>(
    current: (u32, u32),
    max_tries: u32,
    pattern: &str,
    mut fetch_status: F,
) -> Option<FoundPatch>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Option<u16>>,
{
    let (mut major, mut minor) = current;
    let mut found = None;
    let mut tries = 0;

    while tries < max_tries {
        minor += 1;
        let url = patch_notes_url(pattern, major, minor);
        tries += 1;

        match fetch_status(url.clone()).await {
            Some(200) => found = Some(FoundPatch { major, minor, url }),
            Some(404) => {
                // Maybe a new season
                major += 1;
                minor = 1;
                let url = patch_notes_url(pattern, major, minor);
                tries += 1;

                match fetch_status(url.clone()).await {
                    Some(200) => found = Some(FoundPatch { major, minor, url }),
                    Some(404) | None => break,
                    Some(_) => {}
                }
            }
            Some(_) => {}
            None => break,
        }
    }

    found
}

fn data_dragon_embed(version: &str, thumbnail: &str) -> Embed {
    let download = format!("http://ddragon.leagueoflegends.com/cdn/dragontail-{}.tgz", version);
    let embed = Embed::new(
        "New DDragon version!",
        format!(
            "Version {} of DDragon has hit the CDN.\nYou can find the tool here:\n{}\n\nAnd the download is available here:\n{}",
            version, DDRAGON_TOOL, download
        ),
    )
    .with_color(DDRAGON_COLOR)
    .with_url(DDRAGON_TOOL);
    with_thumbnail(embed, thumbnail)
}

fn game_embed(patch: &FoundPatch, thumbnail: &str) -> Embed {
    let embed = Embed::new(
        "New League of Legends version!",
        format!(
            "Version {} of League of Legends has posted its patch notes. You can expect the game to update soon.\n\nYou can find the notes here:\n{}",
            patch.version(),
            patch.url
        ),
    )
    .with_color(GAME_COLOR)
    .with_url(patch.url.clone());
    with_thumbnail(embed, thumbnail)
}

fn with_thumbnail(embed: Embed, thumbnail: &str) -> Embed {
    if thumbnail.is_empty() {
        embed
    } else {
        embed.with_thumbnail(thumbnail)
    }
}

/// Poller state shared with the background task
struct Poller {
    config: VersionCheckerConfig,
    store: Arc<dyn Store>,
    transport: Arc<dyn Transport>,
    data: tokio::sync::Mutex<VersionCheckerData>,
    liveness: Liveness,
}

impl Poller {
    async fn run(self: Arc<Self>, channel: Channel) {
        let period = Duration::from_millis(self.config.check_interval_ms);
        while self.liveness.is_alive() {
            if let Err(e) = self.update_data_dragon_version(&channel).await {
                tracing::error!("Ddragon fetch error: {}", e);
            }
            if let Err(e) = self.update_game_version(&channel).await {
                tracing::error!("Game version fetch error: {}", e);
            }
            tokio::time::sleep(period).await;
        }
    }

    async fn update_data_dragon_version(&self, channel: &Channel) -> Result<(), BotError> {
        let response = HTTP
            .get(&self.config.realm_url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            tracing::warn!("HTTP Error trying to read ddragon version: {}", response.status());
        }

        let realm: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        let Some(version) = parse_realm_version(&realm) else {
            tracing::error!("ddragon version json seems to be incorrect? Data corrupted?");
            return Ok(());
        };

        let mut data = self.data.lock().await;
        if version == data.latest_data_dragon_version || !self.liveness.is_alive() {
            return Ok(());
        }

        data.latest_data_dragon_version = version.clone();
        save_record(self.store.as_ref(), STORE_KEY, &*data).await?;
        drop(data);

        let embed = data_dragon_embed(&version, &self.config.data_dragon_thumbnail);
        self.transport.send_embed(&channel.id, &embed).await
    }

    async fn update_game_version(&self, channel: &Channel) -> Result<(), BotError> {
        let current = self.data.lock().await.latest_game_version.clone();
        let Some(current) = parse_game_version(&current) else {
            tracing::warn!("No valid game version stored ('{}'), skipping patch check", current);
            return Ok(());
        };

        let found = find_latest_patch(current, self.config.max_tries, &self.config.patch_notes_url, |url| async move {
            match HTTP.get(&url).send().await {
                Ok(response) => Some(response.status().as_u16()),
                Err(e) => {
                    tracing::warn!("Failed to check {}: {}", url, e);
                    None
                }
            }
        })
        .await;

        // No new version
        let Some(patch) = found else {
            return Ok(());
        };

        let mut data = self.data.lock().await;
        if !self.liveness.is_alive() {
            return Ok(());
        }
        data.latest_game_version = patch.version();
        save_record(self.store.as_ref(), STORE_KEY, &*data).await?;
        drop(data);

        let embed = game_embed(&patch, &self.config.game_thumbnail);
        self.transport.send_embed(&channel.id, &embed).await
    }
}

/// VersionChecker extension
pub struct VersionChecker {
    base: ExtensionBase,
    poller: Arc<Poller>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl VersionChecker {
    pub async fn load(
        bot: Arc<BotShell>,
        shared: Arc<SharedSettings>,
        personal: Arc<PersonalSettings>,
        store: Arc<dyn Store>,
    ) -> Result<Arc<Self>, BotError> {
        tracing::info!("Requested VersionChecker extension..");
        let mut data: VersionCheckerData = load_record(store.as_ref(), STORE_KEY).await?;
        tracing::info!("Successfully loaded VersionChecker data file.");

        if data.latest_game_version.is_empty() {
            data.latest_game_version = shared.version_checker.initial_game_version.clone();
            tracing::info!("No game version stored yet, starting from {}", data.latest_game_version);
            save_record(store.as_ref(), STORE_KEY, &data).await?;
        }

        let server = shared.server.clone();
        let forum = shared.forum.channel.clone();
        let config = shared.version_checker.clone();
        let base = ExtensionBase::new("version-checker", bot.clone(), shared, personal);

        let poller = Arc::new(Poller {
            config,
            store,
            transport: bot.transport().clone(),
            data: tokio::sync::Mutex::new(data),
            liveness: base.liveness(),
        });
        let task = Arc::new(Mutex::new(None));

        let ready_poller = poller.clone();
        let ready_task = task.clone();
        base.on_client_ready(ready_callback(move || async move {
            let transport = ready_poller.transport.clone();
            let Some(guild) = transport.guild(&server).await? else {
                tracing::error!("VersionChecker: Incorrect settings for guild ID {}", server);
                return Ok(());
            };
            let Some(channel) = transport.find_channel(&guild.id, &forum).await? else {
                tracing::error!("VersionChecker: Incorrect setting for the channel: {}", forum);
                return Ok(());
            };

            tracing::info!("VersionChecker extension loaded.");
            let handle = tokio::spawn(ready_poller.run(channel));
            *ready_task.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
            Ok(())
        }))
        .await;

        Ok(Arc::new(Self { base, poller, task }))
    }

    pub async fn data(&self) -> VersionCheckerData {
        self.poller.data.lock().await.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.task.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

impl Extension for VersionChecker {
    fn base(&self) -> &ExtensionBase {
        &self.base
    }

    fn disable(&self) -> Result<(), ExtensionError> {
        if let Some(task) = self.task.lock().unwrap_or_else(|e| e.into_inner()).take() {
            task.abort();
        }
        self.base.disable()
    }
}
