//! Uptime extension - tracks how much of the time the bot has been running

use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::application::errors::{BotError, CommandError, ExtensionError};
use crate::application::events::ready_callback;
use crate::application::shell::BotShell;
use crate::domain::entities::{Command, CommandHandler, Message};
use crate::domain::traits::{load_record, save_record, Store, Transport};
use crate::infrastructure::config::{PersonalSettings, SharedSettings};
use super::contract::{Extension, ExtensionBase, Liveness};

const STORE_KEY: &str = "uptime";

/// Slack allowed on top of the check interval before a gap counts as downtime
const GRACE_MS: i64 = 1000;

/// Persisted counters, all in milliseconds since the epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UptimeData {
    pub last_uptime: i64,
    pub uptime_start: i64,
    pub total_downtime: i64,
}

impl UptimeData {
    /// Record a heartbeat at `now`. Returns the downtime noticed, if any.
    ///
    /// A zero start or last heartbeat resets the counters.
    pub fn update(&mut self, now: i64, check_interval_ms: u64) -> Option<i64> {
        let mut gap = now.saturating_sub(self.last_uptime);

        if self.last_uptime == 0 || self.uptime_start == 0 {
            self.uptime_start = now;
            self.total_downtime = 0;
            gap = 0;
        }

        let noticed = if gap > check_interval_ms as i64 + GRACE_MS {
            self.total_downtime = self.total_downtime.saturating_add(gap);
            Some(gap)
        } else {
            None
        };

        self.last_uptime = now;
        noticed
    }

    /// Share of time up since the start, in percent, three decimals
    pub fn percentage(&self, now: i64) -> f64 {
        let span = now.saturating_sub(self.uptime_start);
        if span <= 0 {
            return 100.0;
        }
        let percentage = 1.0 - self.total_downtime as f64 / span as f64;
        (percentage * 100_000.0).round() / 1000.0
    }

    pub fn uptime_ms(&self, now: i64) -> i64 {
        now.saturating_sub(self.uptime_start).max(0)
    }
}

/// `1 day 2 hours 3 minutes 4 seconds`; sub-second spans in milliseconds
pub fn format_duration(ms: i64) -> String {
    if ms < 1000 {
        return plural(ms.max(0), "millisecond");
    }

    let secs = ms / 1000;
    let parts = [
        (secs / 86_400, "day"),
        (secs % 86_400 / 3600, "hour"),
        (secs % 3600 / 60, "minute"),
        (secs % 60, "second"),
    ];

    parts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| plural(*n, unit))
        .collect::<Vec<_>>()
        .join(" ")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Counters shared between the ticker, the command handler and the extension
pub struct UptimeState {
    data: tokio::sync::Mutex<UptimeData>,
    store: Arc<dyn Store>,
    check_interval_ms: u64,
    liveness: Liveness,
}

impl UptimeState {
    /// Heartbeat. Returns false when the extension is gone and nothing changed.
    pub async fn tick(&self, now: i64) -> Result<bool, BotError> {
        let mut data = self.data.lock().await;
        if !self.liveness.is_alive() {
            return Ok(false);
        }

        if let Some(gap) = data.update(now, self.check_interval_ms) {
            tracing::info!("Noticed a downtime of {} seconds.", gap as f64 * 0.001);
        }
        save_record(self.store.as_ref(), STORE_KEY, &*data).await?;
        Ok(true)
    }

    pub async fn snapshot(&self) -> UptimeData {
        *self.data.lock().await
    }

    pub async fn report(&self, now: i64) -> String {
        let data = self.snapshot().await;
        format!(
            "the bot has been up for {}% of the time. Bot started {} ago.",
            data.percentage(now),
            format_duration(data.uptime_ms(now))
        )
    }
}

/// Handles `!uptime`
struct UptimeCommand {
    state: Arc<UptimeState>,
    transport: OnceLock<Arc<dyn Transport>>,
}

#[async_trait]
impl CommandHandler for UptimeCommand {
    fn on_ready(&self, transport: &Arc<dyn Transport>) {
        let _ = self.transport.set(transport.clone());
    }

    async fn on_command(&self, message: &Message, _command: &str, _args: &[String]) -> Result<(), CommandError> {
        if !self.state.liveness.is_alive() {
            return Ok(());
        }
        let transport = self
            .transport
            .get()
            .ok_or_else(|| CommandError::NotReady("uptime".to_string()))?;

        let report = self.state.report(now_ms()).await;
        transport.reply(message, &report).await?;
        Ok(())
    }
}

/// Uptime extension
pub struct Uptime {
    base: ExtensionBase,
    state: Arc<UptimeState>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Uptime {
    pub async fn load(
        bot: Arc<BotShell>,
        shared: Arc<SharedSettings>,
        personal: Arc<PersonalSettings>,
        store: Arc<dyn Store>,
    ) -> Result<Arc<Self>, BotError> {
        tracing::info!("Requested uptime extension..");
        let data: UptimeData = load_record(store.as_ref(), STORE_KEY).await?;
        tracing::info!("Successfully loaded uptime data file.");

        let check_interval_ms = shared.uptime.check_interval_ms;
        let base = ExtensionBase::new("uptime", bot.clone(), shared, personal);
        let state = Arc::new(UptimeState {
            data: tokio::sync::Mutex::new(data),
            store,
            check_interval_ms,
            liveness: base.liveness(),
        });

        // Count the time we were not running before the first heartbeat
        state.tick(now_ms()).await?;

        bot.register_command(
            vec![Command::new("uptime").with_description("Shows how long the bot has been up")],
            Arc::new(UptimeCommand {
                state: state.clone(),
                transport: OnceLock::new(),
            }),
        );

        base.on_client_ready(ready_callback(|| async {
            tracing::info!("uptime extension loaded.");
            Ok(())
        }))
        .await;

        let ticker = tokio::spawn(Self::run_ticker(state.clone()));

        Ok(Arc::new(Self {
            base,
            state,
            ticker: Mutex::new(Some(ticker)),
        }))
    }

    async fn run_ticker(state: Arc<UptimeState>) {
        let period = Duration::from_millis(state.check_interval_ms);
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;
            match state.tick(now_ms()).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => tracing::warn!("Failed to record uptime: {}", e),
            }
        }
    }

    pub fn counters(&self) -> &Arc<UptimeState> {
        &self.state
    }
}

impl Extension for Uptime {
    fn base(&self) -> &ExtensionBase {
        &self.base
    }

    fn disable(&self) -> Result<(), ExtensionError> {
        if let Some(ticker) = self.ticker.lock().unwrap_or_else(|e| e.into_inner()).take() {
            ticker.abort();
        }
        self.base.disable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = 60_000;

    #[test]
    fn test_first_update_resets_counters() {
        let mut data = UptimeData { last_uptime: 0, uptime_start: 5, total_downtime: 99 };
        assert_eq!(data.update(1_000_000, 60_000), None);
        assert_eq!(data, UptimeData { last_uptime: 1_000_000, uptime_start: 1_000_000, total_downtime: 0 });
    }

    #[test]
    fn test_gap_beyond_interval_counts_as_downtime() {
        let start = 1_000_000;
        let mut data = UptimeData::default();
        data.update(start, MIN as u64);
        assert_eq!(data.update(start + MIN, MIN as u64), None);
        assert_eq!(data.update(start + MIN + MIN + 500, MIN as u64), None);

        let late = start + 10 * MIN;
        assert_eq!(data.update(late, MIN as u64), Some(late - (start + 2 * MIN + 500)));
        assert_eq!(data.total_downtime, late - (start + 2 * MIN + 500));
    }

    #[test]
    fn test_percentage_rounds_to_three_decimals() {
        let data = UptimeData { last_uptime: 3000, uptime_start: 0, total_downtime: 1000 };
        assert_eq!(data.percentage(3000), 66.667);
        assert_eq!(data.percentage(0), 100.0);
    }

    #[test]
    fn test_corrupt_record_does_not_overflow() {
        let mut data = UptimeData { last_uptime: i64::MIN, uptime_start: 1, total_downtime: i64::MAX - 5 };
        assert_eq!(data.update(1_000_000, MIN as u64), Some(i64::MAX));
        assert_eq!(data.total_downtime, i64::MAX);
        assert_eq!(data.last_uptime, 1_000_000);

        let data = UptimeData { last_uptime: 0, uptime_start: i64::MIN, total_downtime: 0 };
        assert_eq!(data.uptime_ms(i64::MAX), i64::MAX);
        assert_eq!(data.percentage(i64::MAX), 100.0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(500), "500 milliseconds");
        assert_eq!(format_duration(1000), "1 second");
        assert_eq!(format_duration(61_000), "1 minute 1 second");
        assert_eq!(format_duration(90_061_000), "1 day 1 hour 1 minute 1 second");
        assert_eq!(format_duration(2 * 3_600_000), "2 hours");
    }
}
