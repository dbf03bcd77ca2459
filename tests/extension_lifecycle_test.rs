//! Extension lifecycle: subscriptions, ready callbacks, teardown
//! Run with: cargo test --test extension_lifecycle_test

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use botty::application::errors::ExtensionError;
use botty::application::events::{listener, ready_callback};
use botty::domain::entities::{EventKind, GatewayEvent};
use botty::domain::traits::{load_record, save_record, Store};
use botty::extensions::info::InfoData;
use botty::extensions::version_checker::VersionCheckerData;
use botty::extensions::{Extension, ExtensionBase, ExtensionManager, Info, LifecycleState, Uptime, VersionChecker};
use botty::infrastructure::config::PersonalSettings;
use botty::infrastructure::storage::MemoryStore;
use botty::application::shell::BotShell;
use common::*;

fn base(shell: &Arc<BotShell>, name: &str) -> ExtensionBase {
    ExtensionBase::new(
        name,
        shell.clone(),
        shell.shared_settings().clone(),
        shell.personal_settings().clone(),
    )
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

fn counting_listener(count: &Arc<AtomicUsize>) -> botty::application::events::Listener {
    let count = count.clone();
    listener(move |_| {
        let count = count.clone();
        async move {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

fn counting_callback(count: &Arc<AtomicUsize>) -> botty::application::events::ReadyCallback {
    let count = count.clone();
    ready_callback(move || async move {
        count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

fn memory_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::new())
}

#[tokio::test]
async fn test_disable_removes_every_subscription() {
    let (shell, _transport) = shell();
    let ext = base(&shell, "sample");
    let baseline = shell.emitter().listener_count(EventKind::Message);

    let messages = counter();
    let joins = counter();
    ext.add_event_listener(EventKind::Message, counting_listener(&messages)).unwrap();
    ext.add_event_listener(EventKind::MemberAdd, counting_listener(&joins)).unwrap();
    assert_eq!(ext.subscriptions(), 2);
    assert_eq!(shell.emitter().listener_count(EventKind::Message), baseline + 1);

    shell.handle_event(message(user("u1"), "hello")).await;
    assert_eq!(messages.load(Ordering::SeqCst), 1);

    ext.disable().unwrap();
    assert_eq!(ext.state(), LifecycleState::Disabled);
    assert_eq!(ext.subscriptions(), 0);
    assert_eq!(shell.emitter().listener_count(EventKind::Message), baseline);

    shell.handle_event(message(user("u1"), "hello again")).await;
    assert_eq!(messages.load(Ordering::SeqCst), 1);
    assert_eq!(joins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_disable_twice_is_a_no_op() {
    let (shell, _transport) = shell();
    let ext = base(&shell, "sample");
    ext.add_event_listener(EventKind::Message, counting_listener(&counter())).unwrap();

    ext.disable().unwrap();
    ext.disable().unwrap();
    assert_eq!(ext.subscriptions(), 0);
}

#[tokio::test]
async fn test_subscribing_after_disable_fails() {
    let (shell, _transport) = shell();
    let ext = base(&shell, "sample");
    ext.disable().unwrap();

    let result = ext.add_event_listener(EventKind::Message, counting_listener(&counter()));
    assert!(matches!(result, Err(ExtensionError::Disabled(name)) if name == "sample"));
}

#[tokio::test]
async fn test_ready_callback_is_deferred_until_ready() {
    let (shell, _transport) = shell();
    let ext = base(&shell, "sample");
    let runs = counter();

    ext.on_client_ready(counting_callback(&runs)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(ext.state(), LifecycleState::PendingReady);

    shell.handle_event(GatewayEvent::Ready).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(ext.state(), LifecycleState::Active);

    // A second ready signal does not replay callbacks
    shell.handle_event(GatewayEvent::Ready).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_ready_callback_runs_immediately_once_connected() {
    let (shell, _transport) = shell();
    shell.handle_event(GatewayEvent::Ready).await;
    assert!(shell.is_ready());

    let ext = base(&shell, "late");
    let runs = counter();
    ext.on_client_ready(counting_callback(&runs)).await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(ext.state(), LifecycleState::Active);
}

#[tokio::test]
async fn test_ready_callback_dropped_when_disabled_first() {
    let (shell, _transport) = shell();
    let ext = base(&shell, "sample");
    let runs = counter();

    ext.on_client_ready(counting_callback(&runs)).await;
    ext.disable().unwrap();
    shell.handle_event(GatewayEvent::Ready).await;

    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(ext.state(), LifecycleState::Disabled);
}

#[tokio::test]
async fn test_ready_sets_nickname_in_configured_guild() {
    let (shell, transport) = shell();
    shell.handle_event(GatewayEvent::Ready).await;
    assert_eq!(transport.nicknames(), vec![(GUILD.to_string(), settings().botty.nickname)]);
}

#[tokio::test]
async fn test_unknown_guild_still_opens_ready_gate() {
    let transport = Arc::new(MockTransport::new());
    let mut shared = settings();
    shared.server = "missing".to_string();
    let shell = shell_with(transport.clone(), shared);

    shell.handle_event(GatewayEvent::Ready).await;

    assert!(transport.nicknames().is_empty());
    assert!(shell.is_ready());
}

#[tokio::test]
async fn test_info_add_fetch_list_remove() {
    let (shell, transport) = shell();
    let store = memory_store();
    let info = Info::load(
        shell.clone(),
        shell.shared_settings().clone(),
        Arc::new(PersonalSettings::default()),
        store.clone(),
    )
    .await
    .unwrap();

    shell.handle_event(admin_message(user("admin"), "!info add rules be nice")).await;
    shell.handle_event(message(user("u1"), "!info rules")).await;
    shell.handle_event(message(user("u1"), "!info list")).await;

    let sent: Vec<String> = transport.sent().into_iter().map(|(_, text)| text).collect();
    assert_eq!(
        sent,
        vec![
            "Successfully added rules".to_string(),
            "be nice".to_string(),
            "The available info commands are: \n- `!info rules`\n".to_string(),
        ]
    );

    let saved: Vec<InfoData> = load_record(store.as_ref(), "info").await.unwrap();
    assert_eq!(saved, vec![InfoData { command: "rules".into(), message: "be nice".into() }]);

    shell.handle_event(admin_message(user("admin"), "!info remove rules")).await;
    let saved: Vec<InfoData> = load_record(store.as_ref(), "info").await.unwrap();
    assert!(saved.is_empty());
    assert_eq!(info.name(), "info");
}

#[tokio::test]
async fn test_info_edits_need_an_allowed_role() {
    let (shell, transport) = shell();
    let store = memory_store();
    let _info = Info::load(
        shell.clone(),
        shell.shared_settings().clone(),
        Arc::new(PersonalSettings::default()),
        store.clone(),
    )
    .await
    .unwrap();

    shell.handle_event(message(user("u1"), "!info add rules anything goes")).await;

    assert!(transport.sent().is_empty());
    let saved: Vec<InfoData> = load_record(store.as_ref(), "info").await.unwrap();
    assert!(saved.is_empty());
}

#[tokio::test]
async fn test_disabled_info_stops_answering() {
    let (shell, transport) = shell();
    let info = Info::load(
        shell.clone(),
        shell.shared_settings().clone(),
        Arc::new(PersonalSettings::default()),
        memory_store(),
    )
    .await
    .unwrap();

    info.disable().unwrap();
    shell.handle_event(admin_message(user("admin"), "!info add rules be nice")).await;
    shell.handle_event(message(user("u1"), "!info list")).await;

    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_uptime_command_and_teardown() {
    let (shell, transport) = shell();
    let uptime = Uptime::load(
        shell.clone(),
        shell.shared_settings().clone(),
        Arc::new(PersonalSettings::default()),
        memory_store(),
    )
    .await
    .unwrap();
    assert_eq!(shell.registry().len(), 1);

    shell.handle_event(message(user("u1"), "!uptime")).await;
    shell.wait_for_commands().await;
    let replies = transport.replies();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].1.starts_with("the bot has been up for 100% of the time. Bot started "));

    uptime.disable().unwrap();
    assert!(!uptime.counters().tick(chrono::Utc::now().timestamp_millis()).await.unwrap());

    // The command stays registered but no longer answers
    shell.handle_event(message(user("u1"), "!uptime")).await;
    shell.wait_for_commands().await;
    assert_eq!(transport.replies().len(), 1);
}

#[tokio::test]
async fn test_version_checker_waits_for_a_valid_channel() {
    let transport = Arc::new(MockTransport::new());
    let mut shared = settings();
    shared.forum.channel = "no-such-channel".to_string();
    let shell = shell_with(transport.clone(), shared);

    let checker = VersionChecker::load(
        shell.clone(),
        shell.shared_settings().clone(),
        Arc::new(PersonalSettings::default()),
        memory_store(),
    )
    .await
    .unwrap();
    assert!(!checker.is_polling());

    shell.handle_event(GatewayEvent::Ready).await;
    assert!(!checker.is_polling());
    assert_eq!(checker.state(), LifecycleState::Active);

    checker.disable().unwrap();
    assert_eq!(checker.state(), LifecycleState::Disabled);
}

#[tokio::test]
async fn test_version_checker_seeds_game_version_on_fresh_store() {
    let transport = Arc::new(MockTransport::new());
    let mut shared = settings();
    shared.version_checker.initial_game_version = "8.12".to_string();
    let shell = shell_with(transport, shared);
    let store = memory_store();

    let checker = VersionChecker::load(
        shell.clone(),
        shell.shared_settings().clone(),
        Arc::new(PersonalSettings::default()),
        store.clone(),
    )
    .await
    .unwrap();
    assert_eq!(checker.data().await.latest_game_version, "8.12");

    let saved: VersionCheckerData = load_record(store.as_ref(), "version-checker").await.unwrap();
    assert_eq!(saved.latest_game_version, "8.12");
    checker.disable().unwrap();
}

#[tokio::test]
async fn test_version_checker_keeps_stored_game_version() {
    let (shell, _transport) = shell();
    let store = memory_store();
    let stored = VersionCheckerData {
        latest_game_version: "14.3".to_string(),
        latest_data_dragon_version: "14.3.1".to_string(),
    };
    save_record(store.as_ref(), "version-checker", &stored).await.unwrap();

    let checker = VersionChecker::load(
        shell.clone(),
        shell.shared_settings().clone(),
        Arc::new(PersonalSettings::default()),
        store,
    )
    .await
    .unwrap();

    assert_eq!(checker.data().await, stored);
    checker.disable().unwrap();
}

#[tokio::test]
async fn test_version_checker_disabled_before_ready_never_polls() {
    let (shell, _transport) = shell();
    let checker = VersionChecker::load(
        shell.clone(),
        shell.shared_settings().clone(),
        Arc::new(PersonalSettings::default()),
        memory_store(),
    )
    .await
    .unwrap();

    checker.disable().unwrap();
    shell.handle_event(GatewayEvent::Ready).await;

    assert!(!checker.is_polling());
}

#[tokio::test]
async fn test_manager_loads_enabled_extensions_and_disables_all() {
    let (shell, _transport) = shell();
    let mut manager = ExtensionManager::load_enabled(&shell, memory_store()).await.unwrap();

    let names: Vec<String> = manager.list().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["info", "uptime"]);

    let duplicate = Info::load(
        shell.clone(),
        shell.shared_settings().clone(),
        Arc::new(PersonalSettings::default()),
        memory_store(),
    )
    .await
    .unwrap();
    assert!(manager.register(duplicate).is_err());
    assert!(manager.disable("nope").is_err());

    assert!(manager.disable_all().is_empty());
    assert!(manager.list().iter().all(|e| e.state == LifecycleState::Disabled));
}
