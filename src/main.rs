use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use botty::application::errors::BotError;
use botty::application::shell::BotShell;
use botty::domain::traits::Store;
use botty::extensions::ExtensionManager;
use botty::infrastructure::adapters::ConsoleTransport;
use botty::infrastructure::config::{PersonalSettings, SharedSettings};
use botty::infrastructure::storage::JsonStore;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "botty")]
#[command(about = "A chat bot shell with pluggable extensions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Shared settings file path
    #[arg(short, long, default_value = "settings.yaml")]
    settings: String,

    /// Personal settings file path (credentials)
    #[arg(short, long, default_value = "personal.yaml")]
    personal: String,

    /// Bot token (overrides personal settings)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default)
    Run,
    /// Show version
    Version,
    /// Generate default settings
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            if let Err(e) = run_bot(&cli.settings, &cli.personal, cli.token) {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("botty v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            if let Err(e) = init_config() {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    }
}

fn load_settings(settings_path: &str, personal_path: &str) -> Result<(SharedSettings, PersonalSettings), BotError> {
    let shared = if Path::new(settings_path).exists() {
        SharedSettings::load(settings_path)?
    } else {
        tracing::warn!("{} not found, using defaults", settings_path);
        SharedSettings::load_env()
    };

    let personal = if Path::new(personal_path).exists() {
        PersonalSettings::load(personal_path)?
    } else {
        PersonalSettings::load_env()
    };

    Ok((shared, personal))
}

fn run_bot(settings_path: &str, personal_path: &str, token_override: Option<String>) -> Result<(), BotError> {
    let (shared, mut personal) = load_settings(settings_path, personal_path)?;
    if let Some(token) = token_override {
        personal.discord.key = token;
    }

    let rt = tokio::runtime::Runtime::new().map_err(|e| BotError::Internal(e.to_string()))?;
    rt.block_on(async move {
        let store = JsonStore::new(shared.data_dir.join("botty.json"));
        store.init().await?;
        let store: Arc<dyn Store> = Arc::new(store);

        let transport = ConsoleTransport::new(shared.server.clone(), &[shared.forum.channel.clone()])
            .with_operator_roles(shared.info.allowed_roles.clone());

        let shell = BotShell::new(Arc::new(transport), Arc::new(shared), Arc::new(personal));
        let extensions = ExtensionManager::load_enabled(&shell, store).await?;

        let result = shell.start().await;

        if tokio::time::timeout(SHUTDOWN_GRACE, shell.wait_for_commands()).await.is_err() {
            tracing::warn!("Commands still running after {:?}, shutting down anyway", SHUTDOWN_GRACE);
        }

        for failure in extensions.disable_all() {
            tracing::warn!("Shutdown: {}", failure);
        }
        result
    })
}

fn init_config() -> Result<(), BotError> {
    let yaml = serde_yaml::to_string(&SharedSettings::default())
        .map_err(|e| BotError::Internal(e.to_string()))?;
    println!("{}", yaml);
    println!("\nSave this to settings.yaml and adjust as needed.");

    let personal = serde_yaml::to_string(&PersonalSettings::default())
        .map_err(|e| BotError::Internal(e.to_string()))?;
    println!("\n{}", personal);
    println!("\nSave this to personal.yaml and keep it out of version control.");
    Ok(())
}
