#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::{info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use tera_settings_sync::constants;
use tera_settings_sync::persistence::{load_document, SettingsDocument};
use tera_settings_sync::replay;
use tera_settings_sync::types::CharacterInfo;
use tera_settings_sync::{EngineConfig, PacketRecord, ReconcileMode, SettingKind, SettingsStore};

#[derive(Parser)]
#[command(name = "tera-settings-sync", version, about = "Keep game client settings in sync with per-character files")]
struct Cli {
    /// Overrides the configured data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drive the engine from a JSON Lines event log
    Replay {
        file: PathBuf,
        /// report or correct
        #[arg(long)]
        mode: Option<String>,
    },
    /// Summarize a character file, or a profile with --profile
    Inspect {
        name: String,
        #[arg(long)]
        server: Option<u32>,
        #[arg(long)]
        profile: bool,
    },
    /// Show the record form of a hex-encoded packet
    Decode { hex: String },
    /// List saved profiles
    Profiles,
}

fn init_tracing() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var(constants::env::LOG_LEVEL)
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn print_document(path: &std::path::Path, document: &SettingsDocument) {
    println!("File: {}", path.display());
    println!("Exists: {}", path.exists());
    println!("Lock: {}", document.lock);
    for kind in SettingKind::ALL {
        match document.get(kind) {
            Some(record) => println!(
                "{}: opcode {} length {} payload {} hex chars{}",
                kind.key(),
                record.opcode,
                record.length,
                record.payload.len(),
                if record.is_complete() { "" } else { " (corrupt)" }
            ),
            None => println!("{}: none", kind.key()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let mut config = EngineConfig::load();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let store = SettingsStore::new(&config.data_dir);

    match cli.command {
        Command::Replay { file, mode } => {
            if let Some(mode) = mode {
                config.mode = mode.parse::<ReconcileMode>()?;
            }
            let contents = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read replay log {}", file.display()))?;
            let events = replay::parse_events(&contents)?;
            info!(events = events.len(), mode = %config.mode, "Starting replay");

            let summary = replay::run(config, events, true).await?;
            println!(
                "Replayed {} events: {} packets consumed, {} injected, {} messages",
                summary.events,
                summary.consumed,
                summary.injected,
                summary.messages.len()
            );
        }
        Command::Inspect { name, server, profile } => {
            let path = if profile {
                store.profile_path(&name)
            } else {
                store.character_path(&CharacterInfo::new(name, server).character_key())
            };
            print_document(&path, &load_document(&path));
        }
        Command::Decode { hex } => {
            let buffer = hex::decode(hex.trim()).context("Input is not valid hex")?;
            let record = PacketRecord::decode(&buffer)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Profiles => {
            let names = store.list_profiles()?;
            if names.is_empty() {
                println!("No profiles in {}", store.profiles_dir().display());
            }
            for name in names {
                println!("{name}");
            }
        }
    }

    Ok(())
}
