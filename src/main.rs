#![forbid(unsafe_code)]

mod backup;
mod config;
mod constants;
mod manager;
mod monitor;
mod palette;
mod state;
mod trigger;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level as TraceLevel, info, warn};
use tracing_subscriber::FmtSubscriber;

use backup::BackupStore;
use config::Settings;
use manager::{ColorManager, ReloadOutcome};
use palette::ColorMapping;
use trigger::{RestartTriggerWatcher, TriggerOptions, shell_action};

#[derive(Parser, Debug)]
#[command(name = "colorwatch", version, about = "Keep window manager colors in sync with a pywal palette")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/colorwatch/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the colors file until interrupted
    Watch(WatchArgs),
    /// Print a JSON status report
    Status,
    /// Print the current palette, or a single role
    Colors {
        #[arg(long)]
        role: Option<String>,
    },
    /// Validate a colors file (default: the configured one)
    Validate { file: Option<PathBuf> },
    /// Re-read the colors file once
    Reload,
    /// List palette snapshots, oldest first
    Backups,
    /// Copy a snapshot over the live colors file
    Restore(RestoreArgs),
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Command run when the restart sentinel appears
    #[arg(long)]
    restart_command: Option<String>,
    /// Leave the restart sentinel for someone else to consume
    #[arg(long)]
    no_restart: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct RestoreArgs {
    /// Restore the last known-good palette
    #[arg(long)]
    last_good: bool,
    /// Restore a named backup (see `colorwatch backups`)
    #[arg(long, value_name = "NAME")]
    backup: Option<String>,
}

fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
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

    // stdout carries command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Watch(args) => watch(settings, args),
        Commands::Status => {
            let manager = ColorManager::new(settings);
            println!("{}", serde_json::to_string_pretty(&manager.status())?);
            Ok(())
        }
        Commands::Colors { role } => {
            let manager = ColorManager::new(settings);
            let colors = manager.get_colors();
            match role {
                Some(role) => match colors.get(&role) {
                    Some(value) => println!("{value}"),
                    None => bail!("Unknown color role '{role}'"),
                },
                None => println!("{}", colors.to_json_pretty()?),
            }
            Ok(())
        }
        Commands::Validate { file } => {
            let path = file.unwrap_or(settings.colors_file);
            let mapping = ColorMapping::load_from_file(&path)
                .with_context(|| format!("{} is not a usable palette", path.display()))?;
            println!("{}: valid ({} roles)", path.display(), mapping.roles().len());
            Ok(())
        }
        Commands::Reload => {
            let manager = ColorManager::new(settings);
            let outcome = manager.manual_reload();
            println!("{outcome}");
            match outcome {
                ReloadOutcome::Applied { .. } | ReloadOutcome::Unchanged => Ok(()),
                _ => bail!("Reload did not apply new colors"),
            }
        }
        Commands::Backups => {
            let store = backup_store(&settings);
            let entries = store.list()?;
            if entries.is_empty() {
                println!("No backups in {}", store.dir().display());
            }
            for entry in entries {
                let created = entry
                    .created
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}", entry.name, created);
            }
            if store.last_good_path().exists() {
                println!("last good: {}", store.last_good_path().display());
            }
            Ok(())
        }
        Commands::Restore(args) => {
            let store = backup_store(&settings);
            let mapping = match args.backup {
                Some(name) => store.restore(&name, &settings.colors_file)?,
                None => store.restore_last_good(&settings.colors_file)?,
            };
            println!(
                "Restored {} (background {})",
                settings.colors_file.display(),
                mapping.background()
            );
            Ok(())
        }
    }
}

fn backup_store(settings: &Settings) -> BackupStore {
    BackupStore::new(
        settings.backup_dir.clone(),
        settings.last_good_file.clone(),
        settings.max_backups,
    )
}

fn watch(settings: Settings, args: WatchArgs) -> Result<()> {
    let restart = if args.no_restart {
        None
    } else {
        let command = args
            .restart_command
            .unwrap_or_else(|| settings.restart_command.clone());
        Some((
            settings.restart_trigger_file.clone(),
            TriggerOptions::from_settings(&settings),
            command,
        ))
    };

    let manager = ColorManager::new(settings);
    manager.start_monitoring()?;

    let trigger = match restart {
        Some((path, options, command)) => {
            info!(path = %path.display(), command = %command, "Consuming restart trigger");
            Some(RestartTriggerWatcher::spawn(path, options, shell_action(&command))?)
        }
        None => None,
    };

    wait_for_shutdown(&manager, trigger.as_ref())?;

    info!("Shutting down");
    if let Some(trigger) = trigger {
        trigger.stop();
    }
    manager.stop_monitoring();
    Ok(())
}

/// Block until SIGINT or SIGTERM. SIGHUP forces a reload.
#[cfg(unix)]
fn wait_for_shutdown(manager: &ColorManager, trigger: Option<&RestartTriggerWatcher>) -> Result<()> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("Failed to install signal handlers")?;
    for signal in signals.forever() {
        match signal {
            SIGHUP => {
                let outcome = manager.manual_reload();
                info!(outcome = %outcome, "Reload on SIGHUP");
            }
            _ => {
                info!(signal, "Received termination signal");
                break;
            }
        }
        if !manager.is_monitoring() {
            warn!(status = ?manager.monitor_status(), "Color monitor is not running; restart colorwatch to resume");
        }
        if trigger.is_some_and(|t| !t.is_running()) {
            warn!("Restart trigger watcher has stopped; restart colorwatch to resume");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(_manager: &ColorManager, _trigger: Option<&RestartTriggerWatcher>) -> Result<()> {
    loop {
        std::thread::park();
    }
}
