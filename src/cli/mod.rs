use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::storage;

pub mod commands;

use self::commands::{AddArgs, ExportArgs, IdArgs, ListArgs, QueryArgs, UpdateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "jobtrack",
    version,
    about = "Track job applications from the terminal"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over JOBTRACK_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over JOBTRACK_DATA)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive dashboard (default)
    Tui,
    /// Record a new application
    Add(AddArgs),
    /// Print applications, newest first, optionally filtered by a query
    List(ListArgs),
    /// Print every field of one application
    Show(IdArgs),
    /// Change fields of an existing application
    Update(UpdateArgs),
    /// Remove an application
    Delete(IdArgs),
    /// Print metrics and chart data for the (filtered) applications
    Stats(QueryArgs),
    /// Write the (filtered) applications to CSV or JSON
    Export(ExportArgs),
    /// Bring the database schema up to date and report its version
    Migrate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    let command = cli.command.unwrap_or(Commands::Tui);
    let target = match command {
        Commands::Tui => LogTarget::File(paths.log_dir.join("jobtrack.log")),
        _ => LogTarget::Stderr,
    };
    init_tracing(&cli.log_level, &target)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;

    if let Commands::Migrate = command {
        let output = commands::run_migrate(&paths, &config.storage)?;
        print!("{output}");
        return Ok(());
    }

    let storage = storage::init(&paths, &config.storage).context("opening application store")?;
    let config = Arc::new(config);
    match command {
        Commands::Tui => {
            let mut app = App::new(config.clone(), storage.clone())?;
            commands::run_tui(&mut app)
        }
        Commands::Add(args) => commands::add_application(&storage, args),
        Commands::List(args) => commands::list_applications(&storage, &args),
        Commands::Show(args) => commands::show_application(&storage, &args),
        Commands::Update(args) => commands::update_application(&storage, args),
        Commands::Delete(args) => commands::delete_application(&storage, &args),
        Commands::Stats(args) => commands::print_stats(&config, &storage, &args),
        Commands::Export(args) => commands::export_applications(&config, &storage, &args),
        Commands::Migrate => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Appends to a file so the dashboard's screen stays clean.
    File(PathBuf),
}

fn init_tracing(level: &str, target: &LogTarget) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match target {
            LogTarget::Stderr => fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init(),
            LogTarget::File(path) => {
                let file = open_log_file(path)?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init()
            }
        }
        Ok(())
    })
    .map(|_| ())
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}
