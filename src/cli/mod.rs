use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::storage::AppointmentGateway;

pub mod commands;

use self::commands::{AddArgs, DeleteArgs, ListArgs};

#[derive(Parser, Debug)]
#[command(
    name = "vetappt",
    version,
    about = "Veterinary clinic appointment manager"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over VETAPPT_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over VETAPPT_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive form and list (default)
    Tui,
    /// Create an appointment from the command line
    Add(AddArgs),
    /// Print stored appointments
    List(ListArgs),
    /// Delete an appointment by id
    Delete(DeleteArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let loader = ConfigLoader::discover()?;
    let config = Arc::new(loader.load_or_init()?);
    tracing::debug!(
        config = %loader.paths().config_file.display(),
        database = %config.storage.database_path.display(),
        "configuration loaded"
    );
    let gateway = AppointmentGateway::initialize(&config.storage);

    let command = cli.command.unwrap_or(Commands::Tui);
    match command {
        Commands::Tui => {
            let mut app = App::new(config, gateway)?;
            app.run()
        }
        Commands::Add(args) => commands::add_appointment(&gateway, args),
        Commands::List(args) => commands::list_appointments(&gateway, args),
        Commands::Delete(args) => commands::delete_appointment(&gateway, args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
