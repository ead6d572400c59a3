use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use feedlens_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "feedlens")]
#[command(author, version, about = "Aggregate recent articles from many RSS/Atom feeds")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to ~/.config/feedlens/config.toml)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI
    Run,
    /// Fetch all feeds once and print the merged list
    Fetch {
        /// Print the list and exit without prompting for an article to open
        #[arg(long)]
        no_pick: bool,
    },
    /// Manage the feed list
    Feeds {
        #[command(subcommand)]
        action: FeedsAction,
    },
    /// Inspect or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum FeedsAction {
    /// List configured feeds
    List,
    /// Add a feed URL
    Add { url: String },
    /// Remove a feed URL
    Remove { url: String },
    /// Import feeds from an OPML file
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Update fetch settings
    Set {
        /// Recency window in weeks
        #[arg(long)]
        weeks: Option<u32>,
        /// Maximum concurrent fetches
        #[arg(long)]
        workers: Option<usize>,
        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

/// Log to stderr, or to a file while the TUI owns the terminal
fn init_logging(config: &AppConfig, to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    if to_file {
        std::fs::create_dir_all(config.data_dir())?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.log_path())?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_or_default(&config_path);

    let tui = matches!(cli.command, Some(Commands::Run) | None);
    init_logging(&config, tui)?;

    match cli.command {
        Some(Commands::Run) | None => commands::run::run(Arc::new(config)).await,
        Some(Commands::Fetch { no_pick }) => commands::fetch::run(&config, !no_pick).await,
        Some(Commands::Feeds { action }) => match action {
            FeedsAction::List => commands::feeds::list(&config),
            FeedsAction::Add { url } => commands::feeds::add(config, &config_path, &url),
            FeedsAction::Remove { url } => commands::feeds::remove(config, &config_path, &url),
            FeedsAction::Import { file } => commands::feeds::import(config, &config_path, &file),
        },
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => commands::settings::show(&config),
            ConfigAction::Path => {
                println!("{}", config_path.display());
                Ok(())
            }
            ConfigAction::Set { weeks, workers, timeout } => {
                commands::settings::set(config, &config_path, weeks, workers, timeout)
            }
        },
    }
}
