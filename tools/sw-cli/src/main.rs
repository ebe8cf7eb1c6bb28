//! sw - Command line tool for the offline cache controller.
//!
//! Commands:
//! - `sw init` - Write a default sw.toml
//! - `sw config` - Show or validate configuration
//! - `sw classify` - Show which strategy a URL gets
//! - `sw precache` - Install: pre-warm the static store
//! - `sw fetch` - Fetch a URL through the worker
//! - `sw activate` - Sweep stale cache generations
//! - `sw caches` - List stores and entries

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sw_observability::{init_logging, LogLevel};

use commands::{ActivateArgs, CachesArgs, ClassifyArgs, ConfigArgs, FetchArgs, InitArgs, PrecacheArgs};

/// sw - Inspect and drive the offline cache controller
#[derive(Parser)]
#[command(name = "sw")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init(InitArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Show the strategy assigned to a URL
    Classify(ClassifyArgs),

    /// Pre-warm the static store for the configured version
    Precache(PrecacheArgs),

    /// Fetch a URL through the worker
    Fetch(FetchArgs),

    /// Delete cache stores from older versions
    Activate(ActivateArgs),

    /// List cache stores and their entries
    Caches(CachesArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    let mut log = ctx.config.log.clone();
    if cli.verbose {
        log.level = LogLevel::Debug;
    }
    if let Err(e) = init_logging(&log) {
        ctx.output.warn(&e.to_string());
    }

    // Execute command
    let result = match cli.command {
        Commands::Init(args) => commands::init::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
        Commands::Classify(args) => commands::classify::run(args, &ctx).await,
        Commands::Precache(args) => commands::precache::run(args, &ctx).await,
        Commands::Fetch(args) => commands::fetch::run(args, &ctx).await,
        Commands::Activate(args) => commands::activate::run(args, &ctx).await,
        Commands::Caches(args) => commands::caches::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
