//! CLI command implementations.

pub mod activate;
pub mod caches;
pub mod classify;
pub mod config;
pub mod fetch;
pub mod init;
pub mod precache;

use clap::{Args, Subcommand};

/// Arguments for the init command.
#[derive(Args)]
pub struct InitArgs {
    /// Site name shown on the offline page.
    #[arg(short, long)]
    pub site_name: Option<String>,

    /// Origin the worker is registered on.
    #[arg(short, long, default_value = "http://localhost:3000/")]
    pub origin: String,

    /// Overwrite an existing config file.
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Get a config value.
    Get {
        /// Config key (dot-separated).
        key: String,
    },
    /// Validate the configuration.
    Validate,
}

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// URLs to classify.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Request method.
    #[arg(short, long, default_value = "GET")]
    pub method: String,

    /// Classify as a page navigation (Accept: text/html).
    #[arg(long)]
    pub navigate: bool,
}

/// Arguments for the precache command.
#[derive(Args)]
pub struct PrecacheArgs {
    /// Override the configured origin.
    #[arg(long)]
    pub origin: Option<String>,
}

/// Arguments for the fetch command.
#[derive(Args)]
pub struct FetchArgs {
    /// URL to fetch.
    pub url: String,

    /// Request method.
    #[arg(short, long, default_value = "GET")]
    pub method: String,

    /// Fetch as a page navigation (Accept: text/html).
    #[arg(long)]
    pub navigate: bool,

    /// Simulate having no network.
    #[arg(long)]
    pub offline: bool,

    /// Print the response body.
    #[arg(short, long)]
    pub body: bool,
}

/// Arguments for the activate command.
#[derive(Args)]
pub struct ActivateArgs {
    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,

    /// Show what would be deleted without deleting.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the caches command.
#[derive(Args)]
pub struct CachesArgs {
    /// List the entries of every store.
    #[arg(short, long)]
    pub entries: bool,
}
