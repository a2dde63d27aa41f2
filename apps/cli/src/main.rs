//! Remediar CLI
//!
//! Staff-side front end for the medication request workflow: list and
//! inspect requests, move them through their lifecycle and browse stock.

mod commands;
mod config;
mod logging;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "remediar")]
#[command(about = "Manage medication donation requests", version)]
struct Cli {
    /// Configuration file (defaults to ./remediar.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bearer token, overriding the configured session token
    #[arg(long, global = true, env = "REMEDIAR_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List one page of requests
    List {
        /// Zero-based page
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Status to list (ALL for every status)
        #[arg(long, default_value = "ALL")]
        status: String,

        /// Advanced filter, FIELD:OPERATOR:VALUE (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// First request day, yyyy-MM-dd or dd/MM/yyyy
        #[arg(long)]
        from: Option<String>,

        /// Last request day, yyyy-MM-dd or dd/MM/yyyy
        #[arg(long)]
        to: Option<String>,
    },

    /// Show one request with its requester profile
    Show {
        id: String,

        /// Page the request is on
        #[arg(long, default_value_t = 0)]
        page: u32,
    },

    /// Perform a lifecycle action (assume, approve, reject, separate, ready, cancel, finalize)
    Act {
        id: String,
        action: String,

        #[arg(long, default_value_t = 0)]
        page: u32,
    },

    /// Set a status directly, bypassing the lifecycle rules
    Override {
        id: String,
        status: String,

        #[arg(long, default_value_t = 0)]
        page: u32,
    },

    /// List the items of a stock location
    Stock {
        stock_id: String,

        /// Advanced filter, FIELD:OPERATOR:VALUE (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Quick search over name, active ingredient and presentation
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value_t = 0)]
        page: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        config::AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
    if let Some(token) = cli.token {
        config.session.token = Some(token);
    }

    let _logging_guard =
        logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        api = %config.client.api_base_url,
        "Starting remediar"
    );

    let app = commands::App::new(&config)?;
    match cli.command {
        Commands::List {
            page,
            status,
            filters,
            from,
            to,
        } => app.list(page, &status, &filters, from.as_deref(), to.as_deref()).await,
        Commands::Show { id, page } => app.show(&id, page).await,
        Commands::Act { id, action, page } => app.act(&id, &action, page).await,
        Commands::Override { id, status, page } => app.override_status(&id, &status, page).await,
        Commands::Stock {
            stock_id,
            filters,
            search,
            page,
        } => app.stock(&stock_id, &filters, search.as_deref(), page).await,
    }
}
