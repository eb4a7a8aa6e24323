//! Roster CLI - list, edit and sync user records from the terminal.

mod commands;
mod context;
mod output;

use clap::{Parser, Subcommand};
use commands::ListArgs;
use context::Context;
use record_store_client::RecordId;
use roster_config_and_utils::{init_logging, Config, Paths};
use std::path::PathBuf;
use tracing::debug;
use view_projector::SortKey;

/// Roster CLI - Manage user records with offline fallback and live updates.
#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Roster CLI for managing user records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to log_level in config
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Record service URL (overrides config and ROSTER_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
}

impl Cli {
    /// The flag wins over config, which already folds in ROSTER_LOG_LEVEL.
    fn log_level<'a>(&'a self, config: &'a Config) -> &'a str {
        self.log_level.as_deref().unwrap_or(&config.log_level)
    }
}

#[derive(clap::Args, Debug, Clone)]
struct ViewArgs {
    /// Case-insensitive match on name or email
    #[arg(short, long)]
    query: Option<String>,

    /// Sort column (id, name, email)
    #[arg(short, long, default_value = "id")]
    sort: SortKey,

    /// Sort descending
    #[arg(long)]
    desc: bool,

    /// Page number, starting at 1
    #[arg(short, long, default_value = "1")]
    page: usize,

    /// Rows per page (defaults to page_size in config)
    #[arg(long)]
    page_size: Option<usize>,
}

impl From<ViewArgs> for ListArgs {
    fn from(args: ViewArgs) -> Self {
        ListArgs {
            query: args.query,
            sort: args.sort,
            desc: args.desc,
            page: args.page,
            page_size: args.page_size,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List records
    List(ViewArgs),

    /// Show record details
    Show {
        /// Record ID
        id: RecordId,
    },

    /// Create a record
    Create {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
    },

    /// Update a record
    Update {
        /// Record ID
        id: RecordId,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Delete a record
    Delete {
        /// Record ID
        id: RecordId,
    },

    /// Delete several records; none are deleted if any delete fails
    BulkDelete {
        /// Record IDs
        #[arg(required = true)]
        ids: Vec<RecordId>,
    },

    /// Import records from a CSV file (id,name,email)
    Import {
        /// CSV file
        file: PathBuf,
    },

    /// Export records as CSV
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only export records matching this query
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Print the listing again whenever a pushed update arrives
    Watch(ViewArgs),
}

async fn run(cli: Cli, mut config: Config, paths: Paths) -> anyhow::Result<()> {
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    let ctx = Context::open(config, &paths, cli.format).await?;

    match cli.command {
        Commands::List(args) => commands::records_list(&ctx, &args.into()).await,
        Commands::Show { id } => commands::records_show(&ctx, id).await,
        Commands::Create { name, email } => commands::records_create(&ctx, name, email).await,
        Commands::Update { id, name, email } => {
            commands::records_update(&ctx, id, name, email).await
        }
        Commands::Delete { id } => commands::records_delete(&ctx, id).await,
        Commands::BulkDelete { ids } => commands::records_bulk_delete(&ctx, &ids).await,
        Commands::Import { file } => commands::records_import(&ctx, &file).await,
        Commands::Export { output, query } => {
            commands::records_export(&ctx, output.as_deref(), query.as_deref()).await
        }
        Commands::Watch(args) => commands::records_watch(&ctx, &args.into()).await,
    }
}

async fn bootstrap(cli: Cli) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config = Config::load(&paths)?;
    match init_logging(cli.log_level(&config), &paths) {
        Ok(log_path) => debug!(log_path = %log_path.display(), "Logging to file"),
        Err(e) => eprintln!("Warning: logging disabled: {e}"),
    }
    run(cli, config, paths).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = bootstrap(cli).await {
        output::print_error(&format!("{e:#}"), &format);
        std::process::exit(1);
    }
}
