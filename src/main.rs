//! # HIP Search CLI (`hips`)
//!
//! ## Usage
//!
//! ```bash
//! hips --config ./config/hips.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `hips search "<query>"` | Search published and draft HIPs |
//! | `hips drafts` | List open drafts enriched from their proposal files |
//! | `hips sources` | Show where each feed resolves and whether it loads |
//! | `hips status [name]` | Describe a lifecycle status |
//! | `hips validate <file>` | Validate a draft's header with the remote service |
//! | `hips serve` | Start the HTTP search server |
//!
//! A missing config file is not an error; built-in defaults apply.

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use hip_search::config;
use hip_search::enrich;
use hip_search::logging;
use hip_search::present::TerminalPresenter;
use hip_search::server;
use hip_search::session::{HipSearch, SearchMode, SearchOptions};
use hip_search::sources;
use hip_search::status;
use hip_search::validate::Validator;

/// HIP Search: find published and draft improvement proposals.
#[derive(Parser)]
#[command(name = "hips", version, about = "Search and enrichment for HIP documentation sites")]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/hips.toml`. When the file does not exist the
    /// built-in defaults are used.
    #[arg(long, global = true, default_value = "./config/hips.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search published and draft HIPs.
    ///
    /// Loads both feeds, builds the merged index and prints ranked
    /// results. Falls back to published-only matching when the index
    /// cannot be built.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,

        /// Omit result links.
        #[arg(long)]
        no_links: bool,
    },

    /// List open draft HIPs.
    ///
    /// Fetches each pull request's proposal file at its head commit and
    /// reads title, authors and council approval from the front matter.
    Drafts {
        /// Print drafts as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show feed locations and whether they load.
    Sources,

    /// Describe a lifecycle status, or list them all.
    Status {
        /// Status name (e.g. `Last Call`). Matching is exact.
        name: Option<String>,
    },

    /// Validate a draft HIP's header.
    ///
    /// Sends the file to the validation service. The bearer token is read
    /// from the environment variable named by `[validator].token_env`.
    /// Exits non-zero when the header is rejected.
    Validate {
        /// Path to the draft HIP file.
        path: PathBuf,
    },

    /// Start the HTTP search server.
    ///
    /// Binds to the address configured in `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    let cfg = config::load_or_minimal(&cli.config)?;

    match cli.command {
        Commands::Search {
            query,
            limit,
            json,
            no_links,
        } => {
            let mut options = SearchOptions::from_config(&cfg);
            if let Some(limit) = limit {
                if limit < 1 {
                    bail!("--limit must be >= 1");
                }
                options.limit = limit;
            }

            let session = HipSearch::new(options);
            if session.init().await == SearchMode::Disabled {
                bail!("search is disabled: no source could be loaded");
            }

            if json {
                let results = session.search(&query);
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                let presenter = TerminalPresenter::new(std::io::stdout().lock());
                let mut presenter = if no_links {
                    presenter.without_links()
                } else {
                    presenter
                };
                session.handle_input(&query, &mut presenter);
            }
        }
        Commands::Drafts { json } => {
            enrich::list_drafts(&cfg, json).await?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg).await?;
        }
        Commands::Status { name } => match name {
            Some(name) => println!("{}", status::describe_status(&name)),
            None => {
                for name in status::status_names() {
                    println!("{:<10} {}", name, status::describe_status(name));
                }
            }
        },
        Commands::Validate { path } => {
            println!("Validating {}", path.display());
            let timeout = Duration::from_secs(cfg.sources.timeout_secs);
            let validator = Validator::from_config(&cfg.validator, timeout)?;
            let verdict = validator.validate_file(&path).await?;
            if verdict.is_valid {
                println!("Great Success");
            } else {
                println!("You must correct the following header errors to pass validation:");
                for issue in &verdict.issues {
                    println!("  {}", issue);
                }
                std::process::exit(1);
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
