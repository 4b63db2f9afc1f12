use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "vocadrill", version, about = "Spaced-repetition vocabulary drills")]
struct Cli {
    /// JSON catalog to use instead of the configured or bundled one
    #[arg(long, global = true, value_name = "PATH")]
    catalog: Option<PathBuf>,
    /// Log debug output to stderr (overridden by VOCADRILL_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List categories with known/total counts
    Categories {
        #[arg(long)]
        json: bool,
    },
    /// Overall and per-category progress
    Progress {
        #[arg(long)]
        json: bool,
    },
    /// Preview the order of the next session for a category
    Queue {
        category: String,
        #[arg(long)]
        json: bool,
    },
    /// Drill a category interactively
    Drill {
        category: String,
        /// Print session events as JSON lines instead of prompts
        #[arg(long)]
        json: bool,
    },
    /// Merge learning state exported from the browser app
    ImportLegacy {
        file: PathBuf,
    },
    /// Erase all learning state
    Reset,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("VOCADRILL_LOG").unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> commands::CmdResult {
    let catalog = cli.catalog.as_deref();
    match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "vocadrill", &mut std::io::stdout());
            Ok(())
        }
        Commands::Categories { json } => commands::categories::run(&Context::load(catalog)?, json),
        Commands::Progress { json } => commands::progress::run(&Context::load(catalog)?, json),
        Commands::Queue { category, json } => {
            commands::queue::run(&Context::load(catalog)?, &category, json)
        }
        Commands::Drill { category, json } => {
            commands::drill::run(&Context::load(catalog)?, &category, json)
        }
        Commands::ImportLegacy { file } => commands::import::run(&Context::load(catalog)?, &file),
        Commands::Reset => commands::reset::run(&Context::load(catalog)?),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
