//! search-session: operator CLI for persisted search sessions.
//!
//! Drives a `SessionService` against the file-backed session store named in
//! `~/.search-session/config.toml`.
//!
//! ## Subcommands
//!
//! - `save`: start (or restore) a session for an app and persist it
//! - `list`: print every stored session, one JSON object per line
//! - `show`: pretty-print one stored session
//! - `delete`: remove a stored session

mod logging;
mod save;
mod store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "search-session")]
#[command(about = "Save and inspect persisted search sessions")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.search-session/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session for an application and persist it
    Save(save::SaveArgs),

    /// List stored sessions as JSON lines
    List,

    /// Show one stored session
    Show {
        #[arg(value_name = "SESSION_ID")]
        session_id: String,
    },

    /// Delete a stored session
    Delete {
        #[arg(value_name = "SESSION_ID")]
        session_id: String,
    },
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "Failed to start async runtime");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        let config = search_session::load_config(cli.config)?;
        match cli.command {
            Commands::Save(args) => save::run(&config, args).await.map(|session_id| {
                println!("{}", session_id);
            }),
            Commands::List => store::list(&config).await,
            Commands::Show { session_id } => store::show(&config, &session_id).await,
            Commands::Delete { session_id } => store::delete(&config, &session_id).await,
        }
    });

    if let Err(err) = result {
        tracing::error!(error = %err, "search-session failed");
        eprintln!("search-session: {}", err);
        std::process::exit(1);
    }
}
