use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use ngac_core::LogLevel;

mod commands;
mod policy;

use policy::PolicyFile;

/// NGAC Command Line Interface
///
/// Loads a policy file into an in-memory engine and answers access queries
/// against it.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Policy file: TOML, or JSON when the name ends in .json
    #[clap(long, short)]
    policy: PathBuf,

    /// Log level; overrides the one in the policy file. RUST_LOG wins over both
    #[clap(long, global = true)]
    log_level: Option<LogLevel>,

    /// Print results as JSON
    #[clap(long, global = true)]
    json: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a user holds operations on a target
    Check {
        #[clap(long)]
        user: String,

        #[clap(long)]
        target: String,

        /// Comma-separated operations; none means any access
        #[clap(long, value_delimiter = ',')]
        ops: Vec<String>,

        /// Process the user acts through
        #[clap(long)]
        process: Option<String>,
    },

    /// List the operations a user holds on a target
    List {
        #[clap(long)]
        user: String,

        #[clap(long)]
        target: String,

        #[clap(long)]
        process: Option<String>,
    },

    /// Show the paths granting a user access to a target
    Explain {
        #[clap(long)]
        user: String,

        #[clap(long)]
        target: String,
    },

    /// List every user with access to a target
    Acl {
        #[clap(long)]
        target: String,

        #[clap(long)]
        process: Option<String>,
    },

    /// List every node a user has access to
    Capabilities {
        #[clap(long)]
        user: String,

        #[clap(long)]
        process: Option<String>,
    },
}

fn init_logging(level: LogLevel) -> anyhow::Result<()> {
    let directive = level.to_level_filter().to_string().to_lowercase();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let policy = PolicyFile::from_path(&cli.policy)?;
    init_logging(cli.log_level.unwrap_or(policy.config.log_level))?;
    let pdp = policy.load()?;

    match cli.command {
        Commands::Check {
            user,
            target,
            ops,
            process,
        } => commands::check(&pdp, &user, process.as_deref(), &target, ops, cli.json),
        Commands::List {
            user,
            target,
            process,
        } => commands::list(&pdp, &user, process.as_deref(), &target, cli.json),
        Commands::Explain { user, target } => commands::explain(&pdp, &user, &target, cli.json),
        Commands::Acl { target, process } => {
            commands::acl(&pdp, &target, process.as_deref(), cli.json)
        }
        Commands::Capabilities { user, process } => {
            commands::capabilities(&pdp, &user, process.as_deref(), cli.json)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
