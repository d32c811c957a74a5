use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use coindash::core::log::init_logging;
use coindash::core::record::{TargetType, Vote};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for coindash::AppCommand {
    fn from(cmd: Commands) -> coindash::AppCommand {
        match cmd {
            Commands::Dashboard { json } => coindash::AppCommand::Dashboard { json },
            Commands::Prices { ids } => coindash::AppCommand::Prices(ids),
            Commands::News => coindash::AppCommand::News,
            Commands::Insight => coindash::AppCommand::Insight,
            Commands::Vote {
                target_type,
                target_id,
                vote,
            } => coindash::AppCommand::Vote {
                target_type,
                target_id,
                vote,
            },
            Commands::Purge => coindash::AppCommand::Purge,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the personalized dashboard
    Dashboard {
        /// Print the payload as JSON
        #[arg(long)]
        json: bool,
    },
    /// Display coin prices (defaults to the configured assets)
    Prices { ids: Vec<String> },
    /// Display hot market news
    News,
    /// Generate an insight for the configured profile
    Insight,
    /// Vote on a dashboard item
    Vote {
        /// news, price, insight or meme
        target_type: TargetType,
        target_id: String,
        /// up or down
        vote: Vote,
    },
    /// Remove expired records from the cache
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => coindash::cli::setup::setup(),
        Some(cmd) => coindash::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
