use anyhow::Result;
use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(name = "forkterm")]
#[command(about = "Fork terminal sessions for delegated agent tasks and track them to completion")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spawn a new terminal window running an AI agent or a raw command
    Fork(cli::fork::ForkArgs),

    /// Track forked tasks in the persistent registry
    #[command(subcommand)]
    Task(cli::task::TaskCommand),

    /// Manage isolated git worktrees for forked agents
    #[command(subcommand)]
    Worktree(cli::worktree::WorktreeCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for the JSON result
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Fork(args) => cli::fork::fork_command(args).await?,
        Commands::Task(command) => cli::task::task_command(command).await?,
        Commands::Worktree(command) => cli::worktree::worktree_command(command).await?,
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}
