//! LUMIN CLI - Command line interface for LUMIN.AI GitHub automation
//!
//! Creates issues, epics, milestones and labels from project documents, keeps
//! the Projects V2 board in sync and validates the repository setup.

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use lumin_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{
    CiArgs, Context, EpicsArgs, IssuesArgs, LabelsArgs, LinkDocsArgs, MarkDeletedArgs,
    MilestonesArgs, PruneArgs, SetupArgs, SyncArgs,
};

/// LUMIN.AI GitHub automation
#[derive(Parser, Debug)]
#[command(name = "lumin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// GitHub personal access token
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository owner (overrides config and env)
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Repository name, `owner/repo`, or a GitHub URL
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Projects V2 board title (overrides config and env)
    #[arg(long, global = true)]
    project: Option<String>,

    /// Log what would change without writing anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, global = true, value_enum, ignore_case = true, default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create issues from an issues export or convert PRDs into one
    #[command(visible_alias = "i")]
    Issues(IssuesArgs),

    /// Create epics from PRD documents
    Epics(EpicsArgs),

    /// Create milestones from roadmap documents
    Milestones(MilestonesArgs),

    /// Create, validate or fix labels
    Labels(LabelsArgs),

    /// Add open issues that are on no board to the project
    Sync(SyncArgs),

    /// Check everything the board automation depends on
    ValidateSetup(SetupArgs),

    /// Run the CI checks and report
    Ci(CiArgs),

    /// Lock and retitle closed issues as deleted
    MarkDeleted(MarkDeletedArgs),

    /// Close open issues that are out of scope
    Prune(PruneArgs),

    /// Comment related documentation sections on issues
    LinkDocs(LinkDocsArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.directive()));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // `--repo` may carry the owner too
    let (owner, repo) = match cli.repo.as_deref() {
        Some(repo) if repo.contains('/') => {
            let (owner, repo) = lumin_github::parse_github_url(repo)?;
            (Some(owner), Some(repo))
        }
        _ => (cli.owner.clone(), cli.repo.clone()),
    };
    let config = Config::load_with_overrides(owner, repo, cli.project.clone())?;

    tracing::debug!(
        repository = %config.repository(),
        project = %config.github.project,
        dry_run = cli.dry_run,
        "Configuration loaded"
    );

    let ctx = Context::new(config, cli.token.clone(), cli.dry_run);

    match cli.command {
        Commands::Issues(args) => args.execute(&ctx).await,
        Commands::Epics(args) => args.execute(&ctx).await,
        Commands::Milestones(args) => args.execute(&ctx).await,
        Commands::Labels(args) => args.execute(&ctx).await,
        Commands::Sync(args) => args.execute(&ctx).await,
        Commands::ValidateSetup(args) => args.execute(&ctx).await,
        Commands::Ci(args) => args.execute(&ctx).await,
        Commands::MarkDeleted(args) => args.execute(&ctx).await,
        Commands::Prune(args) => args.execute(&ctx).await,
        Commands::LinkDocs(args) => args.execute(&ctx).await,
        Commands::Config => {
            commands::config::show(&ctx);
            Ok(ExitCode::SUCCESS)
        }
    }
}
