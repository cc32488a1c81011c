#![forbid(unsafe_code)]

mod author;
mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "huddle: standup snapshots, daily locks, and RAG rollups",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Override author identity (skips env resolution).
    #[arg(long, global = true)]
    author: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }

    /// Get the author flag as an `Option<&str>` for resolution.
    fn author_flag(&self) -> Option<&str> {
        self.author.as_deref()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a huddle project",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    hud init"
    )]
    Init(cmd::init::InitArgs),

    #[command(next_help_heading = "Plumbing", about = "Manage projects")]
    Project {
        #[command(subcommand)]
        command: cmd::project::ProjectCommand,
    },

    #[command(next_help_heading = "Plumbing", about = "Manage sprints")]
    Sprint {
        #[command(subcommand)]
        command: cmd::sprint::SprintCommand,
    },

    #[command(next_help_heading = "Plumbing", about = "Manage cards")]
    Card {
        #[command(subcommand)]
        command: cmd::card::CardCommand,
    },

    #[command(
        next_help_heading = "Standup",
        about = "Record and manage standup snaps",
        after_help = "EXAMPLES:\n    # Record a snap for a card\n    hud snap add <CARD> --text \"Completed login page, starting API tomorrow\"\n\n    # Classify without persisting\n    hud snap parse --text \"blocked on credentials\""
    )]
    Snap {
        #[command(subcommand)]
        command: cmd::snap::SnapCommand,
    },

    #[command(
        next_help_heading = "Standup",
        about = "Freeze a day or slot (exactly-once)",
        after_help = "EXAMPLES:\n    # Lock today for a sprint\n    hud lock day --sprint <SPRINT>\n\n    # Scheduler entry point\n    hud lock auto --sprint <SPRINT>"
    )]
    Lock {
        #[command(subcommand)]
        command: cmd::lock::LockCommand,
    },

    #[command(
        next_help_heading = "Reporting",
        about = "Generate or fetch the daily summary"
    )]
    Summary(cmd::summary::SummaryArgs),

    #[command(
        next_help_heading = "Reporting",
        about = "RAG rollups, history, and suggestions"
    )]
    Rag {
        #[command(subcommand)]
        command: cmd::rag::RagCommand,
    },
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter = std::env::var("HUDDLE_LOG")
        .map_or_else(|_| EnvFilter::new(default_directive), EnvFilter::new);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = cli.output_mode();
    let author_flag = cli.author_flag();
    let project_root: PathBuf = std::env::current_dir()?;

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, &project_root),
        Commands::Project { command } => cmd::project::run_project(command, output, &project_root),
        Commands::Sprint { command } => cmd::sprint::run_sprint(command, output, &project_root),
        Commands::Card { command } => cmd::card::run_card(command, output, &project_root),
        Commands::Snap { command } => {
            cmd::snap::run_snap(command, author_flag, output, &project_root)
        }
        Commands::Lock { command } => {
            cmd::lock::run_lock(command, author_flag, output, &project_root)
        }
        Commands::Summary(args) => cmd::summary::run_summary(args, output, &project_root),
        Commands::Rag { command } => cmd::rag::run_rag(command, output, &project_root),
    }
}
