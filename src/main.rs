use ace_graphs::cli::{self, OutputMode};
use ace_graphs::config::AceConfig;
use ace_graphs::graph::{CancellationToken, RunContext};
use ace_graphs::logging;
use ace_graphs::registry::{ChatRequest, WorkflowRegistry};
use ace_graphs::workflows::classwork::SEED_COUNT;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "ace")]
#[command(about = "Campus assistant workflows: admissions, classwork queries and placements")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory (defaults to current)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Suppress everything but the reply
    #[arg(long, global = true)]
    quiet: bool,

    /// Print replies as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Also write logs to the default log directory
    #[arg(long, global = true)]
    log: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workflow on one message
    Run {
        /// Workflow name (see `ace workflows`)
        workflow: String,

        /// Caller id passed to the workflow
        #[arg(long)]
        user_id: Option<i64>,

        /// Caller role id (admissions)
        #[arg(long)]
        role_id: Option<i64>,

        /// Caller role name (classwork, placements)
        #[arg(long)]
        role: Option<String>,

        /// Overall time limit in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Message text
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },

    /// List available workflows
    Workflows,

    /// Check oracle and student data
    Doctor,

    /// Write a synthetic student dataset
    SeedData {
        /// Output path (defaults to .ace/student_data.json)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Number of students
        #[arg(long, default_value_t = SEED_COUNT)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = match (&cli.log_file, cli.log) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => {
            let name = match &cli.command {
                Commands::Run { workflow, .. } => workflow.as_str(),
                _ => "ace",
            };
            Some(logging::default_log_path(name)?)
        }
        (None, false) => None,
    };
    let log_guard = logging::init_logging(cli.debug, cli.quiet, log_file)?;

    let project_dir = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let config = AceConfig::load(Some(project_dir.as_path()))?;
    debug!(dir = %project_dir.display(), "Configuration loaded");

    let mode = OutputMode::from_flags(cli.json || config.defaults.json, cli.quiet);
    let handler = cli::create_handler(mode, cli.debug);

    let code = match cli.command {
        Commands::Run {
            workflow,
            user_id,
            role_id,
            role,
            timeout,
            message,
        } => {
            let registry = WorkflowRegistry::from_config(&config, &project_dir)?;

            let token = CancellationToken::new();
            tokio::spawn(cli::setup_signal_handlers(token.clone()));

            let timeout = timeout
                .map(std::time::Duration::from_secs)
                .unwrap_or_else(|| config.defaults.run_timeout());
            let mut ctx = RunContext::new()
                .with_cancellation(token)
                .with_timeout(timeout);
            if let Some(limit) = config.defaults.max_steps {
                ctx = ctx.with_max_steps(limit);
            }

            let request = ChatRequest {
                message: message.join(" "),
                user_id,
                role_id,
                role,
            };
            cli::run_workflow(&registry, &workflow, request, &ctx, &*handler).await
        }

        Commands::Workflows => {
            cli::list_workflows(&*handler);
            0
        }

        Commands::Doctor => cli::doctor(&config, &project_dir, &*handler).await,

        Commands::SeedData { out, count } => {
            cli::seed_data(out.as_deref(), count, &project_dir, &*handler).await
        }
    };

    if code != 0 {
        drop(log_guard);
        std::process::exit(code);
    }

    Ok(())
}
