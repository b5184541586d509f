// Entrypoint for the CLI application.
// - Validates the email argument before touching config or the network.
// - Builds the HTTP client from the environment and hands it, together
//   with the interactive terminal, to the workflow.
// - Maps the workflow outcome to the process exit code.

use anyhow::Context;
use clap::Parser;
use org_assign::api::ApiClient;
use org_assign::config::{self, Config};
use org_assign::http::HttpManagementApi;
use org_assign::ui::DialoguerTerminal;
use org_assign::workflow::Workflow;
use std::path::PathBuf;

/// Add a user to organizations and attach organization roles.
#[derive(Debug, Parser)]
#[command(name = "org-assign", version, about)]
struct Cli {
    /// Email address of the user to assign
    email: String,

    /// Load configuration from this .env file instead of the default locations
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Stop after the review step without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    init_tracing(cli.quiet, cli.verbose)?;

    // Fail on a bad argument before anything else can.
    let email = org_assign::email::normalize(&cli.email)?;

    if let Some(path) = config::load_dotenv(cli.env_file.as_deref())? {
        tracing::debug!(path = %path.display(), "loaded env file");
    }
    let config = Config::from_env()?;
    tracing::debug!(domain = %config.domain, credentials = ?config.credentials, "configuration loaded");

    let remote = HttpManagementApi::connect(&config).context("failed to connect to the management API")?;
    let client = ApiClient::new(remote);
    let mut terminal = DialoguerTerminal::new();

    let outcome = Workflow::new(&client, &mut terminal)
        .dry_run(cli.dry_run)
        .run(&email)?;
    Ok(outcome.exit_code())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("ORG_ASSIGN_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
