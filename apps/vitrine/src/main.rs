use clap::Parser;
use tracing::debug;
use vitrine::telemetry::logging as logctl;
use vitrine::terminal::cli::{Cli, Command};
use vitrine::terminal::error::CliError;
use vitrine::terminal::view;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let log_config = cli.logging.to_config();
    logctl::init(&log_config).map_err(|err| CliError::Logging(err.to_string()))?;
    debug!(log_level = ?log_config.level, log_file = ?log_config.file, "logging configured");

    match cli.command {
        Command::View(args) => view::run_view(args).await,
        Command::Discover(args) => view::run_discover(args).await,
    }
}
