use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::telemetry::logging::{LogConfig, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "vitrine",
    about = "🖼️  Open IIIF resources and negotiate access to protected ones",
    author,
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub logging: LoggingArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    #[arg(
        long = "log-level",
        value_enum,
        env = "VITRINE_LOG_LEVEL",
        default_value_t = LogLevel::Warn,
        help = "Minimum log level (error, warn, info, debug, trace)"
    )]
    pub level: LogLevel,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        env = "VITRINE_LOG_FILE",
        help = "Write structured logs to the specified file"
    )]
    pub file: Option<PathBuf>,
}

impl LoggingArgs {
    pub fn to_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            file: self.file.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a resource and negotiate access interactively
    View(ViewArgs),
    /// Show the auth services a resource advertises
    Discover(DiscoverArgs),
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    #[arg(
        value_name = "RESOURCE",
        help = "Resource base URI (info.json is appended)"
    )]
    pub resource: String,

    #[arg(
        long = "auto-login",
        action = clap::ArgAction::SetTrue,
        help = "Start the login negotiation without prompting when a login service is present"
    )]
    pub auto_login: bool,
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    #[arg(
        value_name = "RESOURCE",
        help = "Resource base URI (info.json is appended)"
    )]
    pub resource: String,
}
