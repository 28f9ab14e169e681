use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "conference", author, version, about = "Conference registry service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the REST server.
    Serve(ServeArgs),
    /// Check a JSON document (object or array of objects) against the conference shape.
    CheckShape {
        /// JSON file to check; `-` reads stdin.
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Print core version information.
    Version,
}

/// Flags override values from `--config`.
#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// TOML configuration file.
    #[arg(long, value_name = "PATH", env = "CONFERENCE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "ADDR", env = "CONFERENCE_BIND")]
    pub bind: Option<IpAddr>,

    #[arg(long, env = "CONFERENCE_PORT")]
    pub port: Option<u16>,

    /// SQLite database file.
    #[arg(long, value_name = "PATH", env = "CONFERENCE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Prefix used in `X-<name>-alert` response headers.
    #[arg(long, value_name = "NAME", env = "CONFERENCE_APPLICATION_NAME")]
    pub application_name: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, value_name = "LEVEL", env = "CONFERENCE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logs go to stderr when unset.
    #[arg(long, value_name = "DIR", env = "CONFERENCE_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Allow cross-origin requests from any origin.
    #[arg(long, default_value_t = false)]
    pub cors_permissive: bool,
}
