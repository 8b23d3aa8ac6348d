use clap::Parser;
use std::path::PathBuf;

/// Startup options. Everything else arrives over the request channel.
#[derive(Debug, Clone, Parser)]
#[command(name = "rankd", version, about = "Student ranking sidecar (JSON lines on stdin/stdout)")]
pub struct DaemonConfig {
    /// Workspace directory to open before reading requests
    #[arg(long, env = "RANKD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (logs go to stderr)
    #[arg(long, env = "RANKD_LOG", default_value = "rankd=info")]
    pub log_filter: String,
}
