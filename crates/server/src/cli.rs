//! Command-line arguments.

use clap::Parser;

/// Charter operations disruption monitor: HTTP boundary and schedulers.
#[derive(Parser, Debug)]
#[command(name = "charterops-server", version, about)]
pub struct Cli {
    /// Config profile; keys are read as {PROFILE}_{KEY} before {KEY}.
    #[arg(long, env = "CHARTEROPS_PROFILE", default_value = "")]
    pub profile: String,

    /// Override the listen port from config.
    #[arg(long)]
    pub port: Option<u16>,

    /// Seed the in-memory store with demo flights and crew.
    #[arg(long)]
    pub demo: bool,

    /// Serve without starting the periodic detector and sweep.
    #[arg(long)]
    pub no_monitor: bool,
}
