use crate::core::network::ExecutionPolicy;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 100;

#[derive(Parser, Debug)]
#[command(name = "netpath")]
#[command(version = concat!("Ver:", env!("CARGO_PKG_VERSION")))]
#[command(about = "Diagnose which network path works: direct, proxy or VPN")]
pub struct Cli {
    /// Endpoint configuration file (JSON or TOML); embedded defaults when omitted
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Execution policy: optimized skips protocol checks when ICMP fails
    #[arg(short = 'p', long = "policy", default_value_t = ExecutionPolicy::Optimized)]
    pub policy: ExecutionPolicy,

    /// Overall deadline for the whole run, in seconds
    #[arg(short = 't', long = "timeout-secs", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Print single-line JSON
    #[arg(long = "compact")]
    pub compact: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
