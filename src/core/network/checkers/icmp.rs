//! ICMP echo checker
//!
//! Sends one echo request through the platform `ping` utility, which avoids
//! the elevated privileges raw ICMP sockets need. Success is read from the
//! textual summary ping prints, so both the success markers and the failure
//! phrases below are platform dependent.
//!
//! The child process is spawned with `kill_on_drop`, so a cancelled or
//! expired context terminates it instead of leaving an orphan.

use super::{elapsed_ms, IcmpChecker};
use crate::core::network::classify::{contains_any, ClassificationTable, Failure, Rule};
use crate::core::network::context::{ContextError, ProbeContext};
use crate::core::network::endpoint::Endpoint;
use crate::core::network::types::{Probe, Status};
use std::net::Ipv6Addr;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingPlatform {
    /// Linux, macOS, BSD: `ping -c N`
    Posix,
    /// Windows: `ping -n N`
    Windows,
}

impl PingPlatform {
    pub fn current() -> Self {
        if cfg!(windows) {
            PingPlatform::Windows
        } else {
            PingPlatform::Posix
        }
    }

    /// Arguments for `attempts` echo requests to `host`
    ///
    /// Hostnames are pinned to IPv4. IPv6 literals are left to the utility's
    /// own address-family detection.
    pub fn args(&self, host: &str, attempts: u32) -> Vec<String> {
        let count_flag = match self {
            PingPlatform::Posix => "-c",
            PingPlatform::Windows => "-n",
        };
        let mut args = vec![count_flag.to_string(), attempts.max(1).to_string()];
        let ipv6_literal = host.parse::<Ipv6Addr>().is_ok();
        // BSD-style ping is IPv4-only and rejects -4
        let accepts_family_flag = *self == PingPlatform::Windows || !cfg!(target_os = "macos");
        if accepts_family_flag && !ipv6_literal {
            args.push("-4".to_string());
        }
        args.push(host.to_string());
        args
    }
}

/// Decide from ping's combined output whether at least one reply arrived
pub fn is_ping_successful(output: &str, platform: PingPlatform, attempts: u32) -> bool {
    let output = output.to_lowercase();

    match platform {
        PingPlatform::Posix => {
            // "1 packets transmitted, 1 received, 0% packet loss"
            let total_loss =
                output.contains("100% packet loss") || output.contains("100.0% packet loss");
            if output.contains("received") && !total_loss {
                return true;
            }
            if output.contains(" 0 received") || output.contains(" 0 packets received") {
                return false;
            }
            output.contains("bytes from")
        }
        PingPlatform::Windows => {
            // "Packets: Sent = 1, Received = 1, Lost = 0 (0% loss)"
            if output.contains("received =") {
                return !output.contains(&format!("lost = {}", attempts.max(1)));
            }
            output.contains("reply from")
        }
    }
}

/// Failed ping as seen by the classifier: the process output plus any launch error
#[derive(Debug, Clone)]
pub struct PingFailure {
    pub output: String,
    pub launch_error: Option<String>,
    pub context: Option<ContextError>,
}

impl Failure for PingFailure {
    fn context_error(&self) -> Option<ContextError> {
        self.context
    }

    fn message_lower(&self) -> String {
        self.output.to_lowercase()
    }
}

const UNRESOLVED_PHRASES: &[&str] = &[
    "unknown host",
    "name or service not known",
    "nodename nor servname provided",
    "cannot resolve",
    "could not find host",
    "no address associated",
    "temporary failure in name resolution",
];

const UNREACHABLE_PHRASES: &[&str] = &[
    "network is unreachable",
    "host is unreachable",
    "destination host unreachable",
    "destination net unreachable",
    "operation timed out",
    "request timeout",
    "request timed out",
    "100% packet loss",
    "100.0% packet loss",
    "100% loss",
];

static PING_RULES: &[Rule<PingFailure>] = &[
    Rule {
        name: "unresolved_host",
        matches: |_, m| contains_any(m, UNRESOLVED_PHRASES),
        status: Status::DnsFailure,
    },
    Rule {
        name: "unreachable",
        matches: |_, m| contains_any(m, UNREACHABLE_PHRASES),
        status: Status::Timeout,
    },
];

static PING_TABLE: ClassificationTable<PingFailure> =
    ClassificationTable::new(PING_RULES, Status::Invalid);

/// Map a failed ping to a status: context, unresolvable host, unreachable/loss, else `Invalid`
pub fn classify_ping_failure(failure: &PingFailure) -> Status {
    PING_TABLE.classify(failure)
}

pub struct SystemIcmpChecker {
    program: String,
    platform: PingPlatform,
    attempts: u32,
}

impl SystemIcmpChecker {
    pub fn new(program: impl Into<String>, platform: PingPlatform, attempts: u32) -> Self {
        Self {
            program: program.into(),
            platform,
            attempts: attempts.max(1),
        }
    }
}

impl Default for SystemIcmpChecker {
    fn default() -> Self {
        Self::new("ping", PingPlatform::current(), 1)
    }
}

#[async_trait::async_trait]
impl IcmpChecker for SystemIcmpChecker {
    async fn check_ping(&self, ctx: &ProbeContext, endpoint: &Endpoint) -> Probe {
        if let Some(err) = ctx.err() {
            return Probe::failed(endpoint.clone(), Status::Timeout, err.to_string());
        }

        let mut command = Command::new(&self.program);
        command
            .args(self.platform.args(endpoint.target(), self.attempts))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let run = tokio::select! {
            res = command.output() => res,
            err = ctx.done() => {
                return Probe::failed(endpoint.clone(), Status::Timeout, err.to_string());
            }
        };
        let latency_ms = elapsed_ms(start);

        // A ping that cannot even be launched is treated like a failed ping
        let (output, launch_error) = match run {
            Ok(out) => {
                let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&out.stderr);
                if !stderr.trim().is_empty() {
                    text.push('\n');
                    text.push_str(&stderr);
                }
                if out.status.success() && is_ping_successful(&text, self.platform, self.attempts) {
                    return Probe::passed(endpoint.clone(), latency_ms);
                }
                (text, None)
            }
            Err(err) => (String::new(), Some(format!("launch {}: {}", self.program, err))),
        };

        let failure = PingFailure {
            output,
            launch_error,
            context: ctx.err(),
        };
        let status = classify_ping_failure(&failure);
        Probe::failed(endpoint.clone(), status, ping_error_message(&failure, endpoint))
    }
}

fn ping_error_message(failure: &PingFailure, endpoint: &Endpoint) -> String {
    if let Some(err) = &failure.launch_error {
        return err.clone();
    }
    let last_line = failure
        .output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last();
    match last_line {
        Some(line) => format!("ping {}: {}", endpoint.target(), line),
        None => format!("ping {}: no reply", endpoint.target()),
    }
}
