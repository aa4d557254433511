//! TCP connect checker
//!
//! Opens a single connection with a bounded dial timeout and closes it
//! immediately. No retries; retry policy belongs to the caller.

use super::{elapsed_ms, TcpChecker};
use crate::core::network::classify::{ClassificationTable, Failure, Rule};
use crate::core::network::context::{ContextError, ProbeContext};
use crate::core::network::endpoint::Endpoint;
use crate::core::network::types::{Probe, Status};
use std::io;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpFailureKind {
    Refused,
    DialTimeout,
    Other,
}

/// Native TCP dial failure
#[derive(Debug, Clone)]
pub struct TcpFailure {
    pub kind: TcpFailureKind,
    pub message: String,
    pub context: Option<ContextError>,
}

impl TcpFailure {
    pub fn from_io(err: &io::Error, context: Option<ContextError>) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::ConnectionRefused => TcpFailureKind::Refused,
            io::ErrorKind::TimedOut => TcpFailureKind::DialTimeout,
            _ => TcpFailureKind::Other,
        };
        Self {
            kind,
            message: err.to_string(),
            context,
        }
    }
}

impl Failure for TcpFailure {
    fn context_error(&self) -> Option<ContextError> {
        self.context
    }

    fn message_lower(&self) -> String {
        self.message.to_lowercase()
    }
}

static TCP_RULES: &[Rule<TcpFailure>] = &[
    Rule {
        name: "refused",
        matches: |f, _| f.kind == TcpFailureKind::Refused,
        status: Status::ConnectionRefused,
    },
    Rule {
        name: "dial_timeout",
        matches: |f, _| f.kind == TcpFailureKind::DialTimeout,
        status: Status::Timeout,
    },
];

static TCP_TABLE: ClassificationTable<TcpFailure> =
    ClassificationTable::new(TCP_RULES, Status::Fail);

/// Map a TCP dial failure to a status: context, refused, dial timeout, else `Fail`
pub fn classify_tcp_failure(failure: &TcpFailure) -> Status {
    TCP_TABLE.classify(failure)
}

pub struct TokioTcpChecker {
    dial_timeout: Duration,
}

impl TokioTcpChecker {
    pub fn new(dial_timeout: Duration) -> Self {
        Self { dial_timeout }
    }
}

impl Default for TokioTcpChecker {
    fn default() -> Self {
        Self::new(DEFAULT_DIAL_TIMEOUT)
    }
}

#[async_trait::async_trait]
impl TcpChecker for TokioTcpChecker {
    async fn check(&self, ctx: &ProbeContext, endpoint: &Endpoint) -> Probe {
        if let Some(err) = ctx.err() {
            return Probe::failed(endpoint.clone(), Status::Timeout, err.to_string());
        }

        let dial_timeout = ctx.bounded(self.dial_timeout);
        let start = Instant::now();

        let outcome = tokio::select! {
            res = tokio::time::timeout(dial_timeout, TcpStream::connect(endpoint.target())) => res,
            err = ctx.done() => {
                return Probe::failed(endpoint.clone(), Status::Timeout, err.to_string());
            }
        };
        let latency_ms = elapsed_ms(start);

        match outcome {
            Ok(Ok(stream)) => {
                drop(stream);
                Probe::passed(endpoint.clone(), latency_ms)
            }
            Ok(Err(err)) => {
                let failure = TcpFailure::from_io(&err, ctx.err());
                let status = classify_tcp_failure(&failure);
                Probe::failed(endpoint.clone(), status, format!("dial {}: {}", endpoint.target(), err))
            }
            Err(_elapsed) => {
                let failure = TcpFailure {
                    kind: TcpFailureKind::DialTimeout,
                    message: format!("dial {}: i/o timeout", endpoint.target()),
                    context: ctx.err(),
                };
                let status = classify_tcp_failure(&failure);
                Probe::failed(endpoint.clone(), status, failure.message)
            }
        }
    }
}
