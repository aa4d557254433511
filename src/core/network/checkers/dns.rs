//! DNS resolution checker
//!
//! Resolves the endpoint host with the system resolver (getaddrinfo through
//! tokio's blocking pool). Resolver errors surface as `io::Error` with
//! platform-specific text: `getaddrinfo` codes only survive as their
//! `gai_strerror` message, which [`DnsFailure::from_io`] maps back to a kind.
//! Classification still falls back to known phrases after the structured
//! checks.

use super::{elapsed_ms, DnsChecker};
use crate::core::network::classify::{contains_any, ClassificationTable, Failure, Rule};
use crate::core::network::context::{ContextError, ProbeContext};
use crate::core::network::endpoint::Endpoint;
use crate::core::network::types::{Probe, Status};
use std::io;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsFailureKind {
    /// Authoritative "no such host"
    NotFound,
    /// Resolver gave up waiting
    Timeout,
    /// Resolver answered with a temporary or non-recoverable failure
    /// (`EAI_AGAIN`, `EAI_FAIL`, SERVFAIL)
    ServerMisbehaving,
    /// Lookup succeeded with zero addresses
    NoAddresses,
    Other,
}

/// Native resolver failure
#[derive(Debug, Clone)]
pub struct DnsFailure {
    pub kind: DnsFailureKind,
    pub message: String,
    pub context: Option<ContextError>,
}

impl DnsFailure {
    pub fn from_io(err: &io::Error, context: Option<ContextError>) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::TimedOut => DnsFailureKind::Timeout,
            io::ErrorKind::NotFound => DnsFailureKind::NotFound,
            _ => gai_kind(&err.to_string().to_lowercase()),
        };
        Self {
            kind,
            message: err.to_string(),
            context,
        }
    }
}

/// `gai_strerror` texts (glibc, musl, BSD/macOS) by failure kind
const GAI_NOT_FOUND: &[&str] = &[
    "name or service not known",
    "nodename nor servname provided",
    "no address associated with hostname",
    "name does not resolve",
];

const GAI_SERVER_FAILURE: &[&str] = &[
    "temporary failure in name resolution",
    "non-recoverable failure in name resolution",
    "non-recoverable error",
    "try again",
];

fn gai_kind(message: &str) -> DnsFailureKind {
    if contains_any(message, GAI_NOT_FOUND) {
        DnsFailureKind::NotFound
    } else if contains_any(message, GAI_SERVER_FAILURE) {
        DnsFailureKind::ServerMisbehaving
    } else {
        DnsFailureKind::Other
    }
}

impl Failure for DnsFailure {
    fn context_error(&self) -> Option<ContextError> {
        self.context
    }

    fn message_lower(&self) -> String {
        self.message.to_lowercase()
    }
}

const NOT_FOUND_PHRASES: &[&str] = &[
    "no such host",
    "nxdomain",
    "name or service not known",
    "nodename nor servname provided",
    "host not found",
    "no address associated",
    "cannot unmarshal dns",
];

const TIMEOUT_PHRASES: &[&str] = &[
    "server misbehaving",
    "timed out",
    "timeout",
    "temporary failure in name resolution",
    "network is unreachable",
];

static DNS_RULES: &[Rule<DnsFailure>] = &[
    Rule {
        name: "not_found",
        matches: |f, _| matches!(f.kind, DnsFailureKind::NotFound | DnsFailureKind::NoAddresses),
        status: Status::DnsFailure,
    },
    Rule {
        name: "resolver_timeout",
        matches: |f, _| {
            matches!(f.kind, DnsFailureKind::Timeout | DnsFailureKind::ServerMisbehaving)
        },
        status: Status::Timeout,
    },
    Rule {
        name: "text_not_found",
        matches: |_, m| contains_any(m, NOT_FOUND_PHRASES),
        status: Status::DnsFailure,
    },
    Rule {
        name: "text_timeout",
        matches: |_, m| contains_any(m, TIMEOUT_PHRASES),
        status: Status::Timeout,
    },
];

static DNS_TABLE: ClassificationTable<DnsFailure> =
    ClassificationTable::new(DNS_RULES, Status::Invalid);

/// Map a resolver failure to a status
///
/// Priority: context, host-not-found, resolver timeout / server misbehaving,
/// known phrases, then `Invalid`.
pub fn classify_dns_failure(failure: &DnsFailure) -> Status {
    DNS_TABLE.classify(failure)
}

#[derive(Debug, Default)]
pub struct SystemDnsChecker;

#[async_trait::async_trait]
impl DnsChecker for SystemDnsChecker {
    async fn check(&self, ctx: &ProbeContext, endpoint: &Endpoint) -> Probe {
        if let Some(err) = ctx.err() {
            return Probe::failed(endpoint.clone(), Status::Timeout, err.to_string());
        }

        let host = endpoint.target();
        let start = Instant::now();

        let lookup = tokio::select! {
            res = tokio::net::lookup_host((host, 0u16)) => res,
            err = ctx.done() => {
                return Probe::failed(endpoint.clone(), Status::Timeout, err.to_string());
            }
        };
        let latency_ms = elapsed_ms(start);

        let failure = match lookup {
            Ok(addrs) => {
                if addrs.count() > 0 {
                    return Probe::passed(endpoint.clone(), latency_ms);
                }
                DnsFailure {
                    kind: DnsFailureKind::NoAddresses,
                    message: format!("lookup {}: no addresses returned", host),
                    context: ctx.err(),
                }
            }
            Err(err) => {
                let mut failure = DnsFailure::from_io(&err, ctx.err());
                failure.message = format!("lookup {}: {}", host, failure.message);
                failure
            }
        };

        let status = classify_dns_failure(&failure);
        Probe::failed(endpoint.clone(), status, failure.message)
    }
}
