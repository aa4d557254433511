// Core types for connectivity diagnosis
use crate::core::network::endpoint::{Endpoint, EndpointClass, TargetKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cross-protocol probe outcome taxonomy
///
/// Every checker maps its native failure surface onto exactly one of these
/// values. `Invalid` is the explicit catch-all so no outcome is left
/// unclassified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Endpoint reached (TCP connected, name resolved, HTTP 2xx/3xx, echo reply)
    Pass,
    /// Generic failure with no more specific classification
    Fail,
    /// Deadline, cancellation, or network-level silence
    Timeout,
    /// Peer actively refused the connection
    ConnectionRefused,
    /// Name could not be resolved
    DnsFailure,
    /// Endpoint reachable but answered 4xx/5xx
    HttpError,
    /// Proxy demanded (or rejected) authentication
    ProxyAuth,
    /// Unclassifiable outcome or unusable input
    Invalid,
    /// Check was deliberately not performed
    Skipped,
}

impl Status {
    pub fn is_pass(&self) -> bool {
        matches!(self, Status::Pass)
    }

    /// Human readable cause used when a failure carries no native message
    pub fn description(&self) -> &'static str {
        match self {
            Status::Pass => "",
            Status::Fail => "check failed",
            Status::Timeout => "timed out",
            Status::ConnectionRefused => "connection refused",
            Status::DnsFailure => "DNS resolution failed",
            Status::HttpError => "HTTP request returned non-success status",
            Status::ProxyAuth => "proxy authentication required",
            Status::Invalid => "invalid or unclassified outcome",
            Status::Skipped => "check skipped",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Pass => "Pass",
            Status::Fail => "Fail",
            Status::Timeout => "Timeout",
            Status::ConnectionRefused => "ConnectionRefused",
            Status::DnsFailure => "DNSFailure",
            Status::HttpError => "HTTPError",
            Status::ProxyAuth => "ProxyAuth",
            Status::Invalid => "Invalid",
            Status::Skipped => "Skipped",
        };
        write!(f, "{}", name)
    }
}

/// Overall reachability classification of one run
///
/// Strict priority, strongest first: Direct > ViaProxy > ViaVpn > None.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityMode {
    #[default]
    None,
    Direct,
    ViaProxy,
    ViaVpn,
}

impl ConnectivityMode {
    pub fn is_connected(&self) -> bool {
        !matches!(self, ConnectivityMode::None)
    }

    /// Fixed summary text keyed by mode
    pub fn summary(&self) -> &'static str {
        match self {
            ConnectivityMode::Direct => "Direct internet.",
            ConnectivityMode::ViaProxy => "Internet via proxy",
            ConnectivityMode::ViaVpn => "Connected via VPN.",
            ConnectivityMode::None => "No connection",
        }
    }
}

impl fmt::Display for ConnectivityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityMode::None => write!(f, "none"),
            ConnectivityMode::Direct => write!(f, "direct"),
            ConnectivityMode::ViaProxy => write!(f, "via_proxy"),
            ConnectivityMode::ViaVpn => write!(f, "via_vpn"),
        }
    }
}

/// Strategy governing which endpoints of a group are actually checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPolicy {
    /// ICMP first per Direct/VPN group; skip the rest of the group when no echo succeeds
    #[default]
    Optimized,
    /// Every endpoint of every group runs unconditionally
    Exhaustive,
}

impl fmt::Display for ExecutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPolicy::Optimized => write!(f, "Optimized"),
            ExecutionPolicy::Exhaustive => write!(f, "Exhaustive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown execution policy: {0} (expected optimized|exhaustive)")]
pub struct PolicyParseError(pub String);

impl FromStr for ExecutionPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimized" | "optimised" => Ok(ExecutionPolicy::Optimized),
            "exhaustive" => Ok(ExecutionPolicy::Exhaustive),
            other => Err(PolicyParseError(other.to_string())),
        }
    }
}

/// Recorded outcome of checking one endpoint once
///
/// Constructed only through [`Probe::passed`] and [`Probe::failed`], which
/// uphold the invariant that `error` is empty if and only if `status` is
/// [`Status::Pass`]. Probes are never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Probe {
    endpoint: Endpoint,
    status: Status,
    latency_ms: f64,
    error: String,
    timestamp: String,
}

impl Probe {
    /// Successful probe with measured latency
    pub fn passed(endpoint: Endpoint, latency_ms: f64) -> Self {
        Self {
            endpoint,
            status: Status::Pass,
            latency_ms,
            error: String::new(),
            timestamp: get_local_timestamp(),
        }
    }

    /// Failed probe with a classified status and human readable cause
    ///
    /// A `Status::Pass` passed here is downgraded to `Status::Invalid`, and an
    /// empty cause is replaced by the status description.
    pub fn failed(endpoint: Endpoint, status: Status, error: impl Into<String>) -> Self {
        let status = if status.is_pass() {
            Status::Invalid
        } else {
            status
        };
        let mut error = error.into();
        if error.trim().is_empty() {
            error = status.description().to_string();
        }
        Self {
            endpoint,
            status,
            latency_ms: 0.0,
            error,
            timestamp: get_local_timestamp(),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn is_successful(&self) -> bool {
        self.status.is_pass()
    }

    pub fn is_skipped(&self) -> bool {
        self.status == Status::Skipped
    }

    pub fn is_vpn_probe(&self) -> bool {
        self.endpoint.class() == EndpointClass::Vpn
    }

    pub fn is_dns_probe(&self) -> bool {
        self.endpoint.kind() == TargetKind::Dns
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_successful() {
            write!(
                f,
                "Endpoint: {}, Status: {}, Latency: {:.2}ms",
                self.endpoint, self.status, self.latency_ms
            )
        } else {
            write!(
                f,
                "Endpoint: {}, Status: {}, Error: {}",
                self.endpoint, self.status, self.error
            )
        }
    }
}

/// Final report of one diagnosis run, created once by the analyzer
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityResult {
    mode: ConnectivityMode,
    is_connected: bool,
    probes: Vec<Probe>,
    timestamp: String,
    summary: String,
}

impl ConnectivityResult {
    pub(crate) fn new(mode: ConnectivityMode, probes: Vec<Probe>) -> Self {
        Self {
            mode,
            is_connected: mode.is_connected(),
            probes,
            timestamp: get_local_timestamp(),
            summary: mode.summary().to_string(),
        }
    }

    pub fn mode(&self) -> ConnectivityMode {
        self.mode
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// Probes in check order
    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn successful_probes(&self) -> Vec<&Probe> {
        self.probes.iter().filter(|p| p.is_successful()).collect()
    }

    pub fn failed_probes(&self) -> Vec<&Probe> {
        self.probes.iter().filter(|p| !p.is_successful()).collect()
    }
}

// Timestamp standardization utilities
/// Generate standardized local timezone ISO-8601 timestamp
///
/// Used for probe, result and debug log timestamps so every record shares one
/// format, e.g. `"2025-01-25T10:30:45-08:00"`.
pub fn get_local_timestamp() -> String {
    use std::time::SystemTime;

    let now = SystemTime::now();
    let datetime: chrono::DateTime<chrono::Local> = now.into();
    datetime.to_rfc3339()
}
