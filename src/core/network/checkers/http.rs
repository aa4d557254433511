//! HTTP reachability checker
//!
//! Issues a single GET and evaluates the first response only: redirects are
//! not followed, because the check measures first-hop reachability.
//!
//! ## Outcome mapping
//!
//! - 200..=399: `Pass` (redirects count as reachable)
//! - 400..=599: `HttpError` (endpoint reachable, request rejected), 407
//!   from a proxy included; `ProxyAuth` only comes from transport errors
//! - transport errors: see [`classify_transport_failure`]
//!
//! ## Dependencies
//!
//! - `isahc`: HTTP client with explicit proxy and redirect configuration
//! - `url`: proxy URL validation before any I/O

use super::HttpChecker;
use crate::core::network::classify::{contains_any, ClassificationTable, Failure, Rule};
use crate::core::network::context::{ContextError, ProbeContext};
use crate::core::network::endpoint::{validate_proxy_url, Endpoint};
use crate::core::network::types::{Probe, Status};
use std::time::Duration;

#[cfg(feature = "network-monitoring")]
use super::elapsed_ms;
#[cfg(feature = "network-monitoring")]
use isahc::config::{Configurable, RedirectPolicy};

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const USER_AGENT: &str = concat!("netpath/", env!("CARGO_PKG_VERSION"), " (network tester)");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailureKind {
    Timeout,
    Refused,
    Unreachable,
    NameResolution,
    Tls,
    /// Connect failed without a more specific cause
    ConnectFailed,
    Other,
}

/// Native HTTP transport failure (no response received)
#[derive(Debug, Clone)]
pub struct TransportFailure {
    pub kind: TransportFailureKind,
    pub message: String,
    pub context: Option<ContextError>,
}

impl TransportFailure {
    pub fn new(kind: TransportFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
        }
    }

    #[cfg(feature = "network-monitoring")]
    pub fn from_isahc(err: &isahc::Error, context: Option<ContextError>) -> Self {
        use isahc::error::ErrorKind;
        use std::io::ErrorKind as IoKind;

        let io_kind = io_kind_in_chain(err);
        let kind = match err.kind() {
            ErrorKind::Timeout => TransportFailureKind::Timeout,
            ErrorKind::NameResolution => TransportFailureKind::NameResolution,
            ErrorKind::BadServerCertificate
            | ErrorKind::BadClientCertificate
            | ErrorKind::TlsEngine => TransportFailureKind::Tls,
            ErrorKind::ConnectionFailed | ErrorKind::Io => match io_kind {
                Some(IoKind::ConnectionRefused) => TransportFailureKind::Refused,
                Some(IoKind::TimedOut) => TransportFailureKind::Timeout,
                Some(IoKind::HostUnreachable) | Some(IoKind::NetworkUnreachable) => {
                    TransportFailureKind::Unreachable
                }
                _ if matches!(err.kind(), ErrorKind::ConnectionFailed) => {
                    TransportFailureKind::ConnectFailed
                }
                _ => TransportFailureKind::Other,
            },
            _ => TransportFailureKind::Other,
        };

        Self {
            kind,
            message: err.to_string(),
            context,
        }
    }
}

#[cfg(feature = "network-monitoring")]
fn io_kind_in_chain(err: &(dyn std::error::Error + 'static)) -> Option<std::io::ErrorKind> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<std::io::Error>() {
            return Some(io_err.kind());
        }
        current = e.source();
    }
    None
}

impl Failure for TransportFailure {
    fn context_error(&self) -> Option<ContextError> {
        self.context
    }

    fn message_lower(&self) -> String {
        self.message.to_lowercase()
    }
}

fn is_tls(f: &TransportFailure, m: &str) -> bool {
    f.kind == TransportFailureKind::Tls || contains_any(m, &["tls", "ssl", "handshake"])
}

static TRANSPORT_RULES: &[Rule<TransportFailure>] = &[
    Rule {
        name: "native_timeout",
        matches: |f, _| f.kind == TransportFailureKind::Timeout,
        status: Status::Timeout,
    },
    Rule {
        name: "refused",
        matches: |f, _| f.kind == TransportFailureKind::Refused,
        status: Status::ConnectionRefused,
    },
    Rule {
        name: "unreachable",
        matches: |f, m| {
            f.kind == TransportFailureKind::Unreachable
                || contains_any(m, &["network is unreachable", "host is unreachable", "no route to host"])
        },
        status: Status::Timeout,
    },
    Rule {
        name: "name_resolution",
        matches: |f, _| f.kind == TransportFailureKind::NameResolution,
        status: Status::DnsFailure,
    },
    Rule {
        name: "tls_timeout",
        matches: |f, m| is_tls(f, m) && contains_any(m, &["timeout", "timed out"]),
        status: Status::Timeout,
    },
    Rule {
        name: "tls",
        matches: is_tls,
        status: Status::ConnectionRefused,
    },
    Rule {
        name: "proxy_auth",
        matches: |_, m| m.contains("proxy") && contains_any(m, &["auth", "407"]),
        status: Status::ProxyAuth,
    },
    Rule {
        name: "text_refused",
        matches: |_, m| m.contains("connection refused"),
        status: Status::ConnectionRefused,
    },
    Rule {
        name: "text_timeout",
        matches: |_, m| contains_any(m, &["timeout", "timed out", "deadline exceeded"]),
        status: Status::Timeout,
    },
    Rule {
        name: "text_dns",
        matches: |_, m| {
            contains_any(m, &["no such host", "could not resolve", "resolve host", "dns"])
        },
        status: Status::DnsFailure,
    },
    Rule {
        name: "connect_failed",
        matches: |f, _| f.kind == TransportFailureKind::ConnectFailed,
        status: Status::ConnectionRefused,
    },
];

static TRANSPORT_TABLE: ClassificationTable<TransportFailure> =
    ClassificationTable::new(TRANSPORT_RULES, Status::Invalid);

/// Map an HTTP transport failure to a status
pub fn classify_transport_failure(failure: &TransportFailure) -> Status {
    TRANSPORT_TABLE.classify(failure)
}

/// Evaluate the first HTTP response received for `endpoint`
pub fn probe_from_response(
    endpoint: &Endpoint,
    status_code: u16,
    reason: &str,
    latency_ms: f64,
) -> Probe {
    let line = format!("HTTP {} {}", status_code, reason).trim_end().to_string();
    match status_code {
        200..=399 => Probe::passed(endpoint.clone(), latency_ms),
        400..=599 => Probe::failed(endpoint.clone(), Status::HttpError, line),
        _ => Probe::failed(endpoint.clone(), Status::Invalid, format!("unexpected {}", line)),
    }
}

/// Production HTTP checker implementation using isahc
#[cfg(feature = "network-monitoring")]
pub struct IsahcHttpChecker {
    client: Option<isahc::HttpClient>,
    timeout: Duration,
}

#[cfg(feature = "network-monitoring")]
impl IsahcHttpChecker {
    pub fn new(timeout: Duration) -> Self {
        // Client creation failure is reported per probe rather than at startup
        Self {
            client: isahc::HttpClient::new().ok(),
            timeout,
        }
    }

    async fn do_request(
        &self,
        ctx: &ProbeContext,
        endpoint: &Endpoint,
        proxy: Option<(isahc::http::Uri, Option<isahc::auth::Credentials>)>,
    ) -> Probe {
        let client = match &self.client {
            Some(client) => client,
            None => {
                return Probe::failed(
                    endpoint.clone(),
                    Status::Invalid,
                    "HTTP client initialization failed",
                )
            }
        };

        let mut builder = isahc::Request::get(endpoint.target())
            .timeout(ctx.bounded(self.timeout))
            .redirect_policy(RedirectPolicy::None)
            .header("User-Agent", USER_AGENT);
        builder = match proxy {
            Some((uri, credentials)) => {
                let builder = builder.proxy(Some(uri));
                match credentials {
                    Some(creds) => builder
                        .proxy_authentication(isahc::auth::Authentication::basic())
                        .proxy_credentials(creds),
                    None => builder,
                }
            }
            // Ignore http_proxy/https_proxy from the environment for direct checks
            None => builder.proxy(None::<isahc::http::Uri>),
        };

        let request = match builder.body(()) {
            Ok(request) => request,
            Err(err) => {
                return Probe::failed(endpoint.clone(), Status::Invalid, err.to_string());
            }
        };

        let start = std::time::Instant::now();
        let outcome = tokio::select! {
            res = client.send_async(request) => res,
            err = ctx.done() => {
                return Probe::failed(endpoint.clone(), Status::Timeout, err.to_string());
            }
        };
        let latency_ms = elapsed_ms(start);

        match outcome {
            Ok(response) => {
                let status = response.status();
                probe_from_response(
                    endpoint,
                    status.as_u16(),
                    status.canonical_reason().unwrap_or(""),
                    latency_ms,
                )
            }
            Err(err) => {
                let failure = TransportFailure::from_isahc(&err, ctx.err());
                let status = classify_transport_failure(&failure);
                Probe::failed(endpoint.clone(), status, failure.message)
            }
        }
    }
}

#[cfg(feature = "network-monitoring")]
impl Default for IsahcHttpChecker {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT)
    }
}

#[cfg(feature = "network-monitoring")]
#[async_trait::async_trait]
impl HttpChecker for IsahcHttpChecker {
    async fn check(&self, ctx: &ProbeContext, endpoint: &Endpoint) -> Probe {
        if let Some(err) = ctx.err() {
            return Probe::failed(endpoint.clone(), Status::Timeout, err.to_string());
        }
        self.do_request(ctx, endpoint, None).await
    }

    async fn check_via_proxy(
        &self,
        ctx: &ProbeContext,
        endpoint: &Endpoint,
        proxy_url: &str,
    ) -> Probe {
        if let Some(err) = ctx.err() {
            return Probe::failed(endpoint.clone(), Status::Timeout, err.to_string());
        }

        let parsed = match validate_proxy_url(proxy_url) {
            Ok(url) => url,
            Err(err) => return Probe::failed(endpoint.clone(), Status::Invalid, err.to_string()),
        };

        let credentials = if parsed.username().is_empty() {
            None
        } else {
            Some(isahc::auth::Credentials::new(
                parsed.username(),
                parsed.password().unwrap_or(""),
            ))
        };

        let mut bare = parsed.clone();
        // Userinfo travels as proxy credentials, not inside the URI
        let _ = bare.set_username("");
        let _ = bare.set_password(None);
        let uri = match bare.as_str().parse::<isahc::http::Uri>() {
            Ok(uri) => uri,
            Err(err) => {
                return Probe::failed(
                    endpoint.clone(),
                    Status::Invalid,
                    format!("invalid proxy URL: {}", err),
                )
            }
        };

        self.do_request(ctx, endpoint, Some((uri, credentials))).await
    }
}

/// Placeholder HTTP checker when the network-monitoring feature is disabled
#[cfg(not(feature = "network-monitoring"))]
#[derive(Debug, Default)]
pub struct UnavailableHttpChecker;

#[cfg(not(feature = "network-monitoring"))]
#[async_trait::async_trait]
impl HttpChecker for UnavailableHttpChecker {
    async fn check(&self, ctx: &ProbeContext, endpoint: &Endpoint) -> Probe {
        if let Some(err) = ctx.err() {
            return Probe::failed(endpoint.clone(), Status::Timeout, err.to_string());
        }
        Probe::failed(
            endpoint.clone(),
            Status::Invalid,
            "HTTP checks unavailable: built without network-monitoring",
        )
    }

    async fn check_via_proxy(
        &self,
        ctx: &ProbeContext,
        endpoint: &Endpoint,
        proxy_url: &str,
    ) -> Probe {
        if let Some(err) = ctx.err() {
            return Probe::failed(endpoint.clone(), Status::Timeout, err.to_string());
        }
        if let Err(err) = validate_proxy_url(proxy_url) {
            return Probe::failed(endpoint.clone(), Status::Invalid, err.to_string());
        }
        self.check(ctx, endpoint).await
    }
}
