//! Protocol checkers
//!
//! One capability trait per protocol. Every call turns exactly one
//! [`Endpoint`] into exactly one [`Probe`]; checkers never return errors,
//! failures are classified into the probe's [`Status`](crate::core::network::types::Status).
//!
//! - [`TcpChecker`]: raw TCP connect
//! - [`DnsChecker`]: system resolver lookup
//! - [`HttpChecker`]: single GET, direct or through a proxy
//! - [`IcmpChecker`]: one echo via the platform ping utility

pub mod dns;
pub mod http;
pub mod icmp;
pub mod tcp;

use crate::core::network::context::ProbeContext;
use crate::core::network::endpoint::Endpoint;
use crate::core::network::types::Probe;

pub use dns::{classify_dns_failure, DnsFailure, DnsFailureKind, SystemDnsChecker};
pub use http::{classify_transport_failure, TransportFailure, TransportFailureKind};
pub use icmp::{classify_ping_failure, is_ping_successful, PingFailure, PingPlatform, SystemIcmpChecker};
pub use tcp::{classify_tcp_failure, TcpFailure, TcpFailureKind, TokioTcpChecker};

#[cfg(feature = "network-monitoring")]
pub use http::IsahcHttpChecker;
#[cfg(not(feature = "network-monitoring"))]
pub use http::UnavailableHttpChecker;

#[async_trait::async_trait]
pub trait TcpChecker: Send + Sync {
    async fn check(&self, ctx: &ProbeContext, endpoint: &Endpoint) -> Probe;
}

#[async_trait::async_trait]
pub trait DnsChecker: Send + Sync {
    async fn check(&self, ctx: &ProbeContext, endpoint: &Endpoint) -> Probe;
}

#[async_trait::async_trait]
pub trait HttpChecker: Send + Sync {
    async fn check(&self, ctx: &ProbeContext, endpoint: &Endpoint) -> Probe;
    async fn check_via_proxy(&self, ctx: &ProbeContext, endpoint: &Endpoint, proxy_url: &str)
        -> Probe;
}

#[async_trait::async_trait]
pub trait IcmpChecker: Send + Sync {
    async fn check_ping(&self, ctx: &ProbeContext, endpoint: &Endpoint) -> Probe;
}

/// One implementation per protocol, the executor's single dispatch point
pub struct Checkers {
    pub tcp: Box<dyn TcpChecker>,
    pub dns: Box<dyn DnsChecker>,
    pub http: Box<dyn HttpChecker>,
    pub icmp: Box<dyn IcmpChecker>,
}

impl Checkers {
    pub fn new(
        tcp: Box<dyn TcpChecker>,
        dns: Box<dyn DnsChecker>,
        http: Box<dyn HttpChecker>,
        icmp: Box<dyn IcmpChecker>,
    ) -> Self {
        Self {
            tcp,
            dns,
            http,
            icmp,
        }
    }

    /// Production checkers backed by tokio, the system resolver, isahc and `ping`
    pub fn system() -> Self {
        #[cfg(feature = "network-monitoring")]
        let http: Box<dyn HttpChecker> = Box::new(IsahcHttpChecker::default());
        #[cfg(not(feature = "network-monitoring"))]
        let http: Box<dyn HttpChecker> = Box::new(UnavailableHttpChecker);

        Self::new(
            Box::new(TokioTcpChecker::default()),
            Box::new(SystemDnsChecker),
            http,
            Box::new(SystemIcmpChecker::default()),
        )
    }
}

/// Elapsed wall time in fractional milliseconds
pub(crate) fn elapsed_ms(start: std::time::Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
