//! Endpoint model and validated construction
//!
//! An [`Endpoint`] is a configured destination plus the protocol used to test
//! it. The target syntax is validated once, at construction, according to the
//! [`TargetKind`]; afterwards the value is immutable.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Expected reachability path of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointClass {
    Public,
    Vpn,
}

impl fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointClass::Public => write!(f, "public"),
            EndpointClass::Vpn => write!(f, "vpn"),
        }
    }
}

/// Protocol used to test an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Tcp,
    Dns,
    Http,
    Icmp,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Tcp => write!(f, "tcp"),
            TargetKind::Dns => write!(f, "dns"),
            TargetKind::Http => write!(f, "http"),
            TargetKind::Icmp => write!(f, "icmp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("empty target")]
    EmptyTarget,
    #[error("invalid host {0:?}")]
    InvalidHost(String),
    #[error("missing port in {0:?} (expected host:port)")]
    MissingPort(String),
    #[error("invalid port {port:?} in {target:?}")]
    InvalidPort { target: String, port: String },
    #[error("invalid URL {target:?}: {reason}")]
    InvalidUrl { target: String, reason: String },
    #[error("unsupported URL scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),
    #[error("invalid proxy URL {target:?}: {reason}")]
    InvalidProxyUrl { target: String, reason: String },
    #[error("proxy routing is only supported for HTTP endpoints, not {0}")]
    ProxyNotSupported(TargetKind),
}

/// Configured destination plus the protocol used to test it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    target: String,
    class: EndpointClass,
    kind: TargetKind,
    requires_proxy: bool,
    proxy_url: String,
    description: String,
}

impl Endpoint {
    /// TCP endpoint from `host:port` (IPv6 hosts bracketed: `[::1]:443`)
    pub fn tcp(
        host_port: &str,
        class: EndpointClass,
        description: &str,
    ) -> Result<Self, EndpointError> {
        split_host_port(host_port)?;
        Ok(Self::build(host_port.trim(), class, TargetKind::Tcp, description))
    }

    /// DNS endpoint from a bare hostname
    pub fn dns(host: &str, class: EndpointClass, description: &str) -> Result<Self, EndpointError> {
        validate_bare_host(host)?;
        Ok(Self::build(host.trim(), class, TargetKind::Dns, description))
    }

    /// HTTP endpoint from an absolute http/https URL
    ///
    /// Proxy routing is configured afterwards with [`Endpoint::with_proxy`].
    pub fn http(url: &str, class: EndpointClass, description: &str) -> Result<Self, EndpointError> {
        validate_http_url(url)?;
        Ok(Self::build(url.trim(), class, TargetKind::Http, description))
    }

    /// ICMP endpoint from a bare hostname or IP literal
    pub fn icmp(host: &str, class: EndpointClass, description: &str) -> Result<Self, EndpointError> {
        validate_bare_host(host)?;
        Ok(Self::build(host.trim(), class, TargetKind::Icmp, description))
    }

    /// Route this HTTP endpoint through `proxy_url`
    pub fn with_proxy(mut self, proxy_url: &str) -> Result<Self, EndpointError> {
        if self.kind != TargetKind::Http {
            return Err(EndpointError::ProxyNotSupported(self.kind));
        }
        validate_proxy_url(proxy_url)?;
        self.requires_proxy = true;
        self.proxy_url = proxy_url.trim().to_string();
        Ok(self)
    }

    /// Panicking variant of [`Endpoint::tcp`] for literal configuration only
    pub fn must_tcp(host_port: &str, class: EndpointClass, description: &str) -> Self {
        Self::tcp(host_port, class, description)
            .unwrap_or_else(|e| panic!("invalid TCP endpoint {host_port}: {e}"))
    }

    /// Panicking variant of [`Endpoint::dns`] for literal configuration only
    pub fn must_dns(host: &str, class: EndpointClass, description: &str) -> Self {
        Self::dns(host, class, description)
            .unwrap_or_else(|e| panic!("invalid DNS endpoint {host}: {e}"))
    }

    /// Panicking variant of [`Endpoint::http`] (plus optional proxy) for literal configuration only
    pub fn must_http(
        url: &str,
        class: EndpointClass,
        proxy_url: Option<&str>,
        description: &str,
    ) -> Self {
        let endpoint = Self::http(url, class, description)
            .unwrap_or_else(|e| panic!("invalid HTTP endpoint {url}: {e}"));
        match proxy_url {
            Some(proxy) => endpoint
                .with_proxy(proxy)
                .unwrap_or_else(|e| panic!("invalid HTTP endpoint {url}: {e}")),
            None => endpoint,
        }
    }

    /// Panicking variant of [`Endpoint::icmp`] for literal configuration only
    pub fn must_icmp(host: &str, class: EndpointClass, description: &str) -> Self {
        Self::icmp(host, class, description)
            .unwrap_or_else(|e| panic!("invalid ICMP endpoint {host}: {e}"))
    }

    fn build(target: &str, class: EndpointClass, kind: TargetKind, description: &str) -> Self {
        Self {
            target: target.to_string(),
            class,
            kind,
            requires_proxy: false,
            proxy_url: String::new(),
            description: description.to_string(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn class(&self) -> EndpointClass {
        self.class
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn requires_proxy(&self) -> bool {
        self.requires_proxy
    }

    /// Proxy URL configured on this endpoint, empty when not proxy-routed
    pub fn proxy_url(&self) -> &str {
        &self.proxy_url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_vpn(&self) -> bool {
        self.class == EndpointClass::Vpn
    }

    pub fn is_public(&self) -> bool {
        self.class == EndpointClass::Public
    }

    /// TCP or ICMP endpoint that does not go through a proxy
    pub fn is_direct_type(&self) -> bool {
        matches!(self.kind, TargetKind::Tcp | TargetKind::Icmp) && !self.requires_proxy
    }

    /// HTTP endpoint routed through a proxy
    pub fn is_proxy_type(&self) -> bool {
        self.kind == TargetKind::Http && self.requires_proxy
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.target, self.class)?;
        if self.requires_proxy {
            write!(f, " via proxy")?;
        }
        if !self.description.is_empty() {
            write!(f, " - {}", self.description)?;
        }
        Ok(())
    }
}

/// Split `host:port` into its parts, accepting bracketed IPv6 hosts
pub fn split_host_port(target: &str) -> Result<(String, u16), EndpointError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(EndpointError::EmptyTarget);
    }

    let (host, port) = if let Some(rest) = target.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| EndpointError::InvalidHost(target.to_string()))?;
        let port = after
            .strip_prefix(':')
            .ok_or_else(|| EndpointError::MissingPort(target.to_string()))?;
        (host, port)
    } else {
        let (host, port) = target
            .rsplit_once(':')
            .ok_or_else(|| EndpointError::MissingPort(target.to_string()))?;
        // Unbracketed IPv6 literals are ambiguous
        if host.contains(':') {
            return Err(EndpointError::InvalidHost(host.to_string()));
        }
        (host, port)
    };

    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(EndpointError::InvalidHost(host.to_string()));
    }

    let port_num = match port.parse::<u16>() {
        Ok(p) if p != 0 => p,
        _ => {
            return Err(EndpointError::InvalidPort {
                target: target.to_string(),
                port: port.to_string(),
            })
        }
    };

    Ok((host.to_string(), port_num))
}

fn validate_bare_host(host: &str) -> Result<(), EndpointError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(EndpointError::EmptyTarget);
    }
    // A leading dash would be read as an option by the ping utility
    if host.starts_with('-') || host.chars().any(char::is_whitespace) {
        return Err(EndpointError::InvalidHost(host.to_string()));
    }
    Ok(())
}

fn validate_http_url(target: &str) -> Result<(), EndpointError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(EndpointError::EmptyTarget);
    }
    let url = Url::parse(target).map_err(|e| EndpointError::InvalidUrl {
        target: target.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(EndpointError::UnsupportedScheme(url.scheme().to_string()));
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(EndpointError::InvalidUrl {
            target: target.to_string(),
            reason: "missing host".to_string(),
        }),
    }
}

/// Validate a proxy URL (`scheme://[user:pass@]host[:port]`)
pub fn validate_proxy_url(proxy_url: &str) -> Result<Url, EndpointError> {
    let proxy_url = proxy_url.trim();
    let invalid = |reason: String| EndpointError::InvalidProxyUrl {
        target: proxy_url.to_string(),
        reason,
    };
    if proxy_url.is_empty() {
        return Err(invalid("empty proxy URL".to_string()));
    }
    let url = Url::parse(proxy_url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https" | "socks4" | "socks4a" | "socks5" | "socks5h") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}
