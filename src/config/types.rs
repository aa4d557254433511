use crate::core::network::endpoint::{
    validate_proxy_url, Endpoint, EndpointClass, EndpointError, TargetKind,
};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// The three endpoint groups, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointGroup {
    Direct,
    Proxy,
    Vpn,
}

impl EndpointGroup {
    pub const ORDER: [EndpointGroup; 3] =
        [EndpointGroup::Direct, EndpointGroup::Proxy, EndpointGroup::Vpn];
}

impl fmt::Display for EndpointGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointGroup::Direct => write!(f, "direct"),
            EndpointGroup::Proxy => write!(f, "proxy"),
            EndpointGroup::Vpn => write!(f, "vpn"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{group} endpoint {target:?}: {source}")]
    Endpoint {
        group: EndpointGroup,
        target: String,
        #[source]
        source: EndpointError,
    },

    #[error("{group} endpoint {target:?} must be of class {expected}, got {actual}")]
    WrongClass {
        group: EndpointGroup,
        target: String,
        expected: EndpointClass,
        actual: EndpointClass,
    },

    #[error("{group} endpoint {target:?} has unsupported kind {kind}")]
    WrongKind {
        group: EndpointGroup,
        target: String,
        kind: TargetKind,
    },

    #[error("proxy endpoint {0:?} requires a proxy URL but none is configured")]
    MissingProxyUrl(String),

    #[error("invalid proxy URL: {0}")]
    InvalidProxyUrl(#[source] EndpointError),

    #[error("empty configuration path")]
    EmptyPath,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {origin}: {message}")]
    Parse { origin: String, message: String },
}

/// Validated endpoint groups plus the shared proxy URL
///
/// Built only through [`NetTestConfig::new`], which enforces the group
/// constraints:
/// - VPN group: VPN class, TCP or ICMP
/// - Direct group: Public class
/// - Proxy group: Public class, HTTP
/// - any VPN-class endpoint: TCP or ICMP
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetTestConfig {
    vpn: Vec<Endpoint>,
    direct: Vec<Endpoint>,
    proxy: Vec<Endpoint>,
    proxy_url: String,
}

impl NetTestConfig {
    pub fn new(
        vpn: Vec<Endpoint>,
        direct: Vec<Endpoint>,
        proxy: Vec<Endpoint>,
        proxy_url: &str,
    ) -> Result<Self, ConfigError> {
        let proxy_url = proxy_url.trim();
        if !proxy_url.is_empty() {
            validate_proxy_url(proxy_url).map_err(ConfigError::InvalidProxyUrl)?;
        }

        for ep in &vpn {
            require_class(EndpointGroup::Vpn, ep, EndpointClass::Vpn)?;
        }
        for ep in &direct {
            require_class(EndpointGroup::Direct, ep, EndpointClass::Public)?;
        }
        for ep in &proxy {
            require_class(EndpointGroup::Proxy, ep, EndpointClass::Public)?;
            if ep.kind() != TargetKind::Http {
                return Err(ConfigError::WrongKind {
                    group: EndpointGroup::Proxy,
                    target: ep.target().to_string(),
                    kind: ep.kind(),
                });
            }
        }

        for (group, endpoints) in [
            (EndpointGroup::Vpn, &vpn),
            (EndpointGroup::Direct, &direct),
            (EndpointGroup::Proxy, &proxy),
        ] {
            if let Some(ep) = endpoints
                .iter()
                .find(|ep| ep.is_vpn() && !matches!(ep.kind(), TargetKind::Tcp | TargetKind::Icmp))
            {
                return Err(ConfigError::WrongKind {
                    group,
                    target: ep.target().to_string(),
                    kind: ep.kind(),
                });
            }
        }

        Ok(Self {
            vpn,
            direct,
            proxy,
            proxy_url: proxy_url.to_string(),
        })
    }

    pub fn vpn_endpoints(&self) -> &[Endpoint] {
        &self.vpn
    }

    pub fn direct_endpoints(&self) -> &[Endpoint] {
        &self.direct
    }

    pub fn proxy_endpoints(&self) -> &[Endpoint] {
        &self.proxy
    }

    pub fn proxy_url(&self) -> &str {
        &self.proxy_url
    }

    pub fn endpoints(&self, group: EndpointGroup) -> &[Endpoint] {
        match group {
            EndpointGroup::Direct => &self.direct,
            EndpointGroup::Proxy => &self.proxy,
            EndpointGroup::Vpn => &self.vpn,
        }
    }

    pub fn len(&self) -> usize {
        self.vpn.len() + self.direct.len() + self.proxy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_vpn_checks(&self) -> bool {
        !self.vpn.is_empty()
    }

    pub fn has_direct_checks(&self) -> bool {
        !self.direct.is_empty()
    }

    pub fn has_proxy_checks(&self) -> bool {
        !self.proxy.is_empty()
    }

    pub fn has_dns_checks(&self) -> bool {
        self.all().any(|ep| ep.kind() == TargetKind::Dns)
    }

    pub fn has_icmp_checks(&self) -> bool {
        self.all().any(|ep| ep.kind() == TargetKind::Icmp)
    }

    fn all(&self) -> impl Iterator<Item = &Endpoint> {
        self.direct.iter().chain(&self.proxy).chain(&self.vpn)
    }
}

fn require_class(
    group: EndpointGroup,
    ep: &Endpoint,
    expected: EndpointClass,
) -> Result<(), ConfigError> {
    if ep.class() == expected {
        Ok(())
    } else {
        Err(ConfigError::WrongClass {
            group,
            target: ep.target().to_string(),
            expected,
            actual: ep.class(),
        })
    }
}
