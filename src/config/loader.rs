use super::types::{ConfigError, EndpointGroup, NetTestConfig};
use crate::core::network::debug_logger::{get_debug_logger, DebugLogger};
use crate::core::network::endpoint::{Endpoint, EndpointClass, EndpointError, TargetKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

const EMBEDDED_CONFIG: &str = include_str!("default.toml");

/// On-disk configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    #[serde(rename = "proxyURL", alias = "proxyUrl", default)]
    pub proxy_url: String,
    #[serde(default)]
    pub vpn_endpoints: Vec<EndpointSpec>,
    #[serde(default)]
    pub direct_endpoints: Vec<EndpointSpec>,
    #[serde(default)]
    pub proxy_endpoints: Vec<EndpointSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    pub target: String,
    #[serde(alias = "type", default = "default_class")]
    pub class: EndpointClass,
    pub kind: TargetKind,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub use_proxy: bool,
}

fn default_class() -> EndpointClass {
    EndpointClass::Public
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "json" => DocumentFormat::Json,
            _ => DocumentFormat::Toml,
        }
    }

    fn decode(self, content: &str) -> Result<ConfigDocument, String> {
        match self {
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    fn other(self) -> Self {
        match self {
            DocumentFormat::Json => DocumentFormat::Toml,
            DocumentFormat::Toml => DocumentFormat::Json,
        }
    }
}

impl ConfigDocument {
    /// Decode a document, trying the format named by `ext` first and the other one second
    pub fn parse(content: &str, ext: &str) -> Result<Self, String> {
        let primary = DocumentFormat::from_extension(ext);
        match primary.decode(content) {
            Ok(doc) => Ok(doc),
            Err(primary_err) => primary.other().decode(content).map_err(|_| primary_err),
        }
    }

    /// Build validated endpoint groups; the first malformed entry rejects the whole document
    pub fn into_config(self) -> Result<NetTestConfig, ConfigError> {
        let proxy_url = self.proxy_url.trim().to_string();

        let vpn = build_group(EndpointGroup::Vpn, &self.vpn_endpoints, &proxy_url)?;
        let direct = build_group(EndpointGroup::Direct, &self.direct_endpoints, &proxy_url)?;
        let proxy = build_group(EndpointGroup::Proxy, &self.proxy_endpoints, &proxy_url)?;

        NetTestConfig::new(vpn, direct, proxy, &proxy_url)
    }
}

impl EndpointSpec {
    fn to_endpoint(&self, group: EndpointGroup, proxy_url: &str) -> Result<Endpoint, ConfigError> {
        let wrap = |source: EndpointError| ConfigError::Endpoint {
            group,
            target: self.target.clone(),
            source,
        };

        let endpoint = match self.kind {
            TargetKind::Icmp => Endpoint::icmp(&self.target, self.class, &self.note),
            TargetKind::Dns => Endpoint::dns(&self.target, self.class, &self.note),
            TargetKind::Tcp => Endpoint::tcp(&self.target, self.class, &self.note),
            TargetKind::Http => Endpoint::http(&self.target, self.class, &self.note),
        }
        .map_err(wrap)?;

        if !self.use_proxy {
            return Ok(endpoint);
        }
        if proxy_url.is_empty() {
            return Err(ConfigError::MissingProxyUrl(self.target.clone()));
        }
        endpoint.with_proxy(proxy_url).map_err(wrap)
    }
}

fn build_group(
    group: EndpointGroup,
    specs: &[EndpointSpec],
    proxy_url: &str,
) -> Result<Vec<Endpoint>, ConfigError> {
    specs.iter().map(|spec| spec.to_endpoint(group, proxy_url)).collect()
}

/// Decode `content` as JSON or TOML (chosen by `ext`, the other format as fallback)
pub fn parse_config_str(content: &str, ext: &str) -> Result<NetTestConfig, ConfigError> {
    parse_with_origin(content, ext, ext)
}

fn parse_with_origin(content: &str, ext: &str, origin: &str) -> Result<NetTestConfig, ConfigError> {
    ConfigDocument::parse(content, ext)
        .map_err(|message| ConfigError::Parse {
            origin: origin.to_string(),
            message,
        })?
        .into_config()
}

pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<NetTestConfig, ConfigError> {
    read_file(path.as_ref(), &get_debug_logger())
}

/// Default document compiled into the binary
pub fn load_embedded() -> Result<NetTestConfig, ConfigError> {
    read_embedded(&get_debug_logger())
}

/// Load `path` when given, the embedded default otherwise
///
/// A path that cannot be read is an error; there is no silent fallback.
pub fn load_from_file_or_embedded(path: Option<&Path>) -> Result<NetTestConfig, ConfigError> {
    load_with_logger(path, &get_debug_logger())
}

/// [`load_from_file_or_embedded`] reporting to `logger`, so the load shares
/// the session id of the run that follows
pub fn load_with_logger(
    path: Option<&Path>,
    logger: &DebugLogger,
) -> Result<NetTestConfig, ConfigError> {
    match path {
        Some(path) => read_file(path, logger),
        None => read_embedded(logger),
    }
}

fn read_file(path: &Path, logger: &DebugLogger) -> Result<NetTestConfig, ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::EmptyPath);
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default();

    let origin = path.display().to_string();
    let config = parse_with_origin(&content, &ext, &origin)?;
    log_loaded(logger, &origin, &config);
    Ok(config)
}

fn read_embedded(logger: &DebugLogger) -> Result<NetTestConfig, ConfigError> {
    let config = parse_with_origin(EMBEDDED_CONFIG, "toml", "embedded default")?;
    log_loaded(logger, "embedded default", &config);
    Ok(config)
}

fn log_loaded(logger: &DebugLogger, origin: &str, config: &NetTestConfig) {
    logger.config_loaded(
        origin,
        config.vpn_endpoints().len(),
        config.direct_endpoints().len(),
        config.proxy_endpoints().len(),
    );
}
