pub mod loader;
pub mod types;

pub use loader::{
    load_embedded, load_from_file, load_from_file_or_embedded, load_with_logger, parse_config_str,
    ConfigDocument, EndpointSpec,
};
pub use types::{ConfigError, EndpointGroup, NetTestConfig};
