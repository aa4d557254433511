pub mod analyzer;
pub mod checkers;
pub mod classify;
pub mod context;
pub mod debug_logger;
pub mod endpoint;
pub mod executor;
pub mod types;

// Re-export commonly used items
pub use analyzer::analyze;
pub use checkers::{Checkers, DnsChecker, HttpChecker, IcmpChecker, TcpChecker};
pub use context::{ContextError, ProbeContext};
pub use debug_logger::{get_debug_logger, DebugLogger};
pub use endpoint::{Endpoint, EndpointClass, EndpointError, TargetKind};
pub use executor::Executor;
pub use types::*;
