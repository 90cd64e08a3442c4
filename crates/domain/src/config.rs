pub mod errors;
pub mod logging;
pub mod resolver;
pub mod root;
pub mod root_hints;
pub mod trace;

pub use errors::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use resolver::{ResolverConfig, ResolverSelector};
pub use root::{CliOverrides, Config};
pub use root_hints::{default_root_hints, RootHint};
pub use trace::TraceConfig;
