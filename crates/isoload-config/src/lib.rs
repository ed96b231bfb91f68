//! # isoload-config
//!
//! Configuration for the resolver, the boundary loader, and logging. Reads
//! from `isoload.toml`, then applies environment variable overrides.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{BoundaryConfig, ConfigWarning, IsoConfig, LoggingConfig, ResolverConfig, WarningSeverity};
