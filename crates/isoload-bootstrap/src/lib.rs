//! # isoload-bootstrap
//!
//! Bridges a statically known host object to the real plugin implementation
//! living behind a [`BoundaryLoader`](isoload_boundary::BoundaryLoader).
//!
//! The host type is named `<Something>Bootstrap`; the implementation is the
//! same name without the suffix. It is resolved through the boundary,
//! constructed with `[loader, host, ...extra]`, checked against the required
//! capability and kept in a [`BootstrapContext`]. Calls back into it go
//! through [`BootstrapContext::call_method`], which hands errors raised by
//! plugin code back to the caller untouched.

pub mod context;
pub mod host;

pub use context::{BootstrapContext, BootstrapState, PluginInstance, construct};
pub use host::{BootstrapHost, derive_target_name};
