//! # isoload-resolver
//!
//! Turns dependency coordinates into verified files in a local cache and
//! injects them into a [`LibraryTarget`](isoload_core::LibraryTarget).
//!
//! - [`DependencyList`]: coordinates with conditions evaluated at resolve time.
//! - [`DependencyDownloader`]: the resolve-then-inject entry point.
//! - [`ResolutionEngine`]: produces one pending outcome per root coordinate;
//!   [`RemoteEngine`] is the stock implementation over an
//!   [`ArtifactFetcher`] and a [`DependencyGraph`].
//!
//! Artifacts are accepted only when both their MD5 and SHA-1 match.

pub mod cache;
pub mod downloader;
pub mod engine;
pub mod fetch;
pub mod graph;
pub mod list;
pub mod remote;

pub use cache::{ArtifactCache, Digests, verify_bytes, verify_file};
pub use downloader::DependencyDownloader;
pub use engine::{DownloadOutcome, ExclusionSet, PendingOutcome, ResolutionEngine, ResolveRequest};
pub use fetch::{ArtifactFetcher, HttpFetcher};
pub use graph::{DependencyGraph, NoDependencies, StaticGraph};
pub use list::{ClassMissingCondition, Condition, DependencyList};
pub use remote::RemoteEngine;
