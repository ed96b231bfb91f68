//! # isoload-cli
//!
//! Command-line interface for isolated dependency loading.
//!
//! ## Commands
//!
//! - `isoload fetch`: Download, verify and inject a dependency manifest
//! - `isoload verify`: Check a file against its MD5 and SHA-1
//! - `isoload path`: Show where a coordinate is cached
//! - `isoload config`: Show the effective configuration

pub mod commands;

pub use commands::Cli;
