//! CLI-specific functionality for the subnet router
//!
//! This module contains argument parsing and configuration discovery.

pub mod args;
pub mod config;

pub use args::{ArgsError, Invocation, RawArgs, parse_args, usage};
pub use config::{ConfigDiscovery, ConfigError, RouterSettings};
