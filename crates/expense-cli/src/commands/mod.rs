//! Subcommands of the `expense` binary.

pub mod batch;
pub mod config;
pub mod validate;
