//! Subcommand implementations.

pub mod classify;
pub mod download;
pub mod fetch;
