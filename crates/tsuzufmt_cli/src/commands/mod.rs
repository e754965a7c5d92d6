//! Subcommand implementations

pub mod config;
pub mod format;
pub mod init;
