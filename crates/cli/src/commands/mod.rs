//! Subcommand implementations

pub mod config;
pub mod dispatch;
pub mod doctor;
pub mod preview;
pub mod status;
