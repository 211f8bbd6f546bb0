//! Subcommand implementations

pub mod endpoint;
pub mod requests;
pub mod response;
pub mod watch;
