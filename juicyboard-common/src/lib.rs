//! Shared protocol, types and configuration for the R1000A slot bus daemon

pub mod config;
pub mod error;
pub mod protocol;
pub mod types;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
