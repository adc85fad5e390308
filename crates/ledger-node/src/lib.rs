//! Transport for the ledger: a line-delimited JSON session server over TCP,
//! the matching client, and node configuration.

pub mod client;
pub mod config;
pub mod constants;
pub mod server;

pub use client::NodeClient;
pub use config::NodeConfig;
pub use server::{serve, serve_session, SessionEnd};
