// GitHub contents API module.
// Provides the remote fetcher used for authoritative template data.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::GitHubClient;
pub use types::*;
