// Tiered loader for step and workflow templates.
// Fetches from a GitHub repository, mirrors each successful fetch to disk and falls
// back to the mirror, then to bundled defaults, when the remote is unavailable.

pub mod cache;
pub mod config;
pub mod error;
pub mod github;
pub mod loader;
pub mod types;

pub use cache::{BundledDir, DiskMirror};
pub use config::{Config, ConfigUpdate, Credential, RemoteTarget, RepoCoordinate, SourceMode};
pub use error::{Result, TemplateError};
pub use github::GitHubClient;
pub use loader::{
    CacheStatus, DefaultsSource, MirrorStore, Origin, RefreshSummary, RemoteFetcher,
    TemplateLoader,
};
pub use types::{CollectionType, Item};
