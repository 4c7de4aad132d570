// Tiered template loader.
// TTL cache with single-flight fetches over remote, mirror and bundled sources.

pub mod entry;
pub mod source;
pub mod tiered;

pub use entry::{CacheEntry, Origin};
pub use source::{DefaultsSource, MirrorStore, RemoteFetcher};
pub use tiered::{CacheStatus, RefreshSummary, TemplateLoader};
