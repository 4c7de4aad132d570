// Capabilities the loader is built from.
// Implemented by the GitHub client and the disk stores; swapped for fakes in tests.

use async_trait::async_trait;

use crate::config::RemoteTarget;
use crate::error::Result;
use crate::github::ContentEntry;
use crate::types::{CollectionType, Item};

/// Authoritative remote repository.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// List a directory. Fails if the path is not a directory.
    async fn list_directory(&self, target: &RemoteTarget, path: &str) -> Result<Vec<ContentEntry>>;

    /// Raw bytes of a file, with any transport encoding removed.
    async fn read_file(&self, target: &RemoteTarget, path: &str) -> Result<Vec<u8>>;
}

/// Writable local copy of the last successful remote fetch.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Mirrored items, or `None` if nothing usable is stored.
    async fn read(&self, kind: CollectionType) -> Result<Option<Vec<Item>>>;

    /// Overwrite the stored copy of each item and return how many were written.
    async fn write(&self, kind: CollectionType, items: &[Item]) -> Result<usize>;
}

/// Read-only last-resort templates. Never fails.
#[async_trait]
pub trait DefaultsSource: Send + Sync {
    async fn read(&self, kind: CollectionType) -> Vec<Item>;
}
