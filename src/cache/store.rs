// Mirror and bundled template stores.
// Reads `<collection>/*.json` directories and writes the mirror one file per item.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{Result, TemplateError};
use crate::loader::{DefaultsSource, MirrorStore};
use crate::types::{CollectionType, Item};

use super::paths::{collection_dir, default_mirror_root, item_path};

/// On-disk copy of the most recent successful remote fetch.
#[derive(Debug, Clone)]
pub struct DiskMirror {
    root: PathBuf,
}

impl DiskMirror {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Mirror under the user cache directory.
    pub fn at_default_location() -> Result<Self> {
        default_mirror_root().map(Self::new).ok_or_else(|| {
            TemplateError::InvalidConfig("no cache directory available for the mirror".into())
        })
    }

    /// Overwrite the mirror file of every item. Per-item failures are logged and skipped.
    pub async fn write_items(&self, kind: CollectionType, items: &[Item]) -> Result<usize> {
        let dir = collection_dir(&self.root, kind);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| TemplateError::Directory { path: dir, source })?;

        let mut written = 0;
        for item in items {
            let path = item_path(&self.root, kind, item.id());
            let json = match serde_json::to_string_pretty(item) {
                Ok(json) => json,
                Err(error) => {
                    warn!(collection = %kind, id = item.id(), %error, "failed to serialize mirror item");
                    continue;
                }
            };
            match write_atomic(&path, json.as_bytes()).await {
                Ok(()) => written += 1,
                Err(error) => {
                    warn!(collection = %kind, path = %path.display(), %error, "failed to write mirror file");
                }
            }
        }

        debug!(collection = %kind, written, "mirror updated");
        Ok(written)
    }

    /// Every parsable mirrored item, or `None` when the directory is absent or yields nothing.
    pub async fn read_items(&self, kind: CollectionType) -> Result<Option<Vec<Item>>> {
        let items = read_json_dir(&collection_dir(&self.root, kind)).await?;
        Ok(items.filter(|items| !items.is_empty()))
    }
}

#[async_trait]
impl MirrorStore for DiskMirror {
    async fn read(&self, kind: CollectionType) -> Result<Option<Vec<Item>>> {
        self.read_items(kind).await
    }

    async fn write(&self, kind: CollectionType, items: &[Item]) -> Result<usize> {
        self.write_items(kind, items).await
    }
}

/// Read-only templates shipped with the application.
#[derive(Debug, Clone)]
pub struct BundledDir {
    root: PathBuf,
}

impl BundledDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Bundled items for a collection; empty when the directory is missing or unreadable.
    pub async fn read_items(&self, kind: CollectionType) -> Vec<Item> {
        let dir = collection_dir(&self.root, kind);
        match read_json_dir(&dir).await {
            Ok(Some(items)) => items,
            Ok(None) => {
                warn!(collection = %kind, path = %dir.display(), "bundled directory does not exist");
                Vec::new()
            }
            Err(error) => {
                warn!(collection = %kind, %error, "bundled directory unreadable");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl DefaultsSource for BundledDir {
    async fn read(&self, kind: CollectionType) -> Vec<Item> {
        self.read_items(kind).await
    }
}

/// Parse every `*.json` file in `dir`, skipping files that fail.
///
/// Returns `Ok(None)` when the directory does not exist.
async fn read_json_dir(dir: &Path) -> Result<Option<Vec<Item>>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(TemplateError::Directory {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut paths = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    paths.push(path);
                }
            }
            Ok(None) => break,
            Err(source) => {
                return Err(TemplateError::Directory {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        }
    }
    paths.sort();

    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        let origin = path.display().to_string();
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) => {
                // Directories named `*.json` land here too.
                warn!(path = %origin, %error, "skipping unreadable template file");
                continue;
            }
        };
        match Item::parse(&bytes, &origin) {
            Ok(item) => items.push(item),
            Err(error) => warn!(%error, "skipping invalid template file"),
        }
    }

    Ok(Some(items))
}

/// Write via a temp file and rename so readers never see partial content.
async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(&temp_path, path).await
}
