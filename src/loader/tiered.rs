// The tiered loader and its accessors.
// Serves cached collections within the TTL, otherwise fetches remote -> mirror -> bundled.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{BundledDir, DiskMirror};
use crate::config::{Config, ConfigUpdate, SourceMode};
use crate::error::Result;
use crate::github::GitHubClient;
use crate::types::{CollectionType, Item};

use super::entry::{CacheEntry, Origin};
use super::source::{DefaultsSource, MirrorStore, RemoteFetcher};

/// Snapshot returned by [`TemplateLoader::status`].
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub source: String,
    pub mode: SourceMode,
    pub cache_ttl_secs: u64,
    pub last_fetch: Option<DateTime<Utc>>,
    pub stale: bool,
    pub steps: usize,
    pub workflows: usize,
    pub steps_origin: Option<Origin>,
    pub workflows_origin: Option<Origin>,
}

/// Result of [`TemplateLoader::refresh`].
#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    pub steps: usize,
    pub workflows: usize,
    pub source: SourceMode,
    pub refreshed_at: DateTime<Utc>,
}

struct LoaderState {
    config: Config,
    /// Bumped on every reconfiguration; fetches started under an older value are not cached.
    generation: u64,
    entries: [Option<CacheEntry>; 2],
}

/// Held while a collection is being fetched. Clears the flag when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Loads step and workflow templates.
///
/// Each collection type has its own in-flight flag: at most one fetch per type runs at a
/// time, and a load arriving while its type is being fetched gets the current cached
/// collection (possibly empty) instead of waiting. Loading steps never blocks workflows.
pub struct TemplateLoader {
    remote: Arc<dyn RemoteFetcher>,
    mirror: Arc<dyn MirrorStore>,
    defaults: Arc<dyn DefaultsSource>,
    state: RwLock<LoaderState>,
    in_flight: [AtomicBool; 2],
}

impl TemplateLoader {
    /// Loader backed by api.github.com, a disk mirror and a bundled directory.
    pub fn new(
        config: Config,
        mirror_root: impl Into<PathBuf>,
        bundled_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        Self::with_sources(
            config,
            Arc::new(GitHubClient::new()?),
            Arc::new(DiskMirror::new(mirror_root)),
            Arc::new(BundledDir::new(bundled_root)),
        )
    }

    /// Loader over arbitrary source implementations.
    pub fn with_sources(
        config: Config,
        remote: Arc<dyn RemoteFetcher>,
        mirror: Arc<dyn MirrorStore>,
        defaults: Arc<dyn DefaultsSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            remote,
            mirror,
            defaults,
            state: RwLock::new(LoaderState {
                config,
                generation: 0,
                entries: [None, None],
            }),
            in_flight: [AtomicBool::new(false), AtomicBool::new(false)],
        })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, LoaderState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, LoaderState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current configuration.
    pub fn config(&self) -> Config {
        self.read_state().config.clone()
    }

    /// Cached items for a collection without any I/O; empty if nothing is cached.
    pub fn cached(&self, kind: CollectionType) -> Vec<Item> {
        self.read_state().entries[kind.index()]
            .as_ref()
            .map(|entry| entry.items.clone())
            .unwrap_or_default()
    }

    fn fresh(&self, kind: CollectionType) -> Option<Vec<Item>> {
        let state = self.read_state();
        state.entries[kind.index()]
            .as_ref()
            .filter(|entry| entry.is_fresh(state.config.cache_ttl))
            .map(|entry| entry.items.clone())
    }

    /// Load a collection, using the cache while it is within the TTL.
    ///
    /// Never fails: the worst case is an empty collection.
    pub async fn load(&self, kind: CollectionType) -> Vec<Item> {
        if let Some(items) = self.fresh(kind) {
            return items;
        }

        let Some(_guard) = InFlight::acquire(&self.in_flight[kind.index()]) else {
            debug!(collection = %kind, "fetch already in flight, serving cached");
            return self.cached(kind);
        };

        // Another load may have completed between the freshness check and the acquire.
        if let Some(items) = self.fresh(kind) {
            return items;
        }

        let (config, generation) = {
            let state = self.read_state();
            (state.config.clone(), state.generation)
        };

        let (items, origin) = self.fetch(kind, &config).await;

        let mut state = self.write_state();
        if state.generation == generation {
            state.entries[kind.index()] = Some(CacheEntry::new(items.clone(), origin));
        } else {
            debug!(collection = %kind, "configuration changed during fetch, result not cached");
        }
        items
    }

    pub async fn load_steps(&self) -> Vec<Item> {
        self.load(CollectionType::Steps).await
    }

    pub async fn load_workflows(&self) -> Vec<Item> {
        self.load(CollectionType::Workflows).await
    }

    async fn fetch(&self, kind: CollectionType, config: &Config) -> (Vec<Item>, Origin) {
        if config.source == SourceMode::LocalOnly {
            let items = self.defaults.read(kind).await;
            info!(collection = %kind, count = items.len(), "loaded bundled templates");
            return (items, Origin::Bundled);
        }

        let error = match self.fetch_remote(kind, config).await {
            Ok(items) => {
                info!(collection = %kind, count = items.len(), "loaded templates from remote");
                if let Err(error) = self.mirror.write(kind, &items).await {
                    warn!(collection = %kind, %error, "failed to update mirror");
                }
                return (items, Origin::Remote);
            }
            Err(error) => error,
        };
        warn!(collection = %kind, %error, "remote fetch failed");

        match self.mirror.read(kind).await {
            Ok(Some(items)) => {
                info!(collection = %kind, count = items.len(), "using cached from previous fetch");
                return (items, Origin::Mirror);
            }
            Ok(None) => {}
            Err(error) => warn!(collection = %kind, %error, "mirror unreadable"),
        }

        let items = self.defaults.read(kind).await;
        warn!(collection = %kind, count = items.len(), "falling back to bundled");
        (items, Origin::Bundled)
    }

    /// List the collection directory and parse every JSON file in it.
    ///
    /// Only the listing can fail; individual files that cannot be read or parsed are skipped.
    async fn fetch_remote(&self, kind: CollectionType, config: &Config) -> Result<Vec<Item>> {
        let target = config.remote_target();
        let dir = config.collection_path(kind);
        let entries = self.remote.list_directory(&target, &dir).await?;

        let mut items = Vec::new();
        for entry in entries.iter().filter(|entry| entry.is_json_file()) {
            let path = entry.path_in(&dir);
            let bytes = match self.remote.read_file(&target, &path).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    warn!(collection = %kind, %path, %error, "skipping remote file");
                    continue;
                }
            };
            match Item::parse(&bytes, &path) {
                Ok(item) => items.push(item),
                Err(error) => warn!(collection = %kind, %error, "skipping remote file"),
            }
        }
        Ok(items)
    }

    /// First item with the given id, loading the collection if stale.
    pub async fn get_by_id(&self, kind: CollectionType, id: &str) -> Option<Item> {
        self.load(kind).await.into_iter().find(|item| item.id() == id)
    }

    pub async fn get_step(&self, id: &str) -> Option<Item> {
        self.get_by_id(CollectionType::Steps, id).await
    }

    pub async fn get_workflow(&self, id: &str) -> Option<Item> {
        self.get_by_id(CollectionType::Workflows, id).await
    }

    /// Drop both cached collections and reload them concurrently.
    pub async fn refresh(&self) -> RefreshSummary {
        self.write_state().entries = [None, None];
        info!("template cache cleared, refreshing");

        let [first, second] = CollectionType::ALL;
        let (steps, workflows) = tokio::join!(self.load(first), self.load(second));

        RefreshSummary {
            steps: steps.len(),
            workflows: workflows.len(),
            source: self.read_state().config.source,
            refreshed_at: Utc::now(),
        }
    }

    /// Snapshot of configuration and cache state. Performs no I/O.
    pub fn status(&self) -> CacheStatus {
        let state = self.read_state();
        let [steps, workflows] = &state.entries;
        let latest = state
            .entries
            .iter()
            .flatten()
            .max_by_key(|entry| entry.fetched_at);

        CacheStatus {
            source: state.config.describe_source(),
            mode: state.config.source,
            cache_ttl_secs: state.config.cache_ttl.as_secs(),
            last_fetch: latest.map(|entry| entry.fetched_at),
            stale: latest.is_none_or(|entry| entry.is_expired(state.config.cache_ttl)),
            steps: steps.as_ref().map_or(0, |entry| entry.items.len()),
            workflows: workflows.as_ref().map_or(0, |entry| entry.items.len()),
            steps_origin: steps.as_ref().map(|entry| entry.origin),
            workflows_origin: workflows.as_ref().map(|entry| entry.origin),
        }
    }

    /// Apply a partial configuration and drop all cached state.
    ///
    /// Invalid updates are rejected without touching configuration or cache.
    pub fn update_config(&self, update: ConfigUpdate) -> Result<()> {
        let mut state = self.write_state();
        state.config.apply(update)?;
        state.generation += 1;
        state.entries = [None, None];
        info!(source = %state.config.describe_source(), "template configuration updated");
        Ok(())
    }
}
