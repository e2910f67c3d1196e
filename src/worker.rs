//! Shared rule state and the background reload worker.
//!
//! The worker polls the rules directory's fingerprint and rebuilds the whole
//! [`RuleIndex`] whenever it changes. Readers always see either the previous
//! complete index or the new complete index, never a partial one.

use crate::annotate::{Span, TextAnnotator};
use crate::config::Config;
use crate::error::LoadError;
use crate::fingerprint::fingerprint_rules_async;
use crate::loader::load_rule_set_async;
use crate::model::RuleSet;
use crate::search::RuleIndex;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinError;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

/// Cache key for annotation results: (index generation, references only, text).
type AnnotationKey = (u64, bool, String);

/// The index currently in service and where it came from.
#[derive(Debug, Clone)]
struct Loaded {
    index: Arc<RuleIndex>,
    fingerprint: Option<u64>,
    generation: u64,
}

/// Snapshot of the state for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleStatus {
    pub rules_dir: PathBuf,
    pub loaded: bool,
    pub generation: u64,
    pub entries: usize,
    pub reference_keys: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Shared state for the current rule index.
///
/// This is the central coordination point for:
/// - Holding the index in service (swapped wholesale on rebuild)
/// - Remembering the last load failure
/// - Caching annotation results for the current generation (LRU)
pub struct RuleState {
    config: Config,

    /// Current index, if any load has succeeded
    current: RwLock<Option<Loaded>>,

    /// Message from the most recent failed load, cleared on success
    last_error: RwLock<Option<String>>,

    /// Serializes rebuilds so the worker and explicit reloads don't race
    rebuild: Mutex<()>,

    /// Annotation cache, `None` when disabled
    annotations: Option<Mutex<LruCache<AnnotationKey, Arc<Vec<Span>>>>>,
}

impl std::fmt::Debug for RuleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleState")
            .field("rules_dir", &self.config.rules_dir)
            .finish_non_exhaustive()
    }
}

impl RuleState {
    pub fn new(config: Config) -> Self {
        let annotations = NonZeroUsize::new(config.annotation_cache_size)
            .map(|size| Mutex::new(LruCache::new(size)));

        Self {
            config,
            current: RwLock::new(None),
            last_error: RwLock::new(None),
            rebuild: Mutex::new(()),
            annotations,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The index in service, if any.
    pub async fn index(&self) -> Option<Arc<RuleIndex>> {
        self.current.read().await.as_ref().map(|l| l.index.clone())
    }

    /// The index in service, or a message explaining why there is none.
    pub async fn require_index(&self) -> Result<Arc<RuleIndex>, String> {
        match self.index().await {
            Some(index) => Ok(index),
            None => Err(self.not_loaded_message().await),
        }
    }

    async fn not_loaded_message(&self) -> String {
        match self.last_error.read().await.as_deref() {
            Some(error) => format!("Rules are not loaded: {}", error),
            None => format!(
                "Rules are not loaded yet from {}",
                self.config.rules_dir.display()
            ),
        }
    }

    /// Reloads from disk if the rules directory changed (or always, with `force`).
    ///
    /// Returns whether a new index was installed. On failure the previous index
    /// stays in service and the error is remembered for status reporting.
    pub async fn refresh(&self, force: bool) -> Result<bool, LoadError> {
        let _guard = self.rebuild.lock().await;

        match self.load_if_changed(force).await {
            Ok(Some((rules, fingerprint))) => {
                self.install(rules, Some(fingerprint)).await?;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                tracing::warn!("Failed to load rules: {}", e);
                *self.last_error.write().await = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn load_if_changed(&self, force: bool) -> Result<Option<(RuleSet, u64)>, LoadError> {
        let root = self.config.rules_dir.clone();
        let fingerprint = fingerprint_rules_async(root.clone()).await?;

        let unchanged = self
            .current
            .read()
            .await
            .as_ref()
            .is_some_and(|l| l.fingerprint == Some(fingerprint));
        if unchanged && !force {
            tracing::trace!("Rules unchanged (fingerprint {:016x})", fingerprint);
            return Ok(None);
        }

        let rules = load_rule_set_async(root).await?;
        Ok(Some((rules, fingerprint)))
    }

    /// Builds a fresh index from a complete rule set and puts it in service.
    ///
    /// If the build task fails the previous index stays in service and the
    /// failure is recorded and returned.
    pub async fn install(&self, rules: RuleSet, fingerprint: Option<u64>) -> Result<(), LoadError> {
        let options = self.config.index_options();
        let built = tokio::task::spawn_blocking(move || RuleIndex::build(&rules, options)).await;
        self.put_in_service(built, fingerprint).await
    }

    async fn put_in_service(
        &self,
        built: Result<RuleIndex, JoinError>,
        fingerprint: Option<u64>,
    ) -> Result<(), LoadError> {
        let index = match built {
            Ok(index) => Arc::new(index),
            Err(e) => {
                tracing::error!("Index build task failed: {}", e);
                let error = LoadError::Interrupted(format!("index build failed: {}", e));
                *self.last_error.write().await = Some(error.to_string());
                return Err(error);
            }
        };

        let generation = {
            let mut current = self.current.write().await;
            let generation = current.as_ref().map_or(1, |l| l.generation + 1);
            *current = Some(Loaded {
                index,
                fingerprint,
                generation,
            });
            generation
        };

        *self.last_error.write().await = None;
        if let Some(cache) = &self.annotations {
            cache.lock().await.clear();
        }

        tracing::info!("Rule index generation {} in service", generation);
        Ok(())
    }

    /// Annotates text against the current index, memoised per generation.
    pub async fn annotate(
        &self,
        text: &str,
        references_only: bool,
    ) -> Result<Arc<Vec<Span>>, String> {
        let loaded = self.current.read().await.clone();
        let Some(Loaded {
            index, generation, ..
        }) = loaded
        else {
            return Err(self.not_loaded_message().await);
        };

        let key = (generation, references_only, text.to_string());
        if let Some(cache) = &self.annotations
            && let Some(spans) = cache.lock().await.get(&key)
        {
            tracing::trace!("Annotation cache hit");
            return Ok(spans.clone());
        }

        let spans = Arc::new(TextAnnotator::new(index.resolver()).annotate(text, references_only));

        if let Some(cache) = &self.annotations {
            cache.lock().await.put(key, spans.clone());
        }

        Ok(spans)
    }

    pub async fn status(&self) -> RuleStatus {
        let current = self.current.read().await;
        RuleStatus {
            rules_dir: self.config.rules_dir.clone(),
            loaded: current.is_some(),
            generation: current.as_ref().map_or(0, |l| l.generation),
            entries: current.as_ref().map_or(0, |l| l.index.entries().len()),
            reference_keys: current.as_ref().map_or(0, |l| l.index.resolver().len()),
            last_error: self.last_error.read().await.clone(),
        }
    }
}

/// Background worker that keeps the index in step with the rules directory.
pub struct ReloadWorker {
    state: Arc<RuleState>,
    cancel: CancellationToken,
}

impl ReloadWorker {
    pub const fn new(state: Arc<RuleState>, cancel: CancellationToken) -> Self {
        Self { state, cancel }
    }

    /// Polls until cancelled. Returns immediately when polling is disabled.
    pub async fn run(&self) {
        let Some(period) = self.state.config().poll_interval() else {
            tracing::debug!("Background reloading disabled");
            return;
        };

        let mut ticker = interval(period);
        // The first tick completes immediately; startup already loaded once.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!("Reload worker stopping");
                    return;
                }
                _ = ticker.tick() => {
                    match self.state.refresh(false).await {
                        Ok(true) => tracing::info!("Rules changed on disk, index rebuilt"),
                        Ok(false) => {}
                        // Already logged and recorded by refresh()
                        Err(_) => {}
                    }
                }
            }
        }
    }
}

/// Spawn the reload worker as a tokio task.
pub fn spawn_reload_worker(
    state: Arc<RuleState>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        ReloadWorker::new(state, cancel).run().await;
    })
}
