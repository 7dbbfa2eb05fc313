//! Dispatch of files to extractors and of their results to the store

use crate::config::MinerConfig;
use crate::error::MinerError;
use crate::identity::{file_content_id, guess_mimetype};
use crate::metrics::MinerMetrics;
use crate::reports::{ErrorReport, ErrorReports};
use crate::state::{MinerState, MinerStatus};
use quarry_domain::traits::MetadataStore;
use quarry_domain::{ContentId, Resource};
use quarry_extract::{ExtractionContext, ExtractorRegistry};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// One file to index
///
/// Unset fields are filled in by the miner: the content identifier from the
/// canonical path, the MIME type from the extension, the graph from the
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    /// File to extract
    pub path: PathBuf,
    /// Content identifier to use instead of the path-derived one
    pub content_id: Option<String>,
    /// MIME type to use instead of the guessed one
    pub mimetype: Option<String>,
    /// Destination graph to use instead of the configured default
    pub graph: Option<String>,
}

impl FileTask {
    /// Task for `path` with everything else derived
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content_id: None,
            mimetype: None,
            graph: None,
        }
    }

    /// Set the content identifier
    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    /// Set the MIME type
    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    /// Set the destination graph
    pub fn with_graph(mut self, graph: impl Into<String>) -> Self {
        self.graph = Some(graph.into());
        self
    }
}

/// What indexing one file achieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The extractor produced a resource graph and it was stored
    Stored {
        /// Base content identifier of the stored graph
        content_id: String,
        /// Rows written, sub-resources included
        resources: usize,
    },
    /// The extractor succeeded but attached nothing
    Empty,
    /// No extractor handles the MIME type
    Unsupported {
        /// The MIME type nobody handles
        mimetype: String,
    },
}

/// Result of one file in a batch
#[derive(Debug)]
pub struct IndexResult {
    /// File the result is about
    pub path: PathBuf,
    /// Outcome or failure
    pub result: Result<Outcome, MinerError>,
}

/// The indexing service
///
/// For each file the miner creates an [`ExtractionContext`], hands an
/// acquired copy to the extractor on a blocking thread, waits for it under
/// the configured timeout, then reads the attached resource back and stores
/// it. Clones share the store, metrics, pause state and registry.
pub struct Miner<S: MetadataStore> {
    registry: Arc<ExtractorRegistry>,
    store: Arc<Mutex<S>>,
    config: MinerConfig,
    state: MinerState,
    reports: Option<ErrorReports>,
    metrics: Arc<Mutex<MinerMetrics>>,
}

impl<S: MetadataStore> Clone for Miner<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            state: self.state.clone(),
            reports: self.reports.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S> Miner<S>
where
    S: MetadataStore + Send + 'static,
    S::Error: std::fmt::Display,
{
    /// Create a new Miner
    ///
    /// # Errors
    /// Returns [`MinerError::Config`] if the configuration is invalid.
    pub fn new(
        registry: ExtractorRegistry,
        store: S,
        config: MinerConfig,
    ) -> Result<Self, MinerError> {
        config.validate().map_err(MinerError::Config)?;

        Ok(Self {
            registry: Arc::new(registry),
            store: Arc::new(Mutex::new(store)),
            config,
            state: MinerState::new(),
            reports: None,
            metrics: Arc::new(Mutex::new(MinerMetrics::new())),
        })
    }

    /// Record failures in `reports`
    pub fn with_reports(mut self, reports: ErrorReports) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Shared handle to the store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// Error reports, if configured
    pub fn reports(&self) -> Option<&ErrorReports> {
        self.reports.as_ref()
    }

    /// Snapshot of the metrics
    pub fn metrics(&self) -> MinerMetrics {
        lock(&self.metrics).clone()
    }

    /// Reset the metrics counters
    pub fn reset_metrics(&self) {
        lock(&self.metrics).reset();
    }

    /// Pause state shared by all clones
    pub fn state(&self) -> &MinerState {
        &self.state
    }

    /// Stop dispatching new files
    pub fn pause(&self) {
        self.state.pause();
    }

    /// Resume dispatching
    pub fn resume(&self) {
        self.state.resume();
    }

    /// Current running/paused status
    pub fn status(&self) -> MinerStatus {
        self.state.status()
    }

    /// Build the context for a task
    pub fn context_for(&self, task: &FileTask) -> Result<ExtractionContext, MinerError> {
        let content_id = match &task.content_id {
            Some(id) => id.clone(),
            None => file_content_id(&task.path)?,
        };
        let mimetype = task
            .mimetype
            .clone()
            .unwrap_or_else(|| guess_mimetype(&task.path).to_string());
        let graph = task
            .graph
            .as_deref()
            .unwrap_or(&self.config.default_graph);

        Ok(ExtractionContext::new(
            &task.path,
            &content_id,
            &mimetype,
            graph,
            self.config.max_text_size,
        )?)
    }

    /// Run the extractor for a task without storing anything
    ///
    /// Waits while the miner is paused. Returns the context with whatever
    /// resource the extractor attached. Failures are counted and, when
    /// enabled, recorded as error reports.
    ///
    /// # Errors
    /// [`MinerError::Unsupported`] when no extractor matches the MIME type,
    /// [`MinerError::Timeout`] when the extractor overruns,
    /// [`MinerError::Extract`] when it fails.
    pub async fn extract(&self, task: &FileTask) -> Result<ExtractionContext, MinerError> {
        self.run_extractor(task, None).await
    }

    /// Extraction proper; `permit` is held by the extractor thread until the
    /// extractor returns, even if the wait for it times out
    async fn run_extractor(
        &self,
        task: &FileTask,
        permit: Option<OwnedSemaphorePermit>,
    ) -> Result<ExtractionContext, MinerError> {
        self.state.wait_until_running().await;

        let ctx = self.context_for(task)?;

        let Some(extractor) = self.registry.get_for_mime(ctx.mimetype()) else {
            debug!(
                "No extractor for '{}' ({})",
                ctx.path().display(),
                ctx.mimetype()
            );
            lock(&self.metrics).record_unsupported();
            return Err(MinerError::Unsupported(ctx.mimetype().to_string()));
        };

        info!(
            "Extracting '{}' as {} with '{}'",
            ctx.path().display(),
            ctx.mimetype(),
            extractor.name()
        );

        // The blocking thread owns its own handle; on timeout it keeps the
        // context alive until the extractor returns
        let worker_ctx = ctx.acquire();
        let handle = tokio::task::spawn_blocking(move || {
            let result = extractor.extract(&worker_ctx);
            worker_ctx.release();
            drop(permit);
            result
        });

        let limit = self.config.extraction_timeout();
        let failure = match timeout(limit, handle).await {
            Ok(Ok(Ok(()))) => return Ok(ctx),
            Ok(Ok(Err(e))) => {
                lock(&self.metrics).record_failure();
                MinerError::Extract(e)
            }
            Ok(Err(join_error)) => {
                lock(&self.metrics).record_failure();
                MinerError::Worker(join_error.to_string())
            }
            Err(_) => {
                lock(&self.metrics).record_timeout();
                MinerError::Timeout(limit)
            }
        };

        warn!("Extraction of '{}' failed: {}", ctx.path().display(), failure);
        self.report_failure(&ctx, &failure);
        Err(failure)
    }

    /// Extract one file and store its resource graph
    pub async fn process_file(&self, task: FileTask) -> Result<Outcome, MinerError> {
        self.process_task(task, None).await
    }

    async fn process_task(
        &self,
        task: FileTask,
        permit: Option<OwnedSemaphorePermit>,
    ) -> Result<Outcome, MinerError> {
        let ctx = match self.run_extractor(&task, permit).await {
            Ok(ctx) => ctx,
            Err(MinerError::Unsupported(mimetype)) => {
                return Ok(Outcome::Unsupported { mimetype });
            }
            Err(e) => return Err(e),
        };

        let Some(resource) = ctx.resource() else {
            debug!("'{}' produced no metadata", ctx.path().display());
            lock(&self.metrics).record_empty();
            self.clear_report(ctx.file().uri());
            return Ok(Outcome::Empty);
        };

        if self.config.retract_stale_subresources {
            warn_unretractable(&ctx, &resource);
        }

        let written = lock(&self.store)
            .replace_resource(
                ctx.graph(),
                ctx.content_id(),
                &resource,
                self.config.retract_stale_subresources,
            )
            .map_err(|e| MinerError::Store(e.to_string()))?;

        lock(&self.metrics).record_extraction(ctx.mimetype(), written);
        self.clear_report(ctx.file().uri());

        info!(
            "Stored {} resource(s) for '{}' in graph '{}'",
            written,
            ctx.path().display(),
            ctx.graph()
        );

        let content_id = ctx.content_id().to_string();
        ctx.release();

        Ok(Outcome::Stored {
            content_id,
            resources: written,
        })
    }

    /// Index a batch of files concurrently
    ///
    /// At most `max_concurrent` extractors run at once, counting ones that
    /// timed out but have not returned yet. Results come back in input order.
    pub async fn index(&self, tasks: Vec<FileTask>) -> Vec<IndexResult> {
        let start = Instant::now();
        let total = tasks.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let mut set = JoinSet::new();

        info!(
            "Indexing {} file(s), {} at a time",
            total, self.config.max_concurrent
        );

        for (position, task) in tasks.into_iter().enumerate() {
            let miner = self.clone();
            let semaphore = Arc::clone(&semaphore);
            set.spawn(async move {
                let path = task.path.clone();
                let result = match semaphore.acquire_owned().await {
                    Ok(permit) => miner.process_task(task, Some(permit)).await,
                    Err(e) => Err(MinerError::Worker(e.to_string())),
                };
                (position, IndexResult { path, result })
            });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(entry) => results.push(entry),
                Err(e) => warn!("Indexing task failed: {}", e),
            }
        }
        results.sort_by_key(|(position, _)| *position);

        let elapsed = start.elapsed();
        lock(&self.metrics).total_runtime_ms += elapsed.as_millis() as u64;
        info!("Indexed {} file(s) in {:?}", results.len(), elapsed);

        results.into_iter().map(|(_, result)| result).collect()
    }

    fn report_failure(&self, ctx: &ExtractionContext, failure: &MinerError) {
        if !self.config.report_errors {
            return;
        }
        let Some(reports) = &self.reports else {
            return;
        };

        let file = ctx.file();
        let report = ErrorReport::new(file.uri(), file.absolute_path(), failure.to_string())
            .with_mimetype(ctx.mimetype())
            .with_content_id(ctx.content_id());

        if let Err(e) = reports.record(&report) {
            warn!("Could not record error report for '{}': {}", ctx.path().display(), e);
        }
    }

    fn clear_report(&self, uri: &str) {
        if let Some(reports) = &self.reports {
            if let Err(e) = reports.remove(uri) {
                warn!("Could not remove error report for '{}': {}", uri, e);
            }
        }
    }
}

impl From<&Path> for FileTask {
    fn from(path: &Path) -> Self {
        FileTask::new(path)
    }
}

/// Log resources that a later re-index would not retract
///
/// Only the base id and ids derived from it are cleaned up; anything else the
/// extractor named lingers after the file changes.
fn warn_unretractable(ctx: &ExtractionContext, resource: &Resource) {
    let Ok(base) = ContentId::new(ctx.content_id()) else {
        return;
    };
    for row in resource.flatten() {
        let id = row.identifier();
        if id != base.as_str() && !base.is_derived_from(id) && !row.is_blank() {
            warn!(
                "'{}' names resource '{}' outside '{}'; it will not be retracted on re-index",
                ctx.path().display(),
                id,
                base
            );
        }
    }
}
