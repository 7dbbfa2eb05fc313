//! Integration tests for quarry-miner
//!
//! These run real dispatches against an in-memory SqliteStore with small
//! test extractors.

use quarry_domain::traits::{MetadataStore, ResourceQuery};
use quarry_domain::Resource;
use quarry_extract::{ExtractError, ExtractionContext, Extractor, ExtractorRegistry};
use quarry_miner::{
    ErrorReports, FileTask, Miner, MinerConfig, MinerError, MinerStatus, Outcome,
};
use quarry_store::SqliteStore;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One `nmo:Email` sub-resource per line; fails on files starting with "bad"
struct LineMailboxExtractor;

impl Extractor for LineMailboxExtractor {
    fn name(&self) -> &str {
        "mbox"
    }

    fn supported_types(&self) -> &[&str] {
        &["application/mbox"]
    }

    fn extract(&self, ctx: &ExtractionContext) -> Result<(), ExtractError> {
        let contents = std::fs::read_to_string(ctx.path())?;
        if contents.starts_with("bad") {
            return Err(ExtractError::Failed("corrupt mailbox".to_string()));
        }

        let mut mailbox = Resource::new(ctx.derive_content_id(None));
        mailbox.add_type("nfo:FileDataObject");
        for (i, subject) in contents.lines().enumerate() {
            let mut email = Resource::new(ctx.derive_content_id(Some(&i.to_string())));
            email.add_type("nmo:Email");
            email.set_string("nmo:messageSubject", subject);
            mailbox.add_relation("nie:interpretedAs", email);
        }
        ctx.set_resource(mailbox);
        Ok(())
    }
}

/// Succeeds without attaching anything
struct SilentExtractor;

impl Extractor for SilentExtractor {
    fn name(&self) -> &str {
        "silent"
    }

    fn supported_types(&self) -> &[&str] {
        &["audio/*"]
    }

    fn extract(&self, _ctx: &ExtractionContext) -> Result<(), ExtractError> {
        Ok(())
    }
}

/// Sleeps, then notes how many handles still hold the context
struct SlowExtractor {
    delay: Duration,
    holders_after_sleep: Arc<AtomicUsize>,
}

impl Extractor for SlowExtractor {
    fn name(&self) -> &str {
        "slow"
    }

    fn supported_types(&self) -> &[&str] {
        &["video/*"]
    }

    fn extract(&self, ctx: &ExtractionContext) -> Result<(), ExtractError> {
        std::thread::sleep(self.delay);
        self.holders_after_sleep
            .store(ctx.ref_count(), Ordering::SeqCst);
        ctx.set_resource(Resource::new(ctx.derive_content_id(None)));
        Ok(())
    }
}

/// Tracks the highest number of extractions running at once
struct ConcurrencyTracker {
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyTracker {
    fn new(delay: Duration) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let tracker = Self {
            delay,
            in_flight: Arc::clone(&in_flight),
            peak: Arc::clone(&peak),
        };
        (tracker, in_flight, peak)
    }
}

impl Extractor for ConcurrencyTracker {
    fn name(&self) -> &str {
        "tracker"
    }

    fn supported_types(&self) -> &[&str] {
        &["image/*"]
    }

    fn extract(&self, ctx: &ExtractionContext) -> Result<(), ExtractError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut image = Resource::new(ctx.derive_content_id(None));
        image.add_type("nfo:Image");
        ctx.set_resource(image);
        Ok(())
    }
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn test_registry() -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new();
    registry.register(LineMailboxExtractor);
    registry.register(SilentExtractor);
    registry
}

fn miner_with(registry: ExtractorRegistry, config: MinerConfig) -> Miner<SqliteStore> {
    let store = SqliteStore::new(":memory:").unwrap();
    Miner::new(registry, store, config).unwrap()
}

fn email_count(miner: &Miner<SqliteStore>) -> usize {
    let store = miner.store();
    let store = store.lock().unwrap();
    store
        .query_resources(&ResourceQuery::in_graph("").with_type("nmo:Email"))
        .unwrap()
        .len()
}

#[test]
fn test_invalid_config_rejected() {
    let config = MinerConfig {
        max_concurrent: 0,
        ..Default::default()
    };
    let store = SqliteStore::new(":memory:").unwrap();
    let result = Miner::new(ExtractorRegistry::new(), store, config);
    assert!(matches!(result, Err(MinerError::Config(_))));
}

#[tokio::test]
async fn test_text_file_with_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "notes.txt", "remember the milk");

    let miner = miner_with(ExtractorRegistry::with_builtins(), MinerConfig::default());
    let outcome = miner.process_file(FileTask::new(&path)).await.unwrap();

    let (content_id, resources) = match outcome {
        Outcome::Stored { content_id, resources } => (content_id, resources),
        other => panic!("expected stored outcome, got {:?}", other),
    };
    assert!(content_id.starts_with("urn:fileid:"));
    assert_eq!(resources, 1);

    let stored = miner
        .store()
        .lock()
        .unwrap()
        .get_resource("", &content_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.first_string("nie:plainTextContent"), Some("remember the milk"));
    assert_eq!(miner.metrics().extracted["text/plain"], 1);
}

#[tokio::test]
async fn test_explicit_task_fields_are_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "archive.data", "Hello\nWorld\n");

    let miner = miner_with(test_registry(), MinerConfig::default());
    let task = FileTask::new(&path)
        .with_content_id("h:feedface")
        .with_mimetype("application/mbox")
        .with_graph("tracker:Email");

    let outcome = miner.process_file(task).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Stored {
            content_id: "h:feedface".to_string(),
            resources: 3
        }
    );

    let store = miner.store();
    let store = store.lock().unwrap();
    assert!(store.get_resource("tracker:Email", "h:feedface/1").unwrap().is_some());
    assert!(store.get_resource("", "h:feedface").unwrap().is_none());
}

#[tokio::test]
async fn test_unsupported_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "paper.pdf", "%PDF");

    let miner = miner_with(test_registry(), MinerConfig::default());
    let outcome = miner.process_file(FileTask::new(&path)).await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Unsupported {
            mimetype: "application/pdf".to_string()
        }
    );
    assert_eq!(miner.metrics().unsupported, 1);
}

#[tokio::test]
async fn test_empty_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "silence.mp3", "");

    let miner = miner_with(test_registry(), MinerConfig::default());
    let outcome = miner.process_file(FileTask::new(&path)).await.unwrap();

    assert_eq!(outcome, Outcome::Empty);
    assert_eq!(miner.metrics().empty, 1);
    assert_eq!(miner.store().lock().unwrap().resource_count().unwrap(), 0);
}

#[tokio::test]
async fn test_failure_is_reported_then_cleared() {
    let dir = tempfile::tempdir().unwrap();
    let reports_dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "inbox.mbox", "bad data");

    let miner = miner_with(test_registry(), MinerConfig::default())
        .with_reports(ErrorReports::new(reports_dir.path()));

    let result = miner.process_file(FileTask::new(&path)).await;
    assert!(matches!(result, Err(MinerError::Extract(ExtractError::Failed(_)))));
    assert_eq!(miner.metrics().failures, 1);

    let reports = miner.reports().unwrap().list(&[]).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].path, path);
    assert_eq!(reports[0].mimetype, "application/mbox");
    assert!(reports[0].message.contains("Metadata extraction failed"));
    assert!(reports[0].uri.starts_with("file://"));

    // Fixed file extracts cleanly and the report goes away
    std::fs::write(&path, "Hello\n").unwrap();
    let outcome = miner.process_file(FileTask::new(&path)).await.unwrap();
    assert!(matches!(outcome, Outcome::Stored { resources: 2, .. }));
    assert!(miner.reports().unwrap().list(&[]).unwrap().is_empty());
}

#[tokio::test]
async fn test_reports_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let reports_dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "inbox.mbox", "bad data");

    let config = MinerConfig {
        report_errors: false,
        ..Default::default()
    };
    let miner = miner_with(test_registry(), config)
        .with_reports(ErrorReports::new(reports_dir.path()));

    assert!(miner.process_file(FileTask::new(&path)).await.is_err());
    assert!(miner.reports().unwrap().list(&[]).unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_file_fails_extraction() {
    let miner = miner_with(test_registry(), MinerConfig::default());
    let result = miner
        .process_file(FileTask::new("/nonexistent/quarry/inbox.mbox"))
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, MinerError::Extract(ExtractError::Io(_))));
    assert!(err.to_string().starts_with("Metadata extraction failed"));
}

#[tokio::test]
async fn test_timeout_abandons_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "movie.mkv", "frames");
    let holders = Arc::new(AtomicUsize::new(usize::MAX));

    let mut registry = ExtractorRegistry::new();
    registry.register(SlowExtractor {
        delay: Duration::from_millis(1500),
        holders_after_sleep: Arc::clone(&holders),
    });
    let config = MinerConfig {
        extraction_timeout_secs: 1,
        ..Default::default()
    };
    let miner = miner_with(registry, config);

    let result = miner.process_file(FileTask::new(&path)).await;
    assert!(matches!(result, Err(MinerError::Timeout(_))));
    assert_eq!(miner.metrics().timeouts, 1);

    // The abandoned extractor finishes on its own handle; the miner's is gone
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(holders.load(Ordering::SeqCst), 1);
    assert_eq!(miner.store().lock().unwrap().resource_count().unwrap(), 0);
}

#[tokio::test]
async fn test_reindex_retracts_stale_sub_resources() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "archive.mbox", "one\ntwo\nthree\n");
    let miner = miner_with(test_registry(), MinerConfig::default());

    miner.process_file(FileTask::new(&path)).await.unwrap();
    assert_eq!(email_count(&miner), 3);

    std::fs::write(&path, "one\n").unwrap();
    miner.process_file(FileTask::new(&path)).await.unwrap();
    assert_eq!(email_count(&miner), 1);
}

#[tokio::test]
async fn test_reindex_without_retraction_keeps_stale_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "archive.mbox", "one\ntwo\nthree\n");
    let config = MinerConfig {
        retract_stale_subresources: false,
        ..Default::default()
    };
    let miner = miner_with(test_registry(), config);

    miner.process_file(FileTask::new(&path)).await.unwrap();
    std::fs::write(&path, "one\n").unwrap();
    miner.process_file(FileTask::new(&path)).await.unwrap();

    assert_eq!(email_count(&miner), 3);
}

#[tokio::test]
async fn test_pause_holds_dispatch_until_resume() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "archive.mbox", "one\n");
    let miner = miner_with(test_registry(), MinerConfig::default());

    miner.pause();
    assert_eq!(miner.status(), MinerStatus::Paused);

    let worker = miner.clone();
    let handle = tokio::spawn(async move { worker.process_file(FileTask::new(path)).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_finished());
    assert_eq!(miner.store().lock().unwrap().resource_count().unwrap(), 0);

    miner.resume();
    let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(matches!(outcome, Outcome::Stored { .. }));
}

#[tokio::test]
async fn test_index_batch_respects_concurrency_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let (tracker, _in_flight, peak) = ConcurrencyTracker::new(Duration::from_millis(50));

    let mut registry = ExtractorRegistry::new();
    registry.register(tracker);
    let config = MinerConfig {
        max_concurrent: 2,
        ..Default::default()
    };
    let miner = miner_with(registry, config);

    let paths: Vec<PathBuf> = (0..6)
        .map(|i| write_file(dir.path(), &format!("photo{}.png", i), "png"))
        .collect();
    let tasks = paths.iter().map(|p| FileTask::new(p)).collect();

    let results = miner.index(tasks).await;

    assert_eq!(results.len(), 6);
    for (result, path) in results.iter().zip(&paths) {
        assert_eq!(&result.path, path);
        assert!(matches!(result.result, Ok(Outcome::Stored { .. })));
    }
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(miner.metrics().extracted["image/png"], 6);
    assert_eq!(miner.store().lock().unwrap().resource_count().unwrap(), 6);
}

#[tokio::test]
async fn test_timed_out_extractors_still_count_toward_limit() {
    let dir = tempfile::tempdir().unwrap();
    let (tracker, in_flight, peak) = ConcurrencyTracker::new(Duration::from_millis(1500));

    let mut registry = ExtractorRegistry::new();
    registry.register(tracker);
    let config = MinerConfig {
        max_concurrent: 1,
        extraction_timeout_secs: 1,
        ..Default::default()
    };
    let miner = miner_with(registry, config);

    let tasks = (0..3)
        .map(|i| FileTask::new(write_file(dir.path(), &format!("scan{}.png", i), "png")))
        .collect();
    let results = miner.index(tasks).await;

    assert!(results
        .iter()
        .all(|entry| matches!(entry.result, Err(MinerError::Timeout(_)))));
    assert_eq!(miner.metrics().timeouts, 3);

    // Let the last abandoned extractor return
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failure_report_keeps_absolute_path() {
    // Relative to the package root, where cargo runs integration tests
    let dir = tempfile::Builder::new()
        .prefix("quarry-reports")
        .tempdir_in(".")
        .unwrap();
    let reports_dir = tempfile::tempdir().unwrap();
    let name = dir.path().file_name().unwrap().to_owned();
    let relative = PathBuf::from(&name).join("inbox.mbox");
    std::fs::write(&relative, "bad data").unwrap();

    let miner = miner_with(test_registry(), MinerConfig::default())
        .with_reports(ErrorReports::new(reports_dir.path()));
    assert!(miner.process_file(FileTask::new(&relative)).await.is_err());

    let reports = miner.reports().unwrap().list(&[]).unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].path.is_absolute());
    assert_eq!(
        reports[0].path,
        std::env::current_dir().unwrap().join(&relative)
    );
}

#[tokio::test]
async fn test_metrics_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "archive.mbox", "one\n");
    let miner = miner_with(test_registry(), MinerConfig::default());

    miner.index(vec![FileTask::new(&path)]).await;
    assert_eq!(miner.metrics().total_extracted(), 1);

    miner.reset_metrics();
    assert_eq!(miner.metrics().total_extracted(), 0);
}
