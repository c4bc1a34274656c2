//! Best-effort background deletion of orphaned image objects.
//!
//! Callers hand object keys to [`Reaper::dispatch`] and move on. A fixed set
//! of worker tasks drains a bounded queue and deletes each key from the
//! asset bucket. Failures are logged and dropped; nothing is retried.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::model::ProjectImage;
use super::path::{resolve_asset_path, AssetPath};
use crate::store::ObjectStore;

#[derive(Debug, Clone, Copy)]
pub struct ReaperConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
        }
    }
}

#[derive(Debug)]
struct ReapJob {
    project_id: String,
    key: String,
}

/// Count of dispatched jobs not yet finished, with a wake-up for waiters.
#[derive(Default)]
struct Progress {
    pending: AtomicUsize,
    idle: Notify,
}

impl Progress {
    fn start(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Handle to the reaping queue. Cheap to clone; all clones feed the same
/// workers.
#[derive(Clone)]
pub struct Reaper {
    bucket: String,
    tx: mpsc::Sender<ReapJob>,
    progress: Arc<Progress>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    closed: Arc<AtomicBool>,
}

impl Reaper {
    /// Start the worker tasks. Must be called inside a tokio runtime.
    pub fn spawn(assets: Arc<dyn ObjectStore>, config: ReaperConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let progress = Arc::new(Progress::default());
        let tracker = TaskTracker::new();
        let shutdown = CancellationToken::new();

        for worker in 0..config.workers.max(1) {
            tracker.spawn(run_worker(
                worker,
                assets.clone(),
                rx.clone(),
                progress.clone(),
                shutdown.clone(),
            ));
        }

        tracing::info!(
            bucket = assets.bucket(),
            workers = config.workers.max(1),
            queue_capacity = config.queue_capacity.max(1),
            "Asset reaper started"
        );

        Self {
            bucket: assets.bucket().to_string(),
            tx,
            progress,
            tracker,
            shutdown,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queue `key` for deletion without waiting for it.
    ///
    /// Returns whether the job was accepted. A full queue or a shut-down
    /// reaper drops the job with a warning.
    pub fn dispatch(&self, project_id: &str, key: String) -> bool {
        // Count the job before checking `closed`: a shutdown that has already
        // read `pending` as zero must be visible here.
        self.progress.start();
        if self.closed.load(Ordering::SeqCst) {
            self.progress.finish();
            tracing::warn!(project_id, path = %key, "Reaper is shut down, asset left in place");
            return false;
        }

        let job = ReapJob {
            project_id: project_id.to_string(),
            key,
        };
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                self.progress.finish();
                tracing::warn!(
                    project_id = %job.project_id,
                    path = %job.key,
                    "Reap queue full, asset left in place"
                );
                false
            }
            Err(TrySendError::Closed(job)) => {
                self.progress.finish();
                tracing::warn!(
                    project_id = %job.project_id,
                    path = %job.key,
                    "Reap queue closed, asset left in place"
                );
                false
            }
        }
    }

    /// Resolve the object behind `image` and queue it for deletion.
    ///
    /// Images whose key cannot be resolved are skipped with a warning.
    pub fn reap_image(&self, project_id: &str, image: &ProjectImage) -> bool {
        match resolve_asset_path(image) {
            AssetPath::Resolved(key) => self.dispatch(project_id, key),
            AssetPath::Unresolvable(reason) => {
                tracing::warn!(
                    project_id,
                    url = %image.url,
                    %reason,
                    "Could not determine object path, skipping deletion"
                );
                false
            }
        }
    }

    /// Number of dispatched deletions that have not finished yet.
    pub fn pending(&self) -> usize {
        self.progress.pending.load(Ordering::SeqCst)
    }

    /// Wait until every dispatched deletion has finished.
    pub async fn wait_idle(&self) {
        self.progress.wait_idle().await;
    }

    /// Stop accepting jobs, let the workers drain the queue, then stop them.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.wait_idle().await;
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::info!(bucket = %self.bucket, "Asset reaper stopped");
    }
}

async fn run_worker(
    worker: usize,
    assets: Arc<dyn ObjectStore>,
    jobs: Arc<Mutex<mpsc::Receiver<ReapJob>>>,
    progress: Arc<Progress>,
    shutdown: CancellationToken,
) {
    loop {
        let job = {
            let mut rx = jobs.lock().await;
            tokio::select! {
                biased;
                job = rx.recv() => job,
                _ = shutdown.cancelled() => None,
            }
        };
        let Some(job) = job else {
            break;
        };

        match assets.delete(&job.key).await {
            Ok(()) => tracing::info!(
                worker,
                bucket = assets.bucket(),
                project_id = %job.project_id,
                path = %job.key,
                "Deleted orphaned asset"
            ),
            Err(e) => tracing::error!(
                worker,
                bucket = assets.bucket(),
                project_id = %job.project_id,
                path = %job.key,
                error = %e,
                "Failed to delete orphaned asset"
            ),
        }
        progress.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryObjectStore;

    fn reaper_with(objects: &Arc<MemoryObjectStore>, config: ReaperConfig) -> Reaper {
        Reaper::spawn(objects.clone(), config)
    }

    #[tokio::test]
    async fn dispatched_keys_are_deleted() {
        let objects = Arc::new(MemoryObjectStore::new("assets"));
        objects.insert("a.webp", "image/webp", b"a");
        objects.insert("b.webp", "image/webp", b"b");
        let reaper = reaper_with(&objects, ReaperConfig::default());

        assert!(reaper.dispatch("p1", "a.webp".to_string()));
        assert!(reaper.dispatch("p1", "b.webp".to_string()));
        reaper.wait_idle().await;

        assert!(!objects.contains("a.webp"));
        assert!(!objects.contains("b.webp"));
        assert_eq!(reaper.pending(), 0);
    }

    #[tokio::test]
    async fn failures_are_swallowed_and_do_not_stop_workers() {
        let objects = Arc::new(MemoryObjectStore::new("assets"));
        objects.insert("ok.webp", "image/webp", b"x");
        objects.fail_delete("denied.webp");
        let reaper = reaper_with(&objects, ReaperConfig { workers: 1, queue_capacity: 8 });

        reaper.dispatch("p1", "denied.webp".to_string());
        reaper.dispatch("p1", "missing.webp".to_string());
        reaper.dispatch("p1", "ok.webp".to_string());
        reaper.wait_idle().await;

        let mut calls = objects.delete_calls();
        calls.sort();
        assert_eq!(calls, vec!["denied.webp", "missing.webp", "ok.webp"]);
        assert!(!objects.contains("ok.webp"));
    }

    #[tokio::test]
    async fn unresolvable_image_is_skipped() {
        let objects = Arc::new(MemoryObjectStore::new("assets"));
        let reaper = reaper_with(&objects, ReaperConfig::default());

        let legacy = ProjectImage::new("https://cdn.example.com/a.webp", "");
        assert!(!reaper.reap_image("p1", &legacy));
        reaper.wait_idle().await;
        assert!(objects.delete_calls().is_empty());
    }

    #[tokio::test]
    async fn wait_idle_returns_immediately_without_work() {
        let objects = Arc::new(MemoryObjectStore::new("assets"));
        let reaper = reaper_with(&objects, ReaperConfig::default());
        reaper.wait_idle().await;
    }

    #[tokio::test]
    async fn shutdown_drains_then_refuses_new_jobs() {
        let objects = Arc::new(MemoryObjectStore::new("assets"));
        objects.insert("a.webp", "image/webp", b"a");
        let reaper = reaper_with(&objects, ReaperConfig { workers: 2, queue_capacity: 4 });

        reaper.dispatch("p1", "a.webp".to_string());
        reaper.shutdown().await;

        assert!(!objects.contains("a.webp"));
        assert!(!reaper.dispatch("p1", "b.webp".to_string()));
        assert_eq!(objects.delete_calls(), vec!["a.webp"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn dispatch_racing_shutdown_leaves_nothing_pending() {
        use std::time::Duration;

        for _ in 0..50 {
            let objects = Arc::new(MemoryObjectStore::new("assets"));
            let reaper = Arc::new(reaper_with(&objects, ReaperConfig { workers: 2, queue_capacity: 64 }));

            let senders: Vec<_> = (0..4)
                .map(|n| {
                    let reaper = reaper.clone();
                    tokio::spawn(async move {
                        for i in 0..16 {
                            reaper.dispatch("p1", format!("{}-{}.webp", n, i));
                            tokio::task::yield_now().await;
                        }
                    })
                })
                .collect();

            let stopped = tokio::time::timeout(Duration::from_secs(5), reaper.shutdown()).await;
            assert!(stopped.is_ok());
            for sender in senders {
                sender.await.unwrap();
            }

            let idle = tokio::time::timeout(Duration::from_secs(5), reaper.wait_idle()).await;
            assert!(idle.is_ok());
            assert_eq!(reaper.pending(), 0);
        }
    }
}
