//! Time-boxed cache and request coalescer around the walker.
//!
//! Several dashboard panels fetch the project list at once; without this
//! wrapper each of them would trigger its own full filesystem walk. A
//! fresh snapshot is served without I/O, and all callers that arrive while
//! a scan is running share that scan's result. The scan itself runs on a
//! detached task, so a caller that goes away never cancels work other
//! callers are waiting on.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::model::Project;
use crate::scan::Scanner;

/// How long a snapshot stays fresh.
pub const SCAN_CACHE_TTL: Duration = Duration::from_secs(10);

/// Anything that can produce the full project list.
pub trait ProjectSource: Send + Sync + 'static {
    fn scan(&self) -> impl Future<Output = io::Result<Vec<Project>>> + Send;
}

impl ProjectSource for Scanner {
    async fn scan(&self) -> io::Result<Vec<Project>> {
        Ok(self.scan_all().await)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ScanCacheError {
    #[error("project scan failed")]
    ScanFailed(#[source] Arc<io::Error>),

    /// The scan task stopped without reporting; only reachable if the
    /// runtime is shutting down underneath us.
    #[error("scan ended without a result")]
    Aborted,
}

type ScanOutcome = Result<Arc<Vec<Project>>, ScanCacheError>;

struct Snapshot {
    projects: Arc<Vec<Project>>,
    taken_at: Instant,
}

struct CacheState {
    cached: Option<Snapshot>,
    inflight: Option<broadcast::Sender<ScanOutcome>>,
}

struct CacheInner<S> {
    source: S,
    ttl: Duration,
    state: Mutex<CacheState>,
}

/// Shared cache handle; clones observe the same snapshot and in-flight
/// scan.
pub struct ScanCache<S> {
    inner: Arc<CacheInner<S>>,
}

impl<S> Clone for ScanCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ProjectSource> ScanCache<S> {
    pub fn new(source: S) -> Self {
        Self::with_ttl(source, SCAN_CACHE_TTL)
    }

    pub fn with_ttl(source: S, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                ttl,
                state: Mutex::new(CacheState {
                    cached: None,
                    inflight: None,
                }),
            }),
        }
    }

    /// The project list: a fresh snapshot when one exists, otherwise the
    /// result of the (possibly already running) scan.
    ///
    /// A failed scan is reported to every caller that was waiting on it,
    /// and clears the in-flight slot so the next call starts a clean scan.
    pub async fn get(&self) -> Result<Arc<Vec<Project>>, ScanCacheError> {
        let mut rx = {
            let mut state = self.inner.state.lock();

            if let Some(snapshot) = &state.cached {
                if snapshot.taken_at.elapsed() < self.inner.ttl {
                    return Ok(Arc::clone(&snapshot.projects));
                }
            }

            match &state.inflight {
                Some(sender) => sender.subscribe(),
                None => {
                    let (sender, receiver) = broadcast::channel(1);
                    state.inflight = Some(sender);
                    tokio::spawn(run_scan(Arc::clone(&self.inner)));
                    receiver
                }
            }
        };

        match rx.recv().await {
            Ok(outcome) => outcome,
            Err(_) => Err(ScanCacheError::Aborted),
        }
    }

    /// Drop the snapshot so the next call rescans. Called after any
    /// mutation that moves a project between directories.
    pub fn invalidate(&self) {
        self.inner.state.lock().cached = None;
    }
}

async fn run_scan<S: ProjectSource>(inner: Arc<CacheInner<S>>) {
    let outcome = match inner.source.scan().await {
        Ok(projects) => Ok(Arc::new(projects)),
        Err(err) => Err(ScanCacheError::ScanFailed(Arc::new(err))),
    };

    let mut state = inner.state.lock();
    if let Ok(projects) = &outcome {
        state.cached = Some(Snapshot {
            projects: Arc::clone(projects),
            taken_at: Instant::now(),
        });
    }
    if let Some(sender) = state.inflight.take() {
        // Nobody listening is fine; the snapshot is already stored.
        let _ = sender.send(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::UNIX_EPOCH;

    use quay_core::Status;

    fn sample_project(slug: &str) -> Project {
        Project {
            slug: slug.to_string(),
            name: slug.to_string(),
            path: format!("/code/{slug}").into(),
            suite: None,
            description: None,
            status: Status::Active,
            tech_stack: Vec::new(),
            version: None,
            last_modified: UNIX_EPOCH,
            git_branch: None,
            git_remote: None,
            has_git: false,
            dependencies: None,
            scripts: None,
            bugs: None,
            rcodegen: None,
            starred: false,
        }
    }

    /// Source that counts scans and pops queued outcomes (repeating the
    /// last one once the queue drains).
    struct FakeSource {
        calls: Arc<AtomicUsize>,
        delay: Duration,
        outcomes: Mutex<VecDeque<io::Result<Vec<Project>>>>,
    }

    impl FakeSource {
        fn ok(calls: Arc<AtomicUsize>, delay: Duration) -> Self {
            Self {
                calls,
                delay,
                outcomes: Mutex::new(VecDeque::new()),
            }
        }
    }

    impl ProjectSource for FakeSource {
        async fn scan(&self) -> io::Result<Vec<Project>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.outcomes.lock().pop_front() {
                Some(Ok(projects)) => Ok(projects),
                Some(Err(err)) => Err(err),
                None => Ok(vec![sample_project("proj-a")]),
            }
        }
    }

    #[tokio::test]
    async fn fresh_snapshot_skips_the_walker() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = ScanCache::new(FakeSource::ok(Arc::clone(&calls), Duration::ZERO));

        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_scan() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = ScanCache::new(FakeSource::ok(
            Arc::clone(&calls),
            Duration::from_millis(50),
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get().await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap()[0].slug, "proj-a");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_snapshot_rescans() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = ScanCache::with_ttl(
            FakeSource::ok(Arc::clone(&calls), Duration::ZERO),
            Duration::ZERO,
        );

        cache.get().await.unwrap();
        cache.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_a_rescan() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = ScanCache::new(FakeSource::ok(Arc::clone(&calls), Duration::ZERO));

        cache.get().await.unwrap();
        cache.invalidate();
        cache.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn a_failed_scan_does_not_wedge_the_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FakeSource::ok(Arc::clone(&calls), Duration::ZERO);
        source
            .outcomes
            .lock()
            .push_back(Err(io::Error::other("disk fell off")));
        let cache = ScanCache::new(source);

        assert!(matches!(
            cache.get().await,
            Err(ScanCacheError::ScanFailed(_))
        ));

        // Next caller gets a clean retry that succeeds.
        let projects = cache.get().await.unwrap();
        assert_eq!(projects[0].slug, "proj-a");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failure_reaches_every_coalesced_caller() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FakeSource::ok(Arc::clone(&calls), Duration::from_millis(50));
        source
            .outcomes
            .lock()
            .push_back(Err(io::Error::other("transient")));
        let cache = ScanCache::new(source);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get().await }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_err());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
