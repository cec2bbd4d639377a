//! Bounded fan-out over async work.
//!
//! [`work_map`] runs one async job per input item with at most `workers`
//! jobs outstanding at a time, and returns per-item results in input order
//! regardless of completion order. One item failing (or panicking) never
//! aborts the batch: the failure is recorded as that item's result.
//!
//! The main consumers are git operations fanned out across many project
//! directories, where the worker cap trades wall-clock time against
//! subprocess and file-descriptor pressure.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;

/// Options for [`work_map`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkOptions {
    /// Maximum number of jobs running at once. Defaults to the host's
    /// available parallelism. A value of `0` is clamped to `1` rather than
    /// rejected.
    pub workers: Option<usize>,
}

/// Why one item's job did not produce a value.
#[derive(Debug, Error)]
pub enum WorkError {
    #[error(transparent)]
    Failed(#[from] anyhow::Error),

    #[error("worker task panicked: {0}")]
    Panicked(String),
}

/// The outcome for a single input item, tagged with its original index.
#[derive(Debug)]
pub struct TaskResult<T> {
    pub index: usize,
    pub result: Result<T, WorkError>,
}

impl<T> TaskResult<T> {
    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn into_value(self) -> Option<T> {
        self.result.ok()
    }
}

/// Worker count used when [`WorkOptions::workers`] is unset.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Run `f` over every item with bounded parallelism.
///
/// Results come back in input order. Each item's failure is recorded in its
/// own [`TaskResult`]; panics inside `f` are caught and reported as
/// [`WorkError::Panicked`].
pub async fn work_map<T, R, F, Fut>(items: Vec<T>, f: F, options: WorkOptions) -> Vec<TaskResult<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    let workers = options.workers.unwrap_or_else(default_workers).max(1);
    let semaphore = Arc::new(Semaphore::new(workers));

    let mut handles = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let f = f.clone();
        handles.push((
            index,
            tokio::spawn(async move {
                // The semaphore is never closed, so acquire cannot fail.
                let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
                f(item).await
            }),
        ));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (index, handle) in handles {
        let result = match handle.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(WorkError::Failed(err)),
            Err(join_err) if join_err.is_panic() => {
                Err(WorkError::Panicked(panic_message(join_err.into_panic())))
            }
            Err(_) => Err(WorkError::Panicked("task cancelled".to_string())),
        };
        results.push(TaskResult { index, result });
    }
    results
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
