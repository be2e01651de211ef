use std::{num::NonZeroUsize, sync::Arc, thread};

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use tokio::{
    sync::Semaphore,
    task::{AbortHandle, JoinError, JoinHandle},
};
use tracing::trace;

use crate::{dispatch::Dispatch, work::BlockingJob};

/// Dispatch backed by tokio's blocking thread pool.
///
/// I/O-bound jobs go straight to `spawn_blocking`. CPU-bound jobs use the same
/// pool but at most `cpu_slots` of them run at once.
#[derive(Clone)]
pub struct TokioDispatch {
    cpu_permits: Arc<Semaphore>,
    cpu_slots: usize,
}

impl TokioDispatch {
    pub fn new(cpu_slots: usize) -> Self {
        let cpu_slots = cpu_slots.max(1);
        Self {
            cpu_permits: Arc::new(Semaphore::new(cpu_slots)),
            cpu_slots,
        }
    }

    #[inline]
    pub fn cpu_slots(&self) -> usize {
        self.cpu_slots
    }
}

impl Default for TokioDispatch {
    fn default() -> Self {
        let cores = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self::new(cores)
    }
}

impl std::fmt::Debug for TokioDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioDispatch")
            .field("cpu_slots", &self.cpu_slots)
            .finish()
    }
}

#[async_trait]
impl Dispatch for TokioDispatch {
    fn name(&self) -> &'static str {
        "tokio"
    }

    async fn run_io_bound(&self, job: BlockingJob) -> anyhow::Result<()> {
        trace!(target: "ngw.core.dispatch", pool = "io", "spawn blocking job");
        join_blocking(tokio::task::spawn_blocking(job)).await
    }

    async fn run_cpu_bound(&self, job: BlockingJob) -> anyhow::Result<()> {
        let permit = Arc::clone(&self.cpu_permits)
            .acquire_owned()
            .await
            .context("cpu pool closed")?;

        trace!(target: "ngw.core.dispatch", pool = "cpu", "spawn blocking job");
        join_blocking(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        }))
        .await
    }
}

/// Aborts the blocking task when the awaiting side goes away.
///
/// Abort only prevents a job that has not started yet; a running job is left to finish.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn join_blocking(handle: JoinHandle<anyhow::Result<()>>) -> anyhow::Result<()> {
    let _guard = AbortOnDrop(handle.abort_handle());
    handle.await.map_err(join_error)?
}

fn join_error(err: JoinError) -> anyhow::Error {
    if err.is_panic() {
        let payload = err.into_panic();
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        anyhow!("blocking job panicked: {msg}")
    } else {
        anyhow!("blocking job cancelled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn io_bound_job_runs_off_the_executor() {
        let dispatch = TokioDispatch::default();
        let caller = thread::current().id();

        let (tx, rx) = std::sync::mpsc::channel();
        dispatch
            .run_io_bound(Box::new(move || -> anyhow::Result<()> {
                tx.send(thread::current().id()).unwrap();
                Ok(())
            }))
            .await
            .unwrap();

        assert_ne!(rx.recv().unwrap(), caller);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn job_error_is_returned() {
        let dispatch = TokioDispatch::default();
        let err = dispatch
            .run_io_bound(Box::new(|| -> anyhow::Result<()> { Err(anyhow!("disk full")) }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panic_becomes_error() {
        let dispatch = TokioDispatch::default();
        let err = dispatch
            .run_cpu_bound(Box::new(|| -> anyhow::Result<()> { panic!("bad input") }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "blocking job panicked: bad input");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cpu_slots_bound_concurrency() {
        let dispatch = TokioDispatch::new(1);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut joins = Vec::new();
        for _ in 0..4 {
            let dispatch = dispatch.clone();
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            joins.push(tokio::spawn(async move {
                dispatch
                    .run_cpu_bound(Box::new(move || -> anyhow::Result<()> {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        active.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    }))
                    .await
            }));
        }
        for join in joins {
            join.await.unwrap().unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cpu_slots_never_zero() {
        assert_eq!(TokioDispatch::new(0).cpu_slots(), 1);
    }
}
