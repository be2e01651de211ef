use async_trait::async_trait;

use crate::work::BlockingJob;

mod inline;
pub use inline::InlineDispatch;

mod tokio_pool;
pub use tokio_pool::TokioDispatch;

/// Offload primitives for synchronous work.
///
/// Dropping a returned future abandons the job: a job not yet picked up by a
/// worker never runs, a running one finishes with its result discarded.
#[async_trait]
pub trait Dispatch: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Runs a job on a pool sized for waiting (file/network I/O, sleeps).
    async fn run_io_bound(&self, job: BlockingJob) -> anyhow::Result<()>;

    /// Runs a job on a pool bounded by the number of cores.
    async fn run_cpu_bound(&self, job: BlockingJob) -> anyhow::Result<()>;
}
