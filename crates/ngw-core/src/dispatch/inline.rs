use async_trait::async_trait;
use tracing::trace;

use crate::{dispatch::Dispatch, work::BlockingJob};

/// Runs jobs in place on the calling task.
///
/// Blocks the executor for the duration of the job; meant for tests and for
/// jobs known to be trivial.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDispatch;

#[async_trait]
impl Dispatch for InlineDispatch {
    fn name(&self) -> &'static str {
        "inline"
    }

    async fn run_io_bound(&self, job: BlockingJob) -> anyhow::Result<()> {
        trace!(target: "ngw.core.dispatch", pool = "inline", "run io-bound job");
        job()
    }

    async fn run_cpu_bound(&self, job: BlockingJob) -> anyhow::Result<()> {
        trace!(target: "ngw.core.dispatch", pool = "inline", "run cpu-bound job");
        job()
    }
}
