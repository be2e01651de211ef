use std::{sync::Arc, time::Duration};

use ngw_model::{RunEvent, RunEventKind, RunMode, RunOutcome, Severity, millis_ceil};
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    dispatch::Dispatch,
    log::SharedLog,
    progress::ProgressSink,
    runner::state::{RunnerState, Stamp},
    subscriber::{Subscribe, fan_out},
    work::Work,
};

/// Handles a run needs to report its outcome back to the runner.
#[derive(Clone)]
pub(super) struct Reporter {
    pub state: Arc<Mutex<RunnerState>>,
    pub log: SharedLog,
    pub progress: Option<Arc<dyn ProgressSink>>,
    pub subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Reporter {
    pub fn emit(&self, event: RunEvent) {
        fan_out(&self.subscribers, &event);
    }
}

pub(super) struct Supervised {
    pub run: u64,
    pub name: String,
    pub mode: RunMode,
    pub timeout: Duration,
    pub token: CancellationToken,
    pub work: Work,
    pub dispatch: Arc<dyn Dispatch>,
    pub reporter: Reporter,
}

impl Supervised {
    /// Awaits the work under the timeout, raced against cancellation, and records the outcome.
    pub async fn run(self) {
        let Supervised {
            run,
            name,
            mode,
            timeout,
            token,
            work,
            dispatch,
            reporter,
        } = self;

        let started = Instant::now();
        let mut guard = InterruptGuard {
            armed: true,
            run,
            name: name.clone(),
            mode,
            started,
            reporter: reporter.clone(),
        };

        // the work closure is first called here, inside the timeout and the cancel race
        let body = async move { work.into_future(dispatch, false).await };
        let (outcome, reason) = tokio::select! {
            _ = token.cancelled() => (RunOutcome::Cancelled, None),
            res = tokio::time::timeout(timeout, body) => match res {
                // work that never yielded can finish past its deadline
                Ok(_) if started.elapsed() > timeout => (RunOutcome::TimedOut, None),
                Ok(Ok(())) => (RunOutcome::Succeeded, None),
                Ok(Err(e)) => (RunOutcome::Failed, Some(format!("{e:#}"))),
                Err(_) => (RunOutcome::TimedOut, None),
            },
        };
        guard.armed = false;

        let elapsed = started.elapsed();
        let secs = elapsed.as_secs_f64();
        match outcome {
            RunOutcome::Succeeded => {
                debug!(target: "ngw.core.runner", run, task = %name, elapsed_ms = elapsed.as_millis() as u64, "run succeeded");
            }
            RunOutcome::TimedOut => reporter.log.lock().log(
                Severity::Error,
                "timeout",
                format!("Task \"{name}\" timed out after {:.2}s", timeout.as_secs_f64()),
            ),
            RunOutcome::Cancelled => reporter.log.lock().log(
                Severity::Warn,
                "cancelled",
                format!("Task \"{name}\" cancelled after {secs:.2}s"),
            ),
            RunOutcome::Failed => reporter.log.lock().log(
                Severity::Error,
                "exception",
                format!(
                    "Task \"{name}\" failed after {secs:.2}s: {}",
                    reason.as_deref().unwrap_or_default()
                ),
            ),
        }

        {
            let mut st = reporter.state.lock();
            if st.is_current(run) {
                st.stop = Some(Stamp::now());
                st.last_outcome = Some(outcome);
                if let Some(progress) = &reporter.progress {
                    progress.finish();
                }
            } else {
                debug!(target: "ngw.core.runner", run, task = %name, "run superseded; timing left to the newer run");
            }
        }

        let mut event = RunEvent::new(RunEventKind::from_outcome(outcome), name, run, mode)
            .with_elapsed_ms(elapsed.as_millis() as u64);
        if outcome == RunOutcome::TimedOut {
            event = event.with_timeout_ms(millis_ceil(timeout));
        }
        if let Some(reason) = reason {
            event = event.with_reason(reason);
        }
        reporter.emit(event);
    }
}

/// Records an interruption if the run's future is dropped before it could finish
/// (work panicked or the runtime went away).
struct InterruptGuard {
    armed: bool,
    run: u64,
    name: String,
    mode: RunMode,
    started: Instant,
    reporter: Reporter,
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let secs = self.started.elapsed().as_secs_f64();
        warn!(target: "ngw.core.runner", run = self.run, task = %self.name, "run interrupted before its outcome was recorded");

        {
            let mut st = self.reporter.state.lock();
            if st.is_current(self.run) {
                st.interrupted = Some(Stamp::now());
            }
        }
        self.reporter.log.lock().log(
            Severity::Warn,
            "interrupted",
            format!("Task \"{}\" interrupted after {secs:.2}s", self.name),
        );
        self.reporter.emit(
            RunEvent::new(RunEventKind::TaskInterrupted, self.name.clone(), self.run, self.mode)
                .with_elapsed_ms((secs * 1000.0) as u64),
        );
    }
}
