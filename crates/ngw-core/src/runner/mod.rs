use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use ngw_model::{LogEntry, RunEvent, RunEventKind, RunMode, RunOutcome, RunState, WorkKind};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, trace};

use crate::{
    dispatch::{Dispatch, TokioDispatch},
    error::{RunnerError, RunnerResult},
    log::{Log, SharedLog},
    progress::ProgressSink,
    subscriber::Subscribe,
    work::Work,
};

mod config;
pub use config::RunnerConfig;

mod state;
use state::{ActiveRun, RunnerState, Stamp};

mod supervise;
use supervise::{Reporter, Supervised};

/// Single-flight background runner.
///
/// Each accepted `run_*` cancels the current run and starts the new one under
/// the configured timeout. Outcomes go to the log, not to the caller.
#[derive(Clone)]
pub struct TaskRunner {
    cfg: RunnerConfig,
    dispatch: Arc<dyn Dispatch>,
    progress: Option<Arc<dyn ProgressSink>>,
    log: SharedLog,
    subscribers: Vec<Arc<dyn Subscribe>>,
    state: Arc<Mutex<RunnerState>>,
    seq: Arc<AtomicU64>,
}

impl TaskRunner {
    pub fn new(cfg: RunnerConfig) -> Self {
        Self {
            cfg,
            dispatch: Arc::new(TokioDispatch::default()),
            progress: None,
            log: Log::shared(),
            subscribers: Vec::new(),
            state: Arc::new(Mutex::new(RunnerState::default())),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Runner with the given timeout and default everything else.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(RunnerConfig::new(timeout))
    }

    pub fn with_dispatch(mut self, dispatch: Arc<dyn Dispatch>) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Records outcomes into `log` instead of a private one.
    pub fn with_log(mut self, log: SharedLog) -> Self {
        self.log = log;
        self
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    #[inline]
    pub fn config(&self) -> &RunnerConfig {
        &self.cfg
    }

    /// Runs `work` with the entry point matching its kind.
    pub fn run(&self, work: Work) -> RunnerResult {
        match work.kind() {
            WorkKind::Async => self.run_async(work),
            WorkKind::Blocking => self.run_blocking(work),
        }
    }

    /// Runs synchronous work on the I/O pool (CPU pool if the work is marked cpu-bound).
    pub fn run_blocking(&self, work: Work) -> RunnerResult {
        self.launch(RunMode::Blocking, work)
    }

    /// Runs async work on the current runtime.
    pub fn run_async(&self, work: Work) -> RunnerResult {
        self.launch(RunMode::Async, work)
    }

    /// Runs async work that offloads its own blocking part.
    pub fn run_async_wrapping_blocking(&self, work: Work) -> RunnerResult {
        self.launch(RunMode::AsyncWrappingBlocking, work)
    }

    fn launch(&self, mode: RunMode, work: Work) -> RunnerResult {
        if work.kind() != mode.accepts() {
            let err = RunnerError::InvalidUsage {
                mode,
                got: work.kind(),
                task: work.name().to_string(),
            };
            debug!(target: "ngw.core.runner", error_kind = err.kind(), error = %err, "rejected work");
            self.reporter().emit(
                RunEvent::new(RunEventKind::InvalidUsage, work.name(), 0, mode)
                    .with_reason(err.to_string()),
            );
            return Err(err);
        }
        let rt = Handle::try_current().map_err(|_| RunnerError::NoRuntime(work.name().to_string()))?;

        let run = self.seq.fetch_add(1, Ordering::AcqRel) + 1;
        let name = work.name().to_string();
        let timeout = self.cfg.timeout();
        self.reporter().emit(
            RunEvent::new(RunEventKind::TaskStarting, name.clone(), run, mode)
                .with_timeout_ms(self.cfg.timeout_ms),
        );

        let token = CancellationToken::new();
        let supervised = Supervised {
            run,
            name: name.clone(),
            mode,
            timeout,
            token: token.clone(),
            work,
            dispatch: Arc::clone(&self.dispatch),
            reporter: self.reporter(),
        };
        let span = info_span!("run", run, task = %name, mode = mode.as_str());

        // cancel, reset and spawn under one lock, nothing awaited in between
        let mut st = self.state.lock();
        if let Some(prev) = st.current.take()
            && !prev.handle.is_finished()
        {
            trace!(target: "ngw.core.runner", superseded = prev.run, by = run, "cancel running task");
            prev.token.cancel();
        }
        if let Some(progress) = &self.progress {
            progress.reset();
        }
        st.task_name = Some(name);
        st.mode = Some(mode);
        st.start = Some(Stamp::now());
        st.stop = None;
        st.interrupted = None;

        let handle = rt.spawn(supervised.run().instrument(span));
        st.current = Some(ActiveRun { run, token, handle });
        Ok(())
    }

    /// Cancels the running task (if any) and clears timing back to `Ready`.
    pub fn cancel_running(&self) {
        let mut st = self.state.lock();
        if let Some(prev) = st.current.take()
            && !prev.handle.is_finished()
        {
            debug!(target: "ngw.core.runner", run = prev.run, "cancel running task");
            prev.token.cancel();
        }
        if let Some(progress) = &self.progress {
            progress.reset();
        }
        st.start = None;
        st.stop = None;
        st.interrupted = None;
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().is_running()
    }

    /// Zero if never started, time so far while running, run duration once stopped.
    pub fn get_elapsed_time(&self) -> Duration {
        self.state.lock().elapsed()
    }

    /// Human-readable status line (`Ready`, `Running ...`, `Completed ...`, `Interrupted ...`).
    pub fn get_status(&self) -> String {
        self.state.lock().status()
    }

    pub fn state(&self) -> RunState {
        self.state.lock().state()
    }

    /// Outcome of the most recent run that recorded a stop.
    pub fn last_outcome(&self) -> Option<RunOutcome> {
        self.state.lock().last_outcome
    }

    /// Name of the most recently started work.
    pub fn task_name(&self) -> Option<String> {
        self.state.lock().task_name.clone()
    }

    /// Snapshot of the outcome log.
    pub fn log(&self) -> Vec<LogEntry> {
        self.log.lock().entries().to_vec()
    }

    pub fn log_handle(&self) -> SharedLog {
        Arc::clone(&self.log)
    }

    fn reporter(&self) -> Reporter {
        Reporter {
            state: Arc::clone(&self.state),
            log: Arc::clone(&self.log),
            progress: self.progress.clone(),
            subscribers: self.subscribers.clone(),
        }
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner")
            .field("cfg", &self.cfg)
            .field("dispatch", &self.dispatch.name())
            .field("status", &self.get_status())
            .finish()
    }
}
