use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{runtime::Handle, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, error, trace};

use crate::{
    dispatch::{Dispatch, TokioDispatch},
    error::{RunnerError, RunnerResult},
    work::Work,
};

mod config;
pub use config::DebouncerConfig;

/// Callback fired around a debounced call.
pub type Hook = Box<dyn FnOnce() + Send + 'static>;

/// Optional start/done callbacks for one debounced call.
#[derive(Default)]
pub struct DebounceHooks {
    on_start: Option<Hook>,
    on_done: Option<Hook>,
}

impl DebounceHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs just before the quiet period starts.
    pub fn on_start(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Runs once the work finished, failed or was cancelled mid-work.
    pub fn on_done(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_done = Some(Box::new(f));
        self
    }
}

struct Pending {
    call: u64,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Pending {
    fn is_live(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }
}

/// Collapses rapid calls into a single delayed execution of the last one.
///
/// A call cancelled before it started fires no hooks, one cancelled while
/// waiting fires only `on_start`; `on_done` fires whenever the work began.
#[derive(Clone)]
pub struct Debouncer {
    cfg: DebouncerConfig,
    dispatch: Arc<dyn Dispatch>,
    slot: Arc<Mutex<Option<Pending>>>,
    calls: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(cfg: DebouncerConfig) -> Self {
        Self {
            cfg,
            dispatch: Arc::new(TokioDispatch::default()),
            slot: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_dispatch(mut self, dispatch: Arc<dyn Dispatch>) -> Self {
        self.dispatch = dispatch;
        self
    }

    #[inline]
    pub fn config(&self) -> &DebouncerConfig {
        &self.cfg
    }

    /// Number of `debounce` calls accepted so far.
    #[inline]
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Acquire)
    }

    pub fn debounce(&self, work: Work) -> RunnerResult {
        self.debounce_with(work, DebounceHooks::default())
    }

    /// Schedules `work`, cancelling whatever call this instance still has pending.
    ///
    /// Must be called from within a tokio runtime.
    pub fn debounce_with(&self, work: Work, hooks: DebounceHooks) -> RunnerResult {
        let rt = Handle::try_current().map_err(|_| RunnerError::NoRuntime(work.name().to_string()))?;

        let call = self.calls.fetch_add(1, Ordering::AcqRel) + 1;
        let wait = if self.cfg.immediate_first && call == 1 {
            Duration::ZERO
        } else {
            self.cfg.delay()
        };

        let token = CancellationToken::new();
        let scheduled = Scheduled {
            call,
            wait,
            token: token.clone(),
            work,
            hooks,
            dispatch: Arc::clone(&self.dispatch),
            cpu_bound: self.cfg.cpu_bound,
        };
        let span = debug_span!("debounce", task = %self.cfg.task_name, call);

        // cancel and replace under one lock, nothing awaited in between
        let mut slot = self.slot.lock();
        if let Some(prev) = slot.take()
            && prev.is_live()
        {
            trace!(target: "ngw.core.debounce", superseded = prev.call, by = call, "cancel pending call");
            prev.token.cancel();
        }
        let handle = rt.spawn(scheduled.run().instrument(span));
        *slot = Some(Pending {
            call,
            token,
            handle,
        });
        Ok(())
    }

    /// True while a scheduled call is waiting or working.
    pub fn is_pending(&self) -> bool {
        self.slot.lock().as_ref().is_some_and(Pending::is_live)
    }

    /// Cancels the pending call, if any.
    pub fn cancel(&self) {
        if let Some(prev) = self.slot.lock().take() {
            trace!(target: "ngw.core.debounce", call = prev.call, "cancel pending call");
            prev.token.cancel();
        }
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("cfg", &self.cfg)
            .field("dispatch", &self.dispatch.name())
            .field("calls", &self.calls())
            .finish()
    }
}

struct Scheduled {
    call: u64,
    wait: Duration,
    token: CancellationToken,
    work: Work,
    hooks: DebounceHooks,
    dispatch: Arc<dyn Dispatch>,
    cpu_bound: bool,
}

/// Runs the `on_done` hook when dropped.
struct OnDone(Option<Hook>);

impl Drop for OnDone {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl Scheduled {
    async fn run(self) {
        let Scheduled {
            call,
            wait,
            token,
            work,
            hooks,
            dispatch,
            cpu_bound,
        } = self;

        if token.is_cancelled() {
            trace!(target: "ngw.core.debounce", call, "cancelled before start");
            return;
        }
        if let Some(on_start) = hooks.on_start {
            on_start();
        }

        if !wait.is_zero() {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(target: "ngw.core.debounce", call, "cancelled while waiting");
                    return;
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }

        let _done = OnDone(hooks.on_done);
        let name = work.name().to_string();
        let kind = work.kind();
        debug!(target: "ngw.core.debounce", call, work = %name, kind = kind.as_str(), "run debounced work");

        tokio::select! {
            _ = token.cancelled() => {
                debug!(target: "ngw.core.debounce", call, work = %name, "cancelled while running");
            }
            res = work.into_future(dispatch, cpu_bound) => match res {
                Ok(()) => trace!(target: "ngw.core.debounce", call, work = %name, "debounced work done"),
                Err(e) => error!(target: "ngw.core.debounce", call, work = %name, error = %e, "debounced work failed"),
            }
        }
    }
}
