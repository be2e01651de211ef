//! Background run coordination for event-driven front ends.
//!
//! - [`Debouncer`] collapses bursts of requests into one delayed execution.
//! - [`TaskRunner`] runs one unit of work at a time under a timeout and keeps
//!   a status line and an outcome [`Log`] for the embedding UI to poll.
//!
//! Both take their worker pools through the [`Dispatch`] capability, so tests
//! (and embedders with their own pools) can substitute them.

pub mod error;
pub use error::{RunnerError, RunnerResult};

pub mod dispatch;
pub use dispatch::{Dispatch, InlineDispatch, TokioDispatch};

pub mod work;
pub use work::{BoxWorkFuture, Work};

pub mod log;
pub use log::{Log, LogError, SharedLog};

pub mod progress;
pub use progress::{ProgressBar, ProgressSink};

pub mod subscriber;
pub use subscriber::Subscribe;

pub mod debounce;
pub use debounce::{DebounceHooks, Debouncer, DebouncerConfig};

pub mod runner;
pub use runner::{RunnerConfig, TaskRunner};

pub mod prelude {
    pub use crate::error::{RunnerError, RunnerResult};
    pub use crate::{Debouncer, DebouncerConfig, RunnerConfig, TaskRunner, Work};
    pub use ngw_model::{RunOutcome, RunState, Severity, WorkKind};
}
