use ngw_model::{RunMode, WorkKind};
use thiserror::Error;

/// Errors raised synchronously to the caller of a runner or debouncer.
///
/// Timeouts, cancellations and work failures never show up here: they are
/// recorded in the outcome log of the run that produced them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    #[error(
        "invalid usage: {entry} expects {expected} work, got {actual} work \"{task}\"",
        entry = .mode.as_str(),
        expected = .mode.accepts().as_str(),
        actual = .got.as_str()
    )]
    InvalidUsage {
        mode: RunMode,
        got: WorkKind,
        task: String,
    },
    #[error("no tokio runtime available to schedule \"{0}\"")]
    NoRuntime(String),
}

impl RunnerError {
    /// Short label; matches [`RunEventKind::error_kind`] of the event a rejected run emits.
    ///
    /// [`RunEventKind::error_kind`]: ngw_model::RunEventKind::error_kind
    pub fn kind(&self) -> &'static str {
        match self {
            RunnerError::InvalidUsage { .. } => "invalid_usage",
            RunnerError::NoRuntime(_) => "no_runtime",
        }
    }
}

pub type RunnerResult<T = ()> = Result<T, RunnerError>;
