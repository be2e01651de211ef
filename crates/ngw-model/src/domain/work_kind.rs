use serde::{Deserialize, Serialize};

/// How a unit of work executes.
///
/// Callers tag their work explicitly; mode-specific entry points reject the wrong tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkKind {
    /// A future polled on the caller's runtime.
    Async,
    /// A synchronous closure that must be offloaded to a worker pool.
    Blocking,
}

impl WorkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkKind::Async => "async",
            WorkKind::Blocking => "blocking",
        }
    }
}

/// Which worker pool blocking work is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bound {
    #[default]
    Io,
    Cpu,
}

/// Runner entry point that launched a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunMode {
    Async,
    Blocking,
    AsyncWrappingBlocking,
}

impl RunMode {
    /// Short label, used for logging and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Async => "async",
            RunMode::Blocking => "blocking",
            RunMode::AsyncWrappingBlocking => "async_wrapping_blocking",
        }
    }

    /// Work kind accepted by this mode.
    pub fn accepts(&self) -> WorkKind {
        match self {
            RunMode::Async | RunMode::AsyncWrappingBlocking => WorkKind::Async,
            RunMode::Blocking => WorkKind::Blocking,
        }
    }
}
