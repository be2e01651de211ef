use serde::{Deserialize, Serialize};

/// Observable state of a runner, as rendered by its status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    /// Nothing has been started (or timing was cleared by an explicit cancel).
    Ready,
    /// A run is in flight.
    Running,
    /// The last run recorded a stop time, whatever its outcome.
    Completed,
    /// The last run ended without recording a stop time.
    Interrupted,
}

impl RunState {
    pub fn label(&self) -> &'static str {
        match self {
            RunState::Ready => "Ready",
            RunState::Running => "Running",
            RunState::Completed => "Completed",
            RunState::Interrupted => "Interrupted",
        }
    }
}
