use serde::{Deserialize, Serialize};

use crate::{RunMode, RunOutcome, TimeoutMs};

/// Runner lifecycle transition delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunEventKind {
    TaskStarting,
    TaskSucceeded,
    TaskFailed,
    TimeoutHit,
    TaskCancelled,
    /// Run task ended before its outcome could be recorded.
    TaskInterrupted,
    /// Entry point rejected work of the wrong kind.
    InvalidUsage,
}

impl RunEventKind {
    /// Maps a finished run's outcome to its event kind.
    pub fn from_outcome(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Succeeded => RunEventKind::TaskSucceeded,
            RunOutcome::TimedOut => RunEventKind::TimeoutHit,
            RunOutcome::Cancelled => RunEventKind::TaskCancelled,
            RunOutcome::Failed => RunEventKind::TaskFailed,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunEventKind::TaskStarting | RunEventKind::InvalidUsage)
    }

    /// Outcome carried by a finalized run's event; `None` for the other kinds.
    pub fn outcome(&self) -> Option<RunOutcome> {
        match self {
            RunEventKind::TaskSucceeded => Some(RunOutcome::Succeeded),
            RunEventKind::TimeoutHit => Some(RunOutcome::TimedOut),
            RunEventKind::TaskCancelled => Some(RunOutcome::Cancelled),
            RunEventKind::TaskFailed => Some(RunOutcome::Failed),
            RunEventKind::TaskStarting
            | RunEventKind::TaskInterrupted
            | RunEventKind::InvalidUsage => None,
        }
    }

    /// Error label for kinds that report a runner fault.
    pub fn error_kind(&self) -> Option<&'static str> {
        match self {
            RunEventKind::InvalidUsage => Some("invalid_usage"),
            RunEventKind::TaskInterrupted => Some("interrupted"),
            _ => None,
        }
    }
}

/// Event emitted by a runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEvent {
    pub kind: RunEventKind,
    /// Task name of the run.
    pub task: String,
    /// Per-runner run sequence number (starts at 1).
    pub run: u64,
    pub mode: RunMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<TimeoutMs>,
}

impl RunEvent {
    pub fn new(kind: RunEventKind, task: impl Into<String>, run: u64, mode: RunMode) -> Self {
        Self {
            kind,
            task: task.into(),
            run,
            mode,
            reason: None,
            elapsed_ms: None,
            timeout_ms: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = Some(elapsed_ms);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: TimeoutMs) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_maps_to_terminal_kind() {
        for outcome in [
            RunOutcome::Succeeded,
            RunOutcome::TimedOut,
            RunOutcome::Cancelled,
            RunOutcome::Failed,
        ] {
            assert!(RunEventKind::from_outcome(outcome).is_terminal());
        }
        assert!(!RunEventKind::TaskStarting.is_terminal());
    }

    #[test]
    fn outcome_round_trips_through_kind() {
        for outcome in [
            RunOutcome::Succeeded,
            RunOutcome::TimedOut,
            RunOutcome::Cancelled,
            RunOutcome::Failed,
        ] {
            assert_eq!(RunEventKind::from_outcome(outcome).outcome(), Some(outcome));
        }
        assert_eq!(RunEventKind::TaskInterrupted.outcome(), None);
        assert!(RunEventKind::TaskInterrupted.is_terminal());
    }

    #[test]
    fn only_faults_have_an_error_kind() {
        assert_eq!(RunEventKind::InvalidUsage.error_kind(), Some("invalid_usage"));
        assert_eq!(RunEventKind::TaskInterrupted.error_kind(), Some("interrupted"));
        assert_eq!(RunEventKind::TaskFailed.error_kind(), None);
    }

    #[test]
    fn optional_fields_are_skipped() {
        let event = RunEvent::new(RunEventKind::TaskStarting, "reindex", 1, RunMode::Blocking);
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("reason"));
        assert!(!json.contains("elapsedMs"));

        let event = event.with_reason("boom").with_timeout_ms(200);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""reason":"boom""#));
        assert!(json.contains(r#""timeoutMs":200"#));
    }
}
