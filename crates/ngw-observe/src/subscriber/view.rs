use std::borrow::Borrow;

use ngw_model::{RunEvent, RunEventKind, RunMode};
use tracing::{debug, error, info, warn};

/// Read-only accessors over a [`RunEvent`] with defaults for absent fields.
pub trait View {
    fn as_task(&self) -> &str;
    fn as_reason(&self) -> &str;
    fn run(&self) -> u64;
    fn mode(&self) -> RunMode;
    fn elapsed_ms(&self) -> u64;
    fn timeout_ms(&self) -> u64;
    fn kind(&self) -> RunEventKind;
}

impl<T> View for T
where
    T: Borrow<RunEvent>,
{
    #[inline]
    fn as_task(&self) -> &str {
        let task = self.borrow().task.as_str();
        if task.is_empty() { "unknown" } else { task }
    }
    #[inline]
    fn as_reason(&self) -> &str {
        self.borrow().reason.as_deref().unwrap_or("unknown")
    }
    #[inline]
    fn run(&self) -> u64 {
        self.borrow().run
    }
    #[inline]
    fn mode(&self) -> RunMode {
        self.borrow().mode
    }
    #[inline]
    fn elapsed_ms(&self) -> u64 {
        self.borrow().elapsed_ms.unwrap_or(0)
    }
    #[inline]
    fn timeout_ms(&self) -> u64 {
        self.borrow().timeout_ms.unwrap_or(0)
    }
    #[inline]
    fn kind(&self) -> RunEventKind {
        self.borrow().kind
    }
}

#[inline]
pub fn message_for(kind: RunEventKind) -> &'static str {
    match kind {
        // lifecycle
        RunEventKind::TaskStarting => "task is starting",
        RunEventKind::TaskSucceeded => "task finished successfully",
        RunEventKind::TaskFailed => "task failed with an error",
        RunEventKind::TimeoutHit => "task exceeded its configured timeout",
        RunEventKind::TaskCancelled => "task cancelled (superseded or cancel requested)",

        // abnormal
        RunEventKind::TaskInterrupted => "task ended before its outcome was recorded",
        RunEventKind::InvalidUsage => "work rejected by the runner entry point",
    }
}

#[inline]
pub fn log_event<E: View>(e: E) {
    let msg = message_for(e.kind());
    let mode = e.mode().as_str();

    match e.kind() {
        // lifecycle
        RunEventKind::TaskStarting => {
            info!(task = e.as_task(), run = e.run(), mode, timeout_ms = e.timeout_ms(), "{msg}")
        }
        RunEventKind::TaskSucceeded => {
            debug!(task = e.as_task(), run = e.run(), elapsed_ms = e.elapsed_ms(), "{msg}")
        }
        RunEventKind::TaskCancelled => {
            debug!(task = e.as_task(), run = e.run(), elapsed_ms = e.elapsed_ms(), "{msg}")
        }
        RunEventKind::TimeoutHit => {
            warn!(task = e.as_task(), run = e.run(), timeout_ms = e.timeout_ms(), "{msg}")
        }
        RunEventKind::TaskFailed => error!(
            task = e.as_task(),
            run = e.run(),
            elapsed_ms = e.elapsed_ms(),
            reason = e.as_reason(),
            "{msg}"
        ),

        // abnormal
        RunEventKind::TaskInterrupted => {
            warn!(task = e.as_task(), run = e.run(), elapsed_ms = e.elapsed_ms(), "{msg}")
        }
        RunEventKind::InvalidUsage => {
            error!(task = e.as_task(), mode, reason = e.as_reason(), "{msg}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_falls_back_for_missing_fields() {
        let ev = RunEvent::new(RunEventKind::TaskFailed, "", 3, RunMode::Blocking);
        assert_eq!(ev.as_task(), "unknown");
        assert_eq!(ev.as_reason(), "unknown");
        assert_eq!(ev.elapsed_ms(), 0);
        assert_eq!(View::run(&ev), 3);
    }

    #[test]
    fn view_reads_through_references() {
        let ev = RunEvent::new(RunEventKind::TimeoutHit, "export", 1, RunMode::Async)
            .with_timeout_ms(200)
            .with_reason("slow disk");
        let by_ref: &RunEvent = &ev;
        assert_eq!(View::timeout_ms(&by_ref), 200);
        assert_eq!(by_ref.as_reason(), "slow disk");
    }

    #[test]
    fn every_kind_has_a_message() {
        for kind in [
            RunEventKind::TaskStarting,
            RunEventKind::TaskSucceeded,
            RunEventKind::TaskFailed,
            RunEventKind::TimeoutHit,
            RunEventKind::TaskCancelled,
            RunEventKind::TaskInterrupted,
            RunEventKind::InvalidUsage,
        ] {
            assert!(!message_for(kind).is_empty());
        }
    }
}
