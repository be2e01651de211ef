use std::time::{Duration, SystemTime};

use ngw_model::{RunMode, RunOutcome, RunState};
use time::{OffsetDateTime, UtcOffset, macros::format_description};
use tokio::{task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;

/// Point in time, both monotonic (for elapsed) and wall-clock (for display).
#[derive(Debug, Clone, Copy)]
pub(super) struct Stamp {
    pub at: Instant,
    pub wall: SystemTime,
}

impl Stamp {
    pub fn now() -> Self {
        Self {
            at: Instant::now(),
            wall: SystemTime::now(),
        }
    }
}

pub(super) struct ActiveRun {
    pub run: u64,
    pub token: CancellationToken,
    pub handle: JoinHandle<()>,
}

/// Mutable part of a runner. Only ever touched under its mutex.
#[derive(Default)]
pub(super) struct RunnerState {
    pub current: Option<ActiveRun>,
    pub task_name: Option<String>,
    pub mode: Option<RunMode>,
    pub start: Option<Stamp>,
    pub stop: Option<Stamp>,
    /// Set when the current run's task ended without recording a stop.
    pub interrupted: Option<Stamp>,
    pub last_outcome: Option<RunOutcome>,
}

impl RunnerState {
    #[inline]
    pub fn is_current(&self, run: u64) -> bool {
        self.current.as_ref().is_some_and(|c| c.run == run)
    }

    pub fn is_running(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|c| !c.handle.is_finished())
    }

    pub fn state(&self) -> RunState {
        match (&self.start, &self.stop) {
            (None, _) => RunState::Ready,
            (Some(_), Some(_)) => RunState::Completed,
            (Some(_), None) if self.is_running() => RunState::Running,
            (Some(_), None) => RunState::Interrupted,
        }
    }

    pub fn elapsed(&self) -> Duration {
        let Some(start) = self.start else {
            return Duration::ZERO;
        };
        match (self.stop, self.interrupted) {
            (Some(stop), _) => stop.at.saturating_duration_since(start.at),
            (None, Some(cut)) if !self.is_running() => cut.at.saturating_duration_since(start.at),
            _ => start.at.elapsed(),
        }
    }

    pub fn status(&self) -> String {
        let name = self.task_name.as_deref().unwrap_or("");
        let elapsed = self.elapsed().as_secs_f64();

        match (self.state(), self.start, self.stop) {
            (RunState::Running, Some(start), _) => {
                format!("Running \"{name}\" for {elapsed:.2}s since {}", clock(start.wall))
            }
            (RunState::Completed, Some(start), Some(stop)) => format!(
                "Completed \"{name}\" in {elapsed:.2}s ({}-{})",
                clock(start.wall),
                clock(stop.wall)
            ),
            (RunState::Interrupted, Some(start), _) => {
                format!("Interrupted \"{name}\" after {elapsed:.2}s from {}", clock(start.wall))
            }
            _ => RunState::Ready.label().to_string(),
        }
    }
}

/// `HH:MM:SS` in the local offset, UTC when the offset cannot be determined.
pub(super) fn clock(t: SystemTime) -> String {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::from(t)
        .to_offset(offset)
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| "--:--:--".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_ready() {
        let st = RunnerState::default();
        assert_eq!(st.state(), RunState::Ready);
        assert_eq!(st.status(), "Ready");
        assert_eq!(st.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn recorded_stop_reads_as_completed() {
        let start = Stamp::now();
        tokio::time::advance(Duration::from_millis(1500)).await;
        let stop = Stamp::now();

        let st = RunnerState {
            task_name: Some("export".into()),
            start: Some(start),
            stop: Some(stop),
            ..Default::default()
        };

        assert_eq!(st.state(), RunState::Completed);
        assert_eq!(st.elapsed(), Duration::from_millis(1500));
        assert!(st.status().starts_with("Completed \"export\" in 1.50s ("));
    }

    #[tokio::test(start_paused = true)]
    async fn start_without_task_or_stop_reads_as_interrupted() {
        let start = Stamp::now();
        tokio::time::advance(Duration::from_millis(250)).await;

        let st = RunnerState {
            task_name: Some("export".into()),
            start: Some(start),
            interrupted: Some(Stamp::now()),
            ..Default::default()
        };

        assert_eq!(st.state(), RunState::Interrupted);
        assert!(st.status().starts_with("Interrupted \"export\" after 0.25s from "));
    }

    #[test]
    fn clock_is_hh_mm_ss() {
        let s = clock(SystemTime::now());
        assert_eq!(s.len(), 8);
        assert_eq!(s.as_bytes()[2], b':');
        assert_eq!(s.as_bytes()[5], b':');
    }
}
