mod severity;
pub use severity::Severity;

mod log_entry;
pub use log_entry::LogEntry;

mod work_kind;
pub use work_kind::{Bound, RunMode, WorkKind};

mod run_outcome;
pub use run_outcome::RunOutcome;

mod run_state;
pub use run_state::RunState;

mod run_event;
pub use run_event::{RunEvent, RunEventKind};

/// Timeout value in milliseconds.
///
/// Used in runner configuration and run events where an explicit time limit is required.
pub type TimeoutMs = u64;

/// Converts `d` to whole milliseconds, rounding sub-millisecond remainders up
/// and saturating at `u64::MAX`.
pub fn millis_ceil(d: std::time::Duration) -> TimeoutMs {
    TimeoutMs::try_from(d.as_nanos().div_ceil(1_000_000)).unwrap_or(TimeoutMs::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn sub_millisecond_rounds_up() {
        assert_eq!(millis_ceil(Duration::from_micros(1)), 1);
        assert_eq!(millis_ceil(Duration::from_micros(1500)), 2);
        assert_eq!(millis_ceil(Duration::ZERO), 0);
        assert_eq!(millis_ceil(Duration::from_millis(330)), 330);
    }

    #[test]
    fn huge_durations_saturate() {
        assert_eq!(millis_ceil(Duration::MAX), u64::MAX);
    }
}
