use std::time::Duration;

use ngw_model::millis_ceil;
use serde::{Deserialize, Serialize};

const DEFAULT_DELAY_MS: u64 = 330;
const DEFAULT_TASK_NAME: &str = "Debounce Task";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebouncerConfig {
    /// Quiet period before the surviving call runs, in milliseconds.
    pub delay_ms: u64,
    /// Send blocking work to the CPU pool instead of the I/O pool.
    pub cpu_bound: bool,
    /// Name used for tracing of the scheduled task.
    pub task_name: String,
    /// Skip the quiet period for the very first call on an instance.
    pub immediate_first: bool,
}

impl DebouncerConfig {
    /// `delay` is kept at millisecond resolution, rounded up.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay_ms: millis_ceil(delay),
            ..Default::default()
        }
    }

    pub fn with_cpu_bound(mut self, cpu_bound: bool) -> Self {
        self.cpu_bound = cpu_bound;
        self
    }

    pub fn with_task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = name.into();
        self
    }

    pub fn with_immediate_first(mut self, immediate: bool) -> Self {
        self.immediate_first = immediate;
        self
    }

    #[inline]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for DebouncerConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            cpu_bound: false,
            task_name: DEFAULT_TASK_NAME.to_string(),
            immediate_first: false,
        }
    }
}
