use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Progress indicator a runner resets on start and fills on completion.
pub trait ProgressSink: Send + Sync + 'static {
    fn reset(&self);
    fn update(&self, step: u64);
    /// Sets progress to its maximum.
    fn finish(&self);
    fn set_description(&self, desc: &str);
}

/// In-memory progress counter for a UI to poll.
#[derive(Debug)]
pub struct ProgressBar {
    total: u64,
    value: AtomicU64,
    description: Mutex<String>,
    unit: String,
}

impl ProgressBar {
    pub fn new(total: u64, description: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            total,
            value: AtomicU64::new(0),
            description: Mutex::new(description.into()),
            unit: unit.into(),
        }
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    pub fn description(&self) -> String {
        self.description.lock().clone()
    }

    #[inline]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Completed fraction in `0.0..=1.0`; a zero total counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.value() as f64 / self.total as f64).min(1.0)
    }
}

impl ProgressSink for ProgressBar {
    fn reset(&self) {
        self.value.store(0, Ordering::Release);
    }

    fn update(&self, step: u64) {
        let total = self.total;
        let _ = self
            .value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                Some(v.saturating_add(step).min(total))
            });
    }

    fn finish(&self) {
        self.value.store(self.total, Ordering::Release);
    }

    fn set_description(&self, desc: &str) {
        *self.description.lock() = desc.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_is_clamped_to_total() {
        let bar = ProgressBar::new(10, "indexing", "files");
        bar.update(4);
        assert_eq!(bar.value(), 4);
        assert!((bar.fraction() - 0.4).abs() < f64::EPSILON);

        bar.update(100);
        assert_eq!(bar.value(), 10);
    }

    #[test]
    fn finish_and_reset() {
        let bar = ProgressBar::new(5, "", "steps");
        bar.finish();
        assert_eq!(bar.value(), 5);
        bar.reset();
        assert_eq!(bar.value(), 0);
    }

    #[test]
    fn description_can_change() {
        let bar = ProgressBar::new(1, "loading", "items");
        bar.set_description("parsing");
        assert_eq!(bar.description(), "parsing");
        assert_eq!(bar.unit(), "items");
    }

    #[test]
    fn zero_total_is_done() {
        assert_eq!(ProgressBar::new(0, "", "").fraction(), 1.0);
    }
}
