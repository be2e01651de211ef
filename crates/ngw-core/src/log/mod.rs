use std::{collections::BTreeMap, sync::Arc};

use ngw_model::{LogEntry, Severity};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

/// Log shared between a runner and its embedder.
pub type SharedLog = Arc<Mutex<Log>>;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to encode log: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode log: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Log {
    entries: Vec<LogEntry>,
    #[serde(skip)]
    counts: BTreeMap<Severity, BTreeMap<String, usize>>,
    #[serde(skip)]
    quiet: bool,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedLog {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Stops echoing entries to `tracing`.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Appends an entry.
    pub fn log(&mut self, level: Severity, kind: impl Into<String>, msg: impl AsRef<str>) {
        let entry = LogEntry::new(level, kind, msg);

        if !self.quiet {
            match level {
                Severity::Error => error!(target: "ngw.core.log", kind = %entry.kind, "{}", entry.msg),
                Severity::Warn => warn!(target: "ngw.core.log", kind = %entry.kind, "{}", entry.msg),
                Severity::Info => info!(target: "ngw.core.log", kind = %entry.kind, "{}", entry.msg),
            }
        }

        *self
            .counts
            .entry(level)
            .or_default()
            .entry(entry.kind.clone())
            .or_default() += 1;
        self.entries.push(entry);
    }

    /// Appends an entry whose severity is given by its icon (`❌`, `⚠️`, `✅`).
    pub fn log_icon(&mut self, icon: &str, kind: impl Into<String>, msg: impl AsRef<str>) {
        self.log(Severity::from_icon(icon), kind, msg);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.counts.clear();
    }

    #[inline]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of one kind, oldest first.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    pub fn count(&self, level: Severity, kind: &str) -> usize {
        self.counts
            .get(&level)
            .and_then(|kinds| kinds.get(kind))
            .copied()
            .unwrap_or(0)
    }

    pub fn level_count(&self, level: Severity) -> usize {
        self.counts
            .get(&level)
            .map(|kinds| kinds.values().sum())
            .unwrap_or(0)
    }

    /// Number of entries at `level` and a one-line summary of its most common kinds.
    ///
    /// Kinds are ordered by count (descending), ties by name; at most `limit` are listed.
    pub fn level_summary(&self, level: Severity, limit: usize) -> (usize, String) {
        let Some(kinds) = self.counts.get(&level).filter(|k| !k.is_empty()) else {
            return (0, format!("No entries found for level: {}", level.level_name()));
        };

        let mut ranked: Vec<(&String, &usize)> = kinds.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        let listed = ranked
            .iter()
            .take(limit)
            .map(|(kind, n)| format!("{kind}={n}"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut name = level.level_name().to_string();
        if let Some(first) = name.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        (self.level_count(level), format!("{name} entries: {listed}"))
    }

    pub fn to_json(&self) -> Result<String, LogError> {
        serde_json::to_string_pretty(self).map_err(LogError::Encode)
    }

    pub fn from_json(s: &str) -> Result<Self, LogError> {
        let mut log: Log = serde_json::from_str(s).map_err(LogError::Decode)?;
        log.rebuild_counts();
        Ok(log)
    }

    fn rebuild_counts(&mut self) {
        self.counts.clear();
        for entry in &self.entries {
            *self
                .counts
                .entry(entry.level)
                .or_default()
                .entry(entry.kind.clone())
                .or_default() += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Log {
        let mut log = Log::new().quiet();
        log.log(Severity::Error, "timeout", "Task \"a\" timed out");
        log.log(Severity::Error, "timeout", "Task \"b\" timed out");
        log.log(Severity::Error, "exception", "boom");
        log.log(Severity::Warn, "cancelled", "Task \"c\" cancelled");
        log
    }

    #[test]
    fn counts_follow_appends() {
        let log = sample();
        assert_eq!(log.len(), 4);
        assert_eq!(log.count(Severity::Error, "timeout"), 2);
        assert_eq!(log.count(Severity::Error, "exception"), 1);
        assert_eq!(log.count(Severity::Warn, "timeout"), 0);
        assert_eq!(log.level_count(Severity::Error), 3);
        assert_eq!(log.of_kind("cancelled").count(), 1);
    }

    #[test]
    fn icon_selects_severity() {
        let mut log = Log::new().quiet();
        log.log_icon("⚠️", "cancelled", "stopped");
        log.log_icon("?", "note", "hello");

        assert_eq!(log.entries()[0].level, Severity::Warn);
        assert_eq!(log.entries()[0].msg, "⚠️:stopped");
        assert_eq!(log.entries()[1].level, Severity::Info);
    }

    #[test]
    fn summary_lists_most_common_first() {
        let log = sample();

        let (count, msg) = log.level_summary(Severity::Error, 7);
        assert_eq!(count, 3);
        assert_eq!(msg, "Error entries: timeout=2, exception=1");

        let (count, msg) = log.level_summary(Severity::Error, 1);
        assert_eq!(count, 3);
        assert_eq!(msg, "Error entries: timeout=2");
    }

    #[test]
    fn summary_for_empty_level() {
        let log = sample();
        let (count, msg) = log.level_summary(Severity::Info, 7);
        assert_eq!(count, 0);
        assert_eq!(msg, "No entries found for level: info");
    }

    #[test]
    fn clear_resets_counts() {
        let mut log = sample();
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.level_count(Severity::Error), 0);
    }

    #[test]
    fn reload_rebuilds_counts() {
        let json = sample().to_json().unwrap();
        let log = Log::from_json(&json).unwrap();

        assert_eq!(log.len(), 4);
        assert_eq!(log.count(Severity::Error, "timeout"), 2);
        assert_eq!(log.count(Severity::Warn, "cancelled"), 1);
    }

    #[test]
    fn reload_rejects_garbage() {
        assert!(matches!(Log::from_json("{"), Err(LogError::Decode(_))));
    }
}
