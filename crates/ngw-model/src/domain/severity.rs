use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of an outcome log entry.
///
/// Each level has an icon used as the message prefix and a short level name
/// used for per-level counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Error, Severity::Warn, Severity::Info];

    #[inline]
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Info => "✅",
            Severity::Warn => "⚠️",
            Severity::Error => "❌",
        }
    }

    #[inline]
    pub fn level_name(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }

    /// Maps an icon back to its severity. Unknown icons are treated as `Info`.
    pub fn from_icon(icon: &str) -> Self {
        match icon.trim() {
            "❌" => Severity::Error,
            "⚠️" | "⚠" => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.level_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icons_map_back_to_severity() {
        for level in Severity::ALL {
            assert_eq!(Severity::from_icon(level.icon()), level);
        }
    }

    #[test]
    fn unknown_icon_is_info() {
        assert_eq!(Severity::from_icon("🔥"), Severity::Info);
        assert_eq!(Severity::from_icon(""), Severity::Info);
    }

    #[test]
    fn level_names() {
        assert_eq!(Severity::Error.level_name(), "error");
        assert_eq!(Severity::Warn.to_string(), "warn");
    }
}
