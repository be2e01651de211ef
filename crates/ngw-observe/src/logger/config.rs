use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::format::LoggerFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `info` or `ngw.core.runner=debug,info`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || std::io::stdout().is_terminal();
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: LoggerConfig = serde_json::from_str(r#"{"level":"debug","withTargets":false}"#).unwrap();
        assert_eq!(cfg.format, LoggerFormat::Text);
        assert_eq!(cfg.level, "debug");
        assert!(!cfg.with_targets);
        assert!(cfg.use_color);
    }

    #[test]
    fn format_is_lowercase_in_config() {
        let cfg: LoggerConfig = serde_json::from_str(r#"{"format":"json"}"#).unwrap();
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert_eq!(cfg.level, "info");
    }
}
