use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::logger::error::LoggerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggerFormat {
    #[default]
    Text,
    Json,
    Journald,
}

impl FromStr for LoggerFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "text" => Ok(LoggerFormat::Text),
            "json" => Ok(LoggerFormat::Json),
            "journald" | "journal" => {
                #[cfg(all(target_os = "linux", feature = "journald"))]
                {
                    Ok(LoggerFormat::Journald)
                }

                #[cfg(not(all(target_os = "linux", feature = "journald")))]
                {
                    Err(LoggerError::JournaldNotSupported)
                }
            }
            _ => Err(LoggerError::InvalidFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_and_whitespace_insensitively() {
        assert_eq!(" Text ".parse::<LoggerFormat>().unwrap(), LoggerFormat::Text);
        assert_eq!("JSON".parse::<LoggerFormat>().unwrap(), LoggerFormat::Json);
    }

    #[test]
    fn rejects_unknown_format() {
        let err = "yaml".parse::<LoggerFormat>().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidFormat(ref s) if s == "yaml"));
    }

    #[cfg(not(all(target_os = "linux", feature = "journald")))]
    #[test]
    fn journald_needs_the_feature() {
        let err = "journal".parse::<LoggerFormat>().unwrap_err();
        assert!(matches!(err, LoggerError::JournaldNotSupported));
    }
}
