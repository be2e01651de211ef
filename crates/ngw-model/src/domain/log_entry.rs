use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::Severity;

/// One record in an outcome log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Message prefixed with the severity icon (`"❌:task timed out"`).
    pub msg: String,
    /// Category of the entry (`timeout`, `cancelled`, `exception`, ...).
    pub kind: String,
    /// Severity level.
    pub level: Severity,
    /// When the entry was recorded.
    #[serde(with = "time_serde")]
    pub timestamp: SystemTime,
}

impl LogEntry {
    pub fn new(level: Severity, kind: impl Into<String>, msg: impl AsRef<str>) -> Self {
        Self {
            msg: format!("{}:{}", level.icon(), msg.as_ref()),
            kind: kind.into(),
            level,
            timestamp: SystemTime::now(),
        }
    }

    /// Message without the icon prefix.
    pub fn text(&self) -> &str {
        self.msg
            .strip_prefix(self.level.icon())
            .and_then(|rest| rest.strip_prefix(':'))
            .unwrap_or(&self.msg)
    }
}

mod time_serde {
    use std::time::SystemTime;

    use serde::{Deserialize, Deserializer, Serializer, de, ser};
    use time::{OffsetDateTime, format_description::well_known::Rfc3339};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = OffsetDateTime::from(*time)
            .format(&Rfc3339)
            .map_err(ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&text, &Rfc3339)
            .map(SystemTime::from)
            .map_err(de::Error::custom)
    }
}
