use serde::{Deserialize, Serialize};

/// How a finished run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunOutcome {
    /// Work returned `Ok`.
    Succeeded,
    /// Work exceeded the runner timeout.
    TimedOut,
    /// Run was superseded by a newer run or cancelled explicitly.
    Cancelled,
    /// Work returned an error.
    Failed,
}

impl RunOutcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Succeeded => "succeeded",
            RunOutcome::TimedOut => "timeout",
            RunOutcome::Cancelled => "cancelled",
            RunOutcome::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_succeeded_is_success() {
        assert!(RunOutcome::Succeeded.is_success());
        assert!(!RunOutcome::TimedOut.is_success());
        assert!(!RunOutcome::Cancelled.is_success());
        assert!(!RunOutcome::Failed.is_success());
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_string(&RunOutcome::TimedOut).unwrap();
        assert_eq!(json, r#""timedOut""#);
    }
}
