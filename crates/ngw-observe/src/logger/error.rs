use thiserror::Error;
use tracing_subscriber::util::TryInitError;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?}, expected text, json or journald")]
    InvalidFormat(String),
    #[error("journald output needs linux and the `journald` feature")]
    JournaldNotSupported,
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
    #[error("logger setup failed: {0}")]
    InitializationFailed(String),
    #[error("invalid level directive {0:?}")]
    InvalidLogLevel(String),
}

impl From<TryInitError> for LoggerError {
    fn from(e: TryInitError) -> Self {
        let s = e.to_string();
        if s.contains("SetGlobalDefaultError") || s.contains("already been set") {
            LoggerError::AlreadyInitialized
        } else {
            LoggerError::InitializationFailed(s)
        }
    }
}
