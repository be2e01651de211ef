use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

/// Builds the filter and output layer for `cfg` and installs them globally.
pub(super) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let registry = tracing_subscriber::registry().with(level_filter(&cfg.level)?);

    match cfg.format {
        LoggerFormat::Text => {
            let layer = fmt::layer()
                .with_ansi(cfg.use_color)
                .with_target(cfg.with_targets)
                .with_timer(local_timer());
            registry.with(layer).try_init()?;
        }
        LoggerFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(cfg.with_targets)
                .with_current_span(true)
                .with_timer(local_timer());
            registry.with(layer).try_init()?;
        }
        LoggerFormat::Journald => {
            registry.with(journald_layer()?).try_init()?;
        }
    }
    Ok(())
}

fn level_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(level).map_err(|_| LoggerError::InvalidLogLevel(level.to_string()))
}

/// RFC 3339 timestamps in the local offset, UTC when it cannot be read.
fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald_layer() -> Result<tracing_journald::Layer, LoggerError> {
    tracing_journald::layer()
        .map(|layer| layer.with_syslog_identifier("ngw".to_string()))
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald_layer() -> Result<tracing_subscriber::layer::Identity, LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}
