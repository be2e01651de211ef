use ngw_core::Subscribe;
use ngw_model::{RunEvent, RunEventKind};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};
use thiserror::Error;

const DURATION_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.33, 1.0, 2.5, 5.0, 10.0, 20.0, 60.0];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("metrics text is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Runner metrics registered in their own [`Registry`].
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    started: IntCounterVec,
    completed: IntCounterVec,
    duration: HistogramVec,
    errors: IntCounterVec,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new())
    }

    /// Registers the runner metrics into an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Self, MetricsError> {
        let started = IntCounterVec::new(
            Opts::new("ngw_runs_started_total", "Runs accepted by a task runner"),
            &["mode"],
        )?;
        let completed = IntCounterVec::new(
            Opts::new("ngw_runs_completed_total", "Runs that reached an outcome"),
            &["mode", "outcome"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new("ngw_run_duration_seconds", "Wall time of finished runs")
                .buckets(DURATION_BUCKETS.to_vec()),
            &["mode"],
        )?;
        let errors = IntCounterVec::new(
            Opts::new("ngw_runner_errors_total", "Misuse and interrupted runs"),
            &["error_kind"],
        )?;

        registry.register(Box::new(started.clone()))?;
        registry.register(Box::new(completed.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        registry.register(Box::new(errors.clone()))?;

        Ok(Self {
            registry,
            started,
            completed,
            duration,
            errors,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Current metrics in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

impl Subscribe for PrometheusMetrics {
    fn on_event(&self, event: &RunEvent) {
        let mode = event.mode.as_str();
        let kind = event.kind;

        if kind == RunEventKind::TaskStarting {
            self.started.with_label_values(&[mode]).inc();
        }
        if let Some(error_kind) = kind.error_kind() {
            self.errors.with_label_values(&[error_kind]).inc();
        }
        if !kind.is_terminal() {
            return;
        }

        let outcome = kind
            .outcome()
            .map(|o| o.as_str())
            .or(kind.error_kind())
            .unwrap_or("unknown");
        self.completed.with_label_values(&[mode, outcome]).inc();
        if let Some(ms) = event.elapsed_ms {
            self.duration
                .with_label_values(&[mode])
                .observe(ms as f64 / 1000.0);
        }
    }

    fn name(&self) -> &'static str {
        "prometheus"
    }
}
