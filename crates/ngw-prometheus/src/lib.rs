//! Prometheus metrics backend for ngw background runners.
//!
//! This crate provides [`PrometheusMetrics`], an implementation of [`ngw_core::Subscribe`]
//! that turns runner lifecycle events into Prometheus metrics.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use ngw_core::TaskRunner;
//! use ngw_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = Arc::new(PrometheusMetrics::new()?);
//! let runner = TaskRunner::default().with_subscriber(metrics.clone());
//!
//! // Expose /metrics endpoint (example with custom HTTP server)
//! // let body = metrics.encode()?;
//! # drop(runner);
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `ngw_runs_started_total{mode}` - Counter
//! - `ngw_runs_completed_total{mode, outcome}` - Counter
//! - `ngw_run_duration_seconds{mode}` - Histogram
//! - `ngw_runner_errors_total{error_kind}` - Counter
//!
//! ## HTTP Server
//! This crate does NOT provide HTTP server for `/metrics` endpoint.
//! Use your application's existing HTTP framework and serve [`PrometheusMetrics::encode`].

mod backend;
pub use backend::{MetricsError, PrometheusMetrics};

pub use prometheus::{Encoder, Registry, TextEncoder};
