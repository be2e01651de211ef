use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use tracing::info;

use ngw_core::{DebounceHooks, Debouncer, DebouncerConfig, ProgressBar, ProgressSink, TaskRunner, Work};
use ngw_model::Severity;
use ngw_observe::{Journal, LoggerConfig, logger_init};
use ngw_prometheus::PrometheusMetrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Logger
    let cfg = LoggerConfig {
        level: "ngw.core=debug,info".to_string(),
        ..Default::default()
    };
    logger_init(&cfg)?;
    info!("logger initialized");

    // 2) Runner with journal + metrics subscribers
    let metrics = Arc::new(PrometheusMetrics::new()?);
    let progress = Arc::new(ProgressBar::new(5, "import", "files"));
    let runner = TaskRunner::with_timeout(Duration::from_millis(800))
        .with_progress(progress.clone())
        .with_subscriber(Arc::new(Journal::new()))
        .with_subscriber(metrics.clone());

    // 3) Async import that reports progress
    let bar = progress.clone();
    runner.run(
        Work::future(move || async move {
            for _ in 0..5 {
                tokio::time::sleep(Duration::from_millis(50)).await;
                bar.update(1);
            }
            Ok(())
        })
        .named("import"),
    )?;
    info!(status = %runner.get_status(), "import submitted");
    tokio::time::sleep(Duration::from_millis(400)).await;
    info!(status = %runner.get_status(), progress = progress.fraction(), "import done");

    // 4) Blocking job that overruns the timeout
    runner.run_blocking(
        Work::blocking(|| {
            std::thread::sleep(Duration::from_millis(1200));
            Ok(())
        })
        .named("checksum"),
    )?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    info!(
        status = %runner.get_status(),
        ok = runner.last_outcome().is_some_and(|o| o.is_success()),
        "after timeout"
    );

    // 5) Debounced refresh: a burst of five requests runs once
    let refreshed = Arc::new(AtomicU32::new(0));
    let debouncer = Debouncer::new(DebouncerConfig::new(Duration::from_millis(330)).with_task_name("refresh"));
    for i in 0..5 {
        let hits = refreshed.clone();
        debouncer.debounce_with(
            Work::future(move || async move {
                hits.fetch_add(1, Ordering::SeqCst);
                info!(request = i, "refresh executed");
                Ok(())
            }),
            DebounceHooks::new().on_done(move || info!(request = i, "refresh finished")),
        )?;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(Duration::from_millis(500)).await;
    info!(executed = refreshed.load(Ordering::SeqCst), calls = debouncer.calls(), "debounce burst settled");

    // 6) Report
    let log = runner.log_handle();
    let (errors, summary) = log.lock().level_summary(Severity::Error, 5);
    info!(errors, "{summary}");
    print!("{}", metrics.encode()?);

    Ok(())
}
