// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `fwdd serve` and `fwdd check` command implementations.
//!
//! `serve` wires the input manager from configuration, drains the shared
//! pipeline, starts every source and runs until a shutdown signal arrives.
//! Forwarding events onward is outside this binary; the drain task only logs
//! and counts what the sources deliver.

use fwdd_config::FwddConfig;
use fwdd_core::{Event, FwddError};
use fwdd_input::{FactoryTable, InputManager, LifecycleReport};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::shutdown;

/// Run the daemon until SIGINT or SIGTERM.
pub async fn run_serve(config: FwddConfig) -> Result<(), FwddError> {
    init_tracing(&config.daemon.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting fwdd serve");

    let manager = InputManager::from_config(&config.input, &FactoryTable::builtin())?;
    let shutdown = shutdown::install_signal_handler();

    run_until(manager, config.input.abort_on_start_failure, shutdown).await
}

/// Build the manager and print the sources it would start.
pub fn run_check(config: &FwddConfig) -> Result<(), FwddError> {
    let manager = InputManager::from_config(&config.input, &FactoryTable::builtin())?;
    for line in describe_sources(&manager) {
        println!("{line}");
    }
    println!(
        "fwdd: configuration ok ({} source(s), pipeline capacity {})",
        manager.len(),
        manager.pipeline().capacity()
    );
    Ok(())
}

fn describe_sources(manager: &InputManager) -> Vec<String> {
    manager
        .registry()
        .iter()
        .map(|entry| format!("{}\t{}", entry.identity(), entry.source().plugin_type()))
        .collect()
}

/// Start the manager, wait for `shutdown`, then stop it.
///
/// When any source fails to start and `abort_on_start_failure` is set, the
/// sources that did start are stopped and the start failure is returned.
pub(crate) async fn run_until(
    mut manager: InputManager,
    abort_on_start_failure: bool,
    shutdown: CancellationToken,
) -> Result<(), FwddError> {
    let rx = manager
        .pipeline()
        .take_receiver()
        .ok_or_else(|| FwddError::Internal("pipeline receiver already taken".to_string()))?;
    let drain_cancel = CancellationToken::new();
    let drain = tokio::spawn(drain_pipeline(rx, drain_cancel.clone()));

    let start_report = manager.start().await?;
    if !start_report.is_success() {
        if abort_on_start_failure {
            error!(
                failed = ?start_report.failed(),
                "input sources failed to start, shutting down"
            );
            let stop_report = manager.stop().await?;
            log_stop_report(&stop_report);
            finish_drain(drain, drain_cancel).await;
            return start_report.into_result();
        }
        warn!(
            failed = ?start_report.failed(),
            running = manager.running().len(),
            "running degraded: some input sources failed to start"
        );
    }

    info!(sources = manager.running().len(), "fwdd serving, waiting for shutdown signal");
    shutdown.cancelled().await;

    let stop_report = manager.stop().await?;
    log_stop_report(&stop_report);
    finish_drain(drain, drain_cancel).await;
    stop_report.into_result()
}

fn log_stop_report(report: &LifecycleReport) {
    for (identity, e) in report.failures() {
        warn!(identity = %identity, error = %e, "input source did not stop cleanly");
    }
    info!(
        stopped = report.succeeded().len(),
        failed = report.failed().len(),
        "input manager stopped"
    );
}

async fn finish_drain(drain: tokio::task::JoinHandle<u64>, cancel: CancellationToken) {
    cancel.cancel();
    match drain.await {
        Ok(events) => info!(events, "pipeline drained"),
        Err(e) => error!(error = %e, "pipeline drain task failed"),
    }
}

/// Consume events until cancelled, then take whatever is still buffered.
///
/// Returns the number of events consumed.
async fn drain_pipeline(mut rx: mpsc::Receiver<Event>, cancel: CancellationToken) -> u64 {
    let mut count = 0u64;
    loop {
        tokio::select! {
            biased;
            event = rx.recv() => match event {
                Some(event) => {
                    log_event(&event);
                    count += 1;
                }
                None => break,
            },
            _ = cancel.cancelled() => break,
        }
    }
    while let Ok(event) = rx.try_recv() {
        log_event(&event);
        count += 1;
    }
    count
}

fn log_event(event: &Event) {
    debug!(
        key = %event.key,
        value = ?event.value,
        host = ?event.host,
        tags = ?event.tags,
        "event received"
    );
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fwdd={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use fwdd_core::{Identity, InboundPipeline, LifecyclePhase, PluginType};
    use fwdd_input::SourceRegistry;
    use fwdd_test_utils::{MockCounters, MockSource};

    fn manager(sources: Vec<MockSource>, pipeline: Arc<InboundPipeline>) -> InputManager {
        let mut builder = SourceRegistry::builder();
        for (i, source) in sources.into_iter().enumerate() {
            builder.register(Identity::ordinal(i), Arc::new(source)).unwrap();
        }
        InputManager::new(builder.build(), pipeline).unwrap()
    }

    fn three_sources(
        pipeline: &Arc<InboundPipeline>,
        failing: usize,
    ) -> (Vec<MockSource>, Vec<MockCounters>) {
        let sources: Vec<MockSource> = (0..3)
            .map(|i| {
                let source = MockSource::new(Identity::ordinal(i), Arc::clone(pipeline));
                if i == failing {
                    source.failing_start("address in use")
                } else {
                    source
                }
            })
            .collect();
        let counters = sources.iter().map(|s| s.counters()).collect();
        (sources, counters)
    }

    #[tokio::test]
    async fn start_failure_aborts_and_stops_survivors() {
        let pipeline = Arc::new(InboundPipeline::default());
        let (sources, counters) = three_sources(&pipeline, 1);
        let manager = manager(sources, pipeline);

        let err = run_until(manager, true, CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            FwddError::PartialFailure { phase, failed } => {
                assert_eq!(phase, LifecyclePhase::Start);
                assert_eq!(failed, vec![Identity::ordinal(1)]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(counters[0].stops(), 1);
        assert_eq!(counters[1].stops(), 0);
        assert_eq!(counters[2].stops(), 1);
    }

    #[tokio::test]
    async fn degraded_start_keeps_running_until_shutdown() {
        let pipeline = Arc::new(InboundPipeline::default());
        let (sources, counters) = three_sources(&pipeline, 2);
        let manager = manager(sources, pipeline);

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        run_until(manager, false, shutdown).await.unwrap();

        assert_eq!(counters[0].stops(), 1);
        assert_eq!(counters[1].stops(), 1);
        assert_eq!(counters[2].stops(), 0);
    }

    #[tokio::test]
    async fn drain_counts_buffered_events_after_cancel() {
        let pipeline = InboundPipeline::new(8);
        let rx = pipeline.take_receiver().unwrap();
        for i in 0..3 {
            pipeline.submit(Event::new(format!("k{i}"), f64::from(i))).await.unwrap();
        }

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(drain_pipeline(rx, cancel).await, 3);
    }

    #[tokio::test]
    async fn emitted_events_are_drained_on_shutdown() {
        let pipeline = Arc::new(InboundPipeline::new(8));
        let source = MockSource::new(Identity::ordinal(0), Arc::clone(&pipeline))
            .emitting(vec![Event::new("a", 1.0), Event::new("b", 2.0)]);
        let manager = manager(vec![source], Arc::clone(&pipeline));

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        run_until(manager, true, shutdown).await.unwrap();
        assert_eq!(pipeline.submitted(), 2);
    }

    #[test]
    fn check_lists_identity_and_type() {
        let pipeline = Arc::new(InboundPipeline::default());
        let sources = vec![
            MockSource::new(Identity::ordinal(0), Arc::clone(&pipeline)),
            MockSource::new(Identity::ordinal(1), Arc::clone(&pipeline))
                .with_plugin_type(PluginType::Http),
        ];
        let manager = manager(sources, pipeline);
        assert_eq!(describe_sources(&manager), vec!["0\tudp", "1\thttp"]);
    }
}
