use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

use lifeline::{
    cli::config_path_from_args,
    config::Config,
    logging::init_tracing,
    oracle::{
        OracleGateway,
        prompts::load_prior_turns,
        telemetry::{NoopTelemetrySink, TelemetrySink, TracingTelemetrySink, oracle_debug_enabled},
    },
    orchestrator::{Orchestrator, TracingLifecycleSink},
    server,
    session::SessionStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let logging_guard = init_tracing(&config.logging)?;

    let oracle_telemetry: Arc<dyn TelemetrySink> = if oracle_debug_enabled() {
        tracing::info!(target: "oracle", "oracle_debug_enabled");
        Arc::new(TracingTelemetrySink)
    } else {
        Arc::new(NoopTelemetrySink)
    };
    let gateway = OracleGateway::new(config.oracle.clone()).with_telemetry(oracle_telemetry);

    let guidance_examples = match &config.oracle.few_shot_path {
        Some(path) => load_prior_turns(path)?,
        None => Vec::new(),
    };
    let orchestrator = Arc::new(
        Orchestrator::new(
            Arc::new(gateway),
            Arc::new(SessionStore::new()),
            config.orchestrator,
        )
        .with_lifecycle_sink(Arc::new(TracingLifecycleSink))
        .with_guidance_examples(guidance_examples),
    );

    let shutdown = CancellationToken::new();
    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        let signal_name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
            _ = signal_token.cancelled() => return,
        };
        tracing::info!(target: "server", signal = signal_name, "shutdown_signal_received");
        signal_token.cancel();
    });

    tracing::info!(
        target: "server",
        run_id = logging_guard.run_id(),
        config = %config_path.display(),
        "lifeline_starting"
    );
    server::serve(&config.server.socket_path, orchestrator, shutdown).await
}
