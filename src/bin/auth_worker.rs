//! Auth worker entrypoint: consumes `auth_events` and delivers role
//! changes to the auth service.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use billing_api::adapters::rabbitmq;
use billing_api::adapters::resilience::CountingCircuitBreaker;
use billing_api::adapters::workers::{AuthWorker, HttpSidecarClient, WorkerProcessor};
use billing_api::config::AppConfig;
use billing_api::ports::CircuitBreakerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    let broker = rabbitmq::connect(&config.rabbitmq).await?;
    let channel = rabbitmq::declare_topology(&broker, &config.rabbitmq).await?;

    let sidecar = Arc::new(HttpSidecarClient::new(config.sidecar.secret_token.clone()));
    let worker = Arc::new(AuthWorker::new(sidecar, config.sidecar.auth_base()));
    let processor = WorkerProcessor::new(
        worker,
        Arc::new(CountingCircuitBreaker::new(CircuitBreakerConfig::default())),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(true);
    });

    rabbitmq::run_consumer(&channel, processor, shutdown_rx).await?;

    tracing::info!("auth worker stopped");
    Ok(())
}
