//! API server entrypoint: HTTP surface plus the expiry sweeper.

use std::sync::Arc;

use jsonwebtoken::Algorithm;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use billing_api::adapters::http::{api_router, BillingAppState, JwtVerifier};
use billing_api::adapters::postgres::{
    PostgresCardRepository, PostgresPlanRepository, PostgresSubscriptionRepository,
    PostgresTransactionRepository,
};
use billing_api::adapters::rabbitmq;
use billing_api::adapters::stripe::{StripeConfig, StripeGateway};
use billing_api::application::{
    CardsManager, ExpirySweeper, PaymentManager, PlanService, SubscriptionManager,
    SubscriptionService, TransactionService, WebhookRouter,
};
use billing_api::config::AppConfig;
use billing_api::ports::{
    AuthEventPublisher, CardRepository, NotificationPublisher, PaymentProcessor, PlanRepository,
    SubscriptionRepository, TransactionRepository,
};

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

    // Infrastructure handles, built once and injected everywhere.
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let broker = rabbitmq::connect(&config.rabbitmq).await?;
    let channel = rabbitmq::declare_topology(&broker, &config.rabbitmq).await?;
    let publisher = Arc::new(rabbitmq::RabbitEventPublisher::new(
        channel,
        config.rabbitmq.exchange_name.clone(),
    ));

    let gateway: Arc<dyn PaymentProcessor> = Arc::new(StripeGateway::new(StripeConfig::new(
        config.payment.api_key.clone(),
    )));

    // Repositories and services.
    let plan_repository: Arc<dyn PlanRepository> =
        Arc::new(PostgresPlanRepository::new(pool.clone()));
    let subscription_repository: Arc<dyn SubscriptionRepository> =
        Arc::new(PostgresSubscriptionRepository::new(pool.clone()));
    let transaction_repository: Arc<dyn TransactionRepository> =
        Arc::new(PostgresTransactionRepository::new(pool.clone()));
    let card_repository: Arc<dyn CardRepository> =
        Arc::new(PostgresCardRepository::new(pool.clone()));

    let plans = Arc::new(PlanService::new(plan_repository.clone()));
    let subscriptions = Arc::new(SubscriptionService::new(
        subscription_repository.clone(),
        plan_repository,
    ));
    let transactions = Arc::new(TransactionService::new(transaction_repository));

    let auth_publisher: Arc<dyn AuthEventPublisher> = publisher.clone();
    let notification_publisher: Arc<dyn NotificationPublisher> = publisher;

    let payments = Arc::new(PaymentManager::new(
        transactions.clone(),
        card_repository.clone(),
        gateway.clone(),
    ));
    let cards_manager = Arc::new(CardsManager::new(
        card_repository.clone(),
        gateway,
        notification_publisher.clone(),
    ));
    let subscription_manager = Arc::new(SubscriptionManager::new(
        subscriptions.clone(),
        plans.clone(),
        payments,
        card_repository,
        auth_publisher,
        notification_publisher,
    ));
    let webhook_router = Arc::new(WebhookRouter::new(
        cards_manager.clone(),
        subscription_manager.clone(),
    ));

    // Background expiry sweeper with graceful shutdown.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = ExpirySweeper::new(
        subscription_repository,
        subscription_manager.clone(),
        config.scheduler.interval(),
    );
    let sweeper_handle = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    let state = BillingAppState {
        plans,
        subscriptions,
        transactions,
        cards_manager,
        subscription_manager,
        webhook_router,
        jwt: Arc::new(JwtVerifier::new(
            &config.auth.secret_key,
            config.auth.jwt_algorithm().unwrap_or(Algorithm::HS256),
        )),
    };

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "billing API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, api_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = sweeper_handle.await;

    tracing::info!("billing API stopped");
    Ok(())
}
