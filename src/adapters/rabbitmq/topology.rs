//! Broker topology declaration.
//!
//! One durable direct exchange carries all billing events. Each queue is
//! declared durable with a paired dead-letter route: rejected messages go
//! through `<exchange>_dlx` to `<queue>_dlq`.
//!
//! ```text
//! billing_events ──auth_events──────────▶ [auth_events] ──reject──┐
//!                └─notification_events──▶ [notification_events]   │
//! billing_events_dlx ◀───────────────────────────────────────────┘
//!        └─auth_events_dlq──────────────▶ [auth_events_dlq]
//!        └─notification_events_dlq──────▶ [notification_events_dlq]
//! ```

use lapin::options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{Channel, Connection, ConnectionProperties, ExchangeKind};

use crate::config::RabbitMqConfig;
use crate::domain::events::{AUTH_QUEUE, NOTIFICATION_QUEUE};
use crate::domain::foundation::BillingError;

/// Name of a queue's dead-letter companion.
pub fn dlq_name(queue: &str) -> String {
    format!("{}_dlq", queue)
}

/// Connect to the broker.
pub async fn connect(config: &RabbitMqConfig) -> Result<Connection, BillingError> {
    Connection::connect(&config.url(), ConnectionProperties::default())
        .await
        .map_err(|e| BillingError::database(format!("failed to connect to broker: {}", e)))
}

/// Declare the full billing topology on a fresh channel and return it.
///
/// Idempotent: redeclaring existing exchanges and queues with the same
/// arguments is a no-op at the broker.
pub async fn declare_topology(connection: &Connection, config: &RabbitMqConfig) -> Result<Channel, BillingError> {
    let channel = connection
        .create_channel()
        .await
        .map_err(|e| BillingError::database(format!("failed to open channel: {}", e)))?;

    let durable = ExchangeDeclareOptions {
        durable: true,
        ..Default::default()
    };

    channel
        .exchange_declare(
            &config.exchange_name,
            ExchangeKind::Direct,
            durable.clone(),
            FieldTable::default(),
        )
        .await
        .map_err(|e| BillingError::database(format!("failed to declare exchange: {}", e)))?;

    channel
        .exchange_declare(
            &config.dlx_name(),
            ExchangeKind::Direct,
            durable,
            FieldTable::default(),
        )
        .await
        .map_err(|e| BillingError::database(format!("failed to declare DLX: {}", e)))?;

    for queue in [AUTH_QUEUE, NOTIFICATION_QUEUE] {
        declare_queue_pair(&channel, config, queue).await?;
    }

    Ok(channel)
}

/// Declare one main queue with its dead-letter companion.
async fn declare_queue_pair(
    channel: &Channel,
    config: &RabbitMqConfig,
    queue: &str,
) -> Result<(), BillingError> {
    let dlq = dlq_name(queue);

    let mut args = FieldTable::default();
    args.insert(
        "x-dead-letter-exchange".into(),
        AMQPValue::LongString(config.dlx_name().into()),
    );
    args.insert(
        "x-dead-letter-routing-key".into(),
        AMQPValue::LongString(dlq.clone().into()),
    );

    let durable = QueueDeclareOptions {
        durable: true,
        ..Default::default()
    };

    channel
        .queue_declare(queue, durable.clone(), args)
        .await
        .map_err(|e| BillingError::database(format!("failed to declare queue {}: {}", queue, e)))?;

    channel
        .queue_bind(
            queue,
            &config.exchange_name,
            queue,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|e| BillingError::database(format!("failed to bind queue {}: {}", queue, e)))?;

    channel
        .queue_declare(&dlq, durable, FieldTable::default())
        .await
        .map_err(|e| BillingError::database(format!("failed to declare DLQ {}: {}", dlq, e)))?;

    channel
        .queue_bind(
            &dlq,
            &config.dlx_name(),
            &dlq,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|e| BillingError::database(format!("failed to bind DLQ {}: {}", dlq, e)))?;

    Ok(())
}
