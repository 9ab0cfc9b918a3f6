//! Consume loop wiring a worker to its queue.
//!
//! Single consumer per queue. Each delivery is classified by the worker
//! framework into a broker decision; a breaker-open skip leaves the message
//! unacknowledged so the broker redelivers it once the channel cycles.
//! Shutdown stops the loop after the in-flight message has been decided.

use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicRejectOptions};
use lapin::types::FieldTable;
use lapin::Channel;
use tokio::sync::watch;

use crate::adapters::workers::{MessageOutcome, WorkerProcessor};
use crate::domain::foundation::BillingError;

/// Consume the worker's queue until the shutdown signal fires or the
/// broker closes the stream.
pub async fn run_consumer(
    channel: &Channel,
    processor: WorkerProcessor,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), BillingError> {
    let queue = processor.queue_name().to_string();

    let mut consumer = channel
        .basic_consume(
            &queue,
            &format!("{}_worker", queue),
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|e| BillingError::database(format!("failed to start consumer: {}", e)))?;

    tracing::info!(queue, "worker consuming");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!(queue, "worker shutting down");
                break;
            }
            delivery = consumer.next() => {
                match delivery {
                    Some(Ok(delivery)) => settle(&queue, &processor, delivery).await?,
                    Some(Err(err)) => {
                        tracing::error!(queue, error = %err, "broker error, worker stopping");
                        return Err(BillingError::database(format!("consumer failed: {}", err)));
                    }
                    None => {
                        tracing::warn!(queue, "consumer stream ended");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

async fn settle(
    queue: &str,
    processor: &WorkerProcessor,
    delivery: Delivery,
) -> Result<(), BillingError> {
    let outcome = processor.process(&delivery.data).await;

    let result = match outcome {
        MessageOutcome::Ack => delivery.ack(BasicAckOptions::default()).await,
        MessageOutcome::Reject => {
            delivery
                .reject(BasicRejectOptions { requeue: false })
                .await
        }
        MessageOutcome::NackRequeue => {
            delivery
                .nack(BasicNackOptions {
                    requeue: true,
                    ..Default::default()
                })
                .await
        }
        // Left unacked on purpose: the broker redelivers after the channel
        // closes, and later deliveries still reach the worker.
        MessageOutcome::Skipped => Ok(()),
    };

    result.map_err(|e| {
        BillingError::database(format!("failed to settle message on {}: {}", queue, e))
    })
}
