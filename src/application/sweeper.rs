//! Expiry sweeper - periodic task advancing subscriptions past their term.
//!
//! Every tick scans for active subscriptions whose `end_date` has passed:
//! opted-in ones are renewed (a fresh pending subscription charged to the
//! default card), the rest are expired with a role downgrade. One
//! subscription is processed at a time; a concurrent user command wins the
//! race because the status change re-checks legality.
//!
//! ## Graceful Shutdown
//!
//! The task listens for a shutdown signal and finishes the current pass
//! before stopping.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::application::managers::SubscriptionManager;
use crate::domain::foundation::{BillingError, Timestamp};
use crate::ports::SubscriptionRepository;

/// Periodic expiry/renewal task.
pub struct ExpirySweeper {
    subscriptions: Arc<dyn SubscriptionRepository>,
    manager: Arc<SubscriptionManager>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        manager: Arc<SubscriptionManager>,
        interval: Duration,
    ) -> Self {
        Self {
            subscriptions,
            manager,
            interval,
        }
    }

    /// Run until the shutdown signal fires.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.interval);
        // The first tick fires immediately; skip it so startup is quiet.
        ticker.tick().await;

        tracing::info!(interval_secs = self.interval.as_secs(), "expiry sweeper started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("expiry sweeper stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.sweep_once().await {
                        tracing::error!(error = %err, "expiry sweep failed");
                    }
                }
            }
        }
    }

    /// One pass over ended subscriptions.
    pub async fn sweep_once(&self) -> Result<(), BillingError> {
        let now = Timestamp::now();
        let ended = self.subscriptions.find_expired_active(now).await?;

        if ended.is_empty() {
            return Ok(());
        }
        tracing::info!(count = ended.len(), "sweeping ended subscriptions");

        for subscription in ended {
            let result = if subscription.auto_renewal {
                self.manager
                    .renew_expired_subscription(&subscription)
                    .await
                    .map(|replacement| {
                        tracing::info!(
                            old = %subscription.id,
                            new = %replacement.id,
                            "subscription renewed by sweeper"
                        );
                    })
            } else {
                self.manager.mark_expired(subscription.id, true).await
            };

            match result {
                Ok(()) => {}
                // A concurrent cancel got there first; nothing to do.
                Err(BillingError::InvalidTransition { .. }) => {
                    tracing::info!(
                        subscription_id = %subscription.id,
                        "subscription changed status mid-sweep, skipped"
                    );
                }
                Err(err) => {
                    tracing::error!(
                        subscription_id = %subscription.id,
                        error = %err,
                        "failed to sweep subscription"
                    );
                }
            }
        }

        Ok(())
    }
}
