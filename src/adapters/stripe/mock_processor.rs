//! Mock payment processor for testing.
//!
//! Configurable implementation of `PaymentProcessor` for unit and
//! integration tests. Supports error injection and call tracking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{
    GatewayError, PaymentIntent, PaymentIntentRequest, PaymentProcessor,
};

/// Mock payment processor.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProcessor::new();
/// mock.fail_next(GatewayError::transient("gateway down"));
///
/// let result = mock.create_customer().await;
/// assert!(result.is_err());
/// assert_eq!(mock.calls(), vec!["create_customer".to_string()]);
/// ```
#[derive(Default)]
pub struct MockPaymentProcessor {
    counter: AtomicU64,
    next_error: Mutex<Option<GatewayError>>,
    call_log: Mutex<Vec<String>>,
}

impl MockPaymentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next operation fail with `error`.
    pub fn fail_next(&self, error: GatewayError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    /// Names of the operations invoked so far.
    pub fn calls(&self) -> Vec<String> {
        self.call_log.lock().unwrap().clone()
    }

    fn record(&self, method: &str) -> Result<u64, GatewayError> {
        self.call_log.lock().unwrap().push(method.to_string());
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.counter.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn create_customer(&self) -> Result<String, GatewayError> {
        let n = self.record("create_customer")?;
        Ok(format!("cus_mock_{}", n))
    }

    async fn create_card_binding_session(
        &self,
        customer_id: &str,
    ) -> Result<String, GatewayError> {
        self.record("create_card_binding_session")?;
        Ok(format!(
            "https://checkout.stripe.test/setup/{}",
            customer_id
        ))
    }

    async fn detach_card(&self, _payment_method_token: &str) -> Result<(), GatewayError> {
        self.record("detach_card")?;
        Ok(())
    }

    async fn create_payment_intent(
        &self,
        _request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        let n = self.record("create_payment_intent")?;
        Ok(PaymentIntent {
            intent_id: format!("pi_mock_{}", n),
            client_secret: Some(format!("pi_mock_{}_secret", n)),
        })
    }

    async fn cancel_payment_intent(&self, _intent_id: &str) -> Result<(), GatewayError> {
        self.record("cancel_payment_intent")?;
        Ok(())
    }
}
