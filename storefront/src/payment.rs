//! Payment processing against an external gateway.
//!
//! The gateway is an external collaborator with a narrow contract: charge,
//! verify a callback signature, refund. [`MockPaymentGateway`] simulates a
//! gateway that settles everything, for development and testing; production
//! would swap in a real integration behind the same trait.

use crate::error::{StoreError, StoreResult};
use crate::notification::{self, Notifier};
use crate::order::OrderStore;
use crate::types::{
    Money, Order, OrderId, OrderPaymentStatus, OrderStatus, Payment, PaymentId, PaymentMethod,
    PaymentState,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Payment gateway result
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Payment gateway error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Card declined
    #[error("card declined: {reason}")]
    CardDeclined {
        /// Decline reason
        reason: String,
    },
    /// Insufficient funds
    #[error("insufficient funds")]
    InsufficientFunds,
    /// Invalid payment method
    #[error("invalid payment method: {reason}")]
    InvalidPaymentMethod {
        /// Invalid reason
        reason: String,
    },
    /// Gateway did not answer in time
    #[error("gateway timeout")]
    Timeout,
    /// Other error
    #[error("payment error: {message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// Successful charge result from the gateway
#[derive(Debug, Clone)]
pub struct GatewayCharge {
    /// Gateway transaction id
    pub transaction_id: String,
    /// Last four digits of the card, for card methods
    pub card_last4: Option<String>,
    /// Card network, for card methods
    pub card_brand: Option<String>,
}

/// Abstraction over payment processors.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge the given amount for an order
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the charge is declined, invalid, or the
    /// gateway times out.
    async fn charge(
        &self,
        order_id: OrderId,
        amount: Money,
        method: PaymentMethod,
    ) -> GatewayResult<GatewayCharge>;

    /// Refund a settled transaction, returning the gateway's refund id
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the refund fails.
    async fn refund(&self, transaction_id: &str, amount: Money) -> GatewayResult<String>;

    /// Verify a gateway callback signature
    fn verify_signature(&self, order_ref: &str, payment_ref: &str, signature: &str) -> bool;
}

/// Mock payment gateway (always settles, for development and testing).
#[derive(Clone, Debug, Default)]
pub struct MockPaymentGateway;

impl MockPaymentGateway {
    /// Creates a new mock gateway
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new())
    }
}

fn mock_transaction_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("TXN{}", hex[..12].to_uppercase())
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(
        &self,
        order_id: OrderId,
        amount: Money,
        method: PaymentMethod,
    ) -> GatewayResult<GatewayCharge> {
        // Simulate network latency
        tokio::time::sleep(tokio::time::Duration::from_millis(25)).await;

        let transaction_id = mock_transaction_id();
        tracing::info!(
            order_id = %order_id,
            amount = amount.cents(),
            transaction_id = %transaction_id,
            "mock payment settled"
        );

        let is_card = matches!(method, PaymentMethod::CreditCard | PaymentMethod::DebitCard);
        Ok(GatewayCharge {
            transaction_id,
            card_last4: is_card.then(|| "4242".to_string()),
            card_brand: is_card.then(|| "VISA".to_string()),
        })
    }

    async fn refund(&self, transaction_id: &str, amount: Money) -> GatewayResult<String> {
        tokio::time::sleep(tokio::time::Duration::from_millis(25)).await;
        let refund_id = format!("RFND{}", uuid::Uuid::new_v4().simple());
        tracing::info!(
            transaction_id = %transaction_id,
            amount = amount.cents(),
            refund_id = %refund_id,
            "mock refund processed"
        );
        Ok(refund_id)
    }

    fn verify_signature(&self, _order_ref: &str, _payment_ref: &str, signature: &str) -> bool {
        !signature.is_empty()
    }
}

/// Gateway that declines every charge (test double)
#[derive(Clone, Debug)]
pub struct DecliningPaymentGateway {
    /// Decline reason reported back
    pub reason: String,
}

#[async_trait]
impl PaymentGateway for DecliningPaymentGateway {
    async fn charge(
        &self,
        _order_id: OrderId,
        _amount: Money,
        _method: PaymentMethod,
    ) -> GatewayResult<GatewayCharge> {
        Err(GatewayError::CardDeclined {
            reason: self.reason.clone(),
        })
    }

    async fn refund(&self, _transaction_id: &str, _amount: Money) -> GatewayResult<String> {
        Err(GatewayError::Other {
            message: "refunds unavailable".to_string(),
        })
    }

    fn verify_signature(&self, _order_ref: &str, _payment_ref: &str, _signature: &str) -> bool {
        false
    }
}

/// Gateway that times out on every charge (test double)
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeoutPaymentGateway;

#[async_trait]
impl PaymentGateway for TimeoutPaymentGateway {
    async fn charge(
        &self,
        _order_id: OrderId,
        _amount: Money,
        _method: PaymentMethod,
    ) -> GatewayResult<GatewayCharge> {
        Err(GatewayError::Timeout)
    }

    async fn refund(&self, _transaction_id: &str, _amount: Money) -> GatewayResult<String> {
        Err(GatewayError::Timeout)
    }

    fn verify_signature(&self, _order_ref: &str, _payment_ref: &str, _signature: &str) -> bool {
        false
    }
}

/// Store for payment attempt documents.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Insert or replace a payment document
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn upsert(&self, payment: Payment) -> StoreResult<()>;

    /// Fetch a payment by id
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn find(&self, id: PaymentId) -> StoreResult<Option<Payment>>;

    /// All attempts for an order, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn for_order(&self, order_id: OrderId) -> StoreResult<Vec<Payment>>;
}

/// In-memory payment store.
#[derive(Debug, Default)]
pub struct InMemoryPaymentStore {
    payments: RwLock<HashMap<PaymentId, Payment>>,
}

impl InMemoryPaymentStore {
    /// Creates an empty payment store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn upsert(&self, payment: Payment) -> StoreResult<()> {
        self.payments.write().await.insert(payment.id, payment);
        Ok(())
    }

    async fn find(&self, id: PaymentId) -> StoreResult<Option<Payment>> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn for_order(&self, order_id: OrderId) -> StoreResult<Vec<Payment>> {
        let mut attempts: Vec<Payment> = self
            .payments
            .read()
            .await
            .values()
            .filter(|payment| payment.order_id == order_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|payment| payment.created_at);
        Ok(attempts)
    }
}

/// Settles payments for orders and keeps the payment records.
pub struct PaymentProcessor {
    payments: Arc<dyn PaymentStore>,
    orders: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    currency: String,
}

impl PaymentProcessor {
    /// Creates a processor over the given stores and gateway
    #[must_use]
    pub fn new(
        payments: Arc<dyn PaymentStore>,
        orders: Arc<dyn OrderStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        currency: String,
    ) -> Self {
        Self {
            payments,
            orders,
            gateway,
            notifier,
            currency,
        }
    }

    /// Initiates payment for a freshly persisted order and applies the
    /// outcome to the order in place.
    ///
    /// Cash on delivery settles nothing up front: the payment record is
    /// accepted and the order stays `PENDING` with payment `PENDING`. Other
    /// methods are charged through the gateway; settlement moves the order
    /// to `CONFIRMED` with payment `COMPLETED`, a decline marks the payment
    /// `FAILED` on both records, and a gateway timeout surfaces as
    /// [`StoreError::PaymentTimeout`]. The order exists either way, so the
    /// caller retries the payment, never order creation.
    ///
    /// # Errors
    ///
    /// [`StoreError::PaymentTimeout`] on gateway timeout; store errors
    /// otherwise.
    pub async fn process(&self, order: &mut Order) -> StoreResult<Payment> {
        let mut payment = Payment {
            id: PaymentId::new(),
            order_id: order.id,
            user_id: order.user_id,
            amount: order.total_amount,
            currency: self.currency.clone(),
            method: order.payment_method,
            status: PaymentState::Initiated,
            transaction_id: None,
            card_last4: None,
            card_brand: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.payments.upsert(payment.clone()).await?;
        order.payment_id = Some(payment.id);

        if order.payment_method.is_cod() {
            // Nothing to settle until delivery
            payment.status = PaymentState::Success;
            self.payments.upsert(payment.clone()).await?;
            return Ok(payment);
        }

        match self
            .gateway
            .charge(order.id, order.total_amount, order.payment_method)
            .await
        {
            Ok(charge) => {
                payment.status = PaymentState::Success;
                payment.transaction_id = Some(charge.transaction_id);
                payment.card_last4 = charge.card_last4;
                payment.card_brand = charge.card_brand;
                payment.completed_at = Some(Utc::now());
                self.payments.upsert(payment.clone()).await?;

                order.payment_status = OrderPaymentStatus::Completed;
                order.status = OrderStatus::Confirmed;
                notification::notify_payment_succeeded(&self.notifier, order);
                Ok(payment)
            }
            Err(GatewayError::Timeout) => {
                payment.status = PaymentState::Failed;
                self.payments.upsert(payment).await?;
                tracing::warn!(order_id = %order.id, "payment gateway timed out");
                Err(StoreError::PaymentTimeout { order_id: order.id })
            }
            Err(err) => {
                payment.status = PaymentState::Failed;
                self.payments.upsert(payment.clone()).await?;

                order.payment_status = OrderPaymentStatus::Failed;
                tracing::warn!(order_id = %order.id, error = %err, "payment declined");
                Ok(payment)
            }
        }
    }

    /// Completes a gateway-mediated payment after a verified callback.
    ///
    /// Marks the payment settled and moves the order to `CONFIRMED` with
    /// payment `COMPLETED`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the payment or its order is missing.
    pub async fn complete_payment(
        &self,
        payment_id: PaymentId,
        transaction_id: &str,
        method: PaymentMethod,
    ) -> StoreResult<Payment> {
        let mut payment =
            self.payments
                .find(payment_id)
                .await?
                .ok_or_else(|| StoreError::NotFound {
                    entity: "payment",
                    id: payment_id.to_string(),
                })?;

        payment.status = PaymentState::Success;
        payment.transaction_id = Some(transaction_id.to_string());
        payment.method = method;
        payment.completed_at = Some(Utc::now());
        self.payments.upsert(payment.clone()).await?;

        let order = loop {
            let order =
                self.orders
                    .find(payment.order_id)
                    .await?
                    .ok_or_else(|| StoreError::NotFound {
                        entity: "order",
                        id: payment.order_id.to_string(),
                    })?;

            let mut updated = order.clone();
            updated.payment_status = OrderPaymentStatus::Completed;
            if updated.status == OrderStatus::Pending {
                updated.status = OrderStatus::Confirmed;
            }
            updated.updated_at = Utc::now();
            updated.version += 1;

            if self
                .orders
                .save_if_version(updated.clone(), order.version)
                .await?
            {
                break updated;
            }
        };

        notification::notify_payment_succeeded(&self.notifier, &order);
        Ok(payment)
    }

    /// Verifies a gateway callback signature
    #[must_use]
    pub fn verify_signature(&self, order_ref: &str, payment_ref: &str, signature: &str) -> bool {
        self.gateway.verify_signature(order_ref, payment_ref, signature)
    }

    /// Marks an order's settled payment refunded, refunding through the
    /// gateway when a transaction id exists.
    ///
    /// Gateway refund failures are logged and swallowed; the refund of
    /// record is the payment document, and reconciliation picks up the
    /// gateway side.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment store fails.
    pub async fn refund_for_order(&self, order: &Order) -> StoreResult<()> {
        for mut payment in self.payments.for_order(order.id).await? {
            if payment.status != PaymentState::Success {
                continue;
            }
            if let Some(transaction_id) = payment.transaction_id.clone() {
                if let Err(err) = self.gateway.refund(&transaction_id, payment.amount).await {
                    tracing::warn!(
                        order_id = %order.id,
                        transaction_id = %transaction_id,
                        error = %err,
                        "gateway refund failed; payment record still marked refunded"
                    );
                }
            }
            payment.status = PaymentState::Refunded;
            self.payments.upsert(payment).await?;
        }
        Ok(())
    }

    /// All payment attempts recorded for an order
    ///
    /// # Errors
    ///
    /// Returns an error if the payment store fails.
    pub async fn attempts_for_order(&self, order_id: OrderId) -> StoreResult<Vec<Payment>> {
        self.payments.for_order(order_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_gateway_settles_with_card_metadata() {
        let gateway = MockPaymentGateway::new();
        let charge = gateway
            .charge(OrderId::new(), Money::from_units(100), PaymentMethod::CreditCard)
            .await
            .unwrap();
        assert!(charge.transaction_id.starts_with("TXN"));
        assert_eq!(charge.card_last4.as_deref(), Some("4242"));
        assert_eq!(charge.card_brand.as_deref(), Some("VISA"));
    }

    #[tokio::test]
    async fn mock_gateway_omits_card_metadata_for_upi() {
        let gateway = MockPaymentGateway::new();
        let charge = gateway
            .charge(OrderId::new(), Money::from_units(100), PaymentMethod::Upi)
            .await
            .unwrap();
        assert!(charge.card_last4.is_none());
        assert!(charge.card_brand.is_none());
    }

    #[tokio::test]
    async fn declining_gateway_reports_reason() {
        let gateway = DecliningPaymentGateway {
            reason: "expired card".to_string(),
        };
        let err = gateway
            .charge(OrderId::new(), Money::from_units(100), PaymentMethod::CreditCard)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::CardDeclined {
                reason: "expired card".to_string()
            }
        );
    }
}
