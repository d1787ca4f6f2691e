//! Notification collaborator (email and similar).
//!
//! All hooks are fire-and-forget: a notification failure must never roll
//! back or fail the operation that triggered it. The `notify_*` helpers
//! dispatch on a background task and log-and-swallow errors.

use crate::types::Order;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Notification delivery failure
#[derive(Debug, Clone, Error)]
#[error("notification failed: {message}")]
pub struct NotifyError {
    /// What went wrong
    pub message: String,
}

/// Outbound notification hooks the core triggers.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// An order was created and priced
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails; callers must swallow it.
    async fn order_confirmed(&self, order: &Order) -> Result<(), NotifyError>;

    /// An order's status changed
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails; callers must swallow it.
    async fn order_status_changed(&self, order: &Order) -> Result<(), NotifyError>;

    /// A payment for an order settled
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails; callers must swallow it.
    async fn payment_succeeded(&self, order: &Order) -> Result<(), NotifyError>;
}

/// Notifier that only logs (development default).
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn Notifier> {
        Arc::new(Self)
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn order_confirmed(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            "order confirmation notification"
        );
        Ok(())
    }

    async fn order_status_changed(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            order_id = %order.id,
            status = ?order.status,
            "order status notification"
        );
        Ok(())
    }

    async fn payment_succeeded(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            order_id = %order.id,
            amount = %order.total_amount,
            "payment success notification"
        );
        Ok(())
    }
}

/// Dispatches the order-confirmed hook without blocking the caller
pub fn notify_order_confirmed(notifier: &Arc<dyn Notifier>, order: &Order) {
    let notifier = Arc::clone(notifier);
    let order = order.clone();
    tokio::spawn(async move {
        if let Err(err) = notifier.order_confirmed(&order).await {
            tracing::warn!(order_id = %order.id, error = %err, "order confirmation notification failed");
        }
    });
}

/// Dispatches the status-changed hook without blocking the caller
pub fn notify_status_changed(notifier: &Arc<dyn Notifier>, order: &Order) {
    let notifier = Arc::clone(notifier);
    let order = order.clone();
    tokio::spawn(async move {
        if let Err(err) = notifier.order_status_changed(&order).await {
            tracing::warn!(order_id = %order.id, error = %err, "status change notification failed");
        }
    });
}

/// Dispatches the payment-succeeded hook without blocking the caller
pub fn notify_payment_succeeded(notifier: &Arc<dyn Notifier>, order: &Order) {
    let notifier = Arc::clone(notifier);
    let order = order.clone();
    tokio::spawn(async move {
        if let Err(err) = notifier.payment_succeeded(&order).await {
            tracing::warn!(order_id = %order.id, error = %err, "payment notification failed");
        }
    });
}
