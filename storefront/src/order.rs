//! Order pipeline: checkout, lifecycle transitions, and their stock effects.
//!
//! `create_order` is the system's main transaction. There is no cross-store
//! transaction to lean on, so the pipeline runs as a compensated sequence:
//! stock deductions and coupon redemption are undone if a later step fails,
//! and an order document is only inserted once its deductions are on the
//! ledger. Payment comes last: a payment failure never unwinds the order,
//! it is retried against the persisted order instead.
//!
//! Status changes go through [`OrderStatus::can_transition_to`]; the
//! transitions with stock or payment side effects (cancellation, return,
//! refund) apply them here and nowhere else.

use crate::cart::CartService;
use crate::catalog::Catalog;
use crate::config::PricingConfig;
use crate::coupon::CouponValidator;
use crate::error::{StoreError, StoreResult};
use crate::inventory::InventoryLedger;
use crate::notification::{self, Notifier};
use crate::payment::PaymentProcessor;
use crate::types::{
    Actor, CategoryId, Coupon, Money, Order, OrderId, OrderItem, OrderPaymentStatus, OrderStatus,
    PaymentMethod, ShippingAddress, StockChangeType, UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Store for order documents.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn insert(&self, order: Order) -> StoreResult<()>;

    /// Fetch an order by id
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn find(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// Replace an existing order document
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn save(&self, order: Order) -> StoreResult<()>;

    /// Replace the document iff the stored version still equals
    /// `expected_version`. The caller bumps `order.version` on its copy;
    /// the stored document is checked against the version it read.
    ///
    /// Returns `false` on a version conflict (the caller re-reads and
    /// retries). Status transitions go through this, never [`Self::save`];
    /// an unconditional write would let two racing transitions both apply
    /// their stock and payment side effects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the order does not exist.
    async fn save_if_version(&self, order: Order, expected_version: u64) -> StoreResult<bool>;

    /// A user's orders, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>>;

    /// All orders currently in the given status, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn by_status(&self, status: OrderStatus) -> StoreResult<Vec<Order>>;
}

/// In-memory order store.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    /// Creates an empty order store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> StoreResult<()> {
        self.orders.write().await.insert(order.id, order);
        Ok(())
    }

    async fn find(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn save(&self, order: Order) -> StoreResult<()> {
        self.orders.write().await.insert(order.id, order);
        Ok(())
    }

    async fn save_if_version(&self, order: Order, expected_version: u64) -> StoreResult<bool> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "order",
                id: order.id.to_string(),
            })?;

        if stored.version != expected_version {
            return Ok(false);
        }
        *stored = order;
        Ok(true)
    }

    async fn for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|order| std::cmp::Reverse(order.created_at));
        Ok(orders)
    }

    async fn by_status(&self, status: OrderStatus) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| order.status == status)
            .cloned()
            .collect();
        orders.sort_by_key(|order| std::cmp::Reverse(order.created_at));
        Ok(orders)
    }
}

/// Runs checkout and drives the order status state machine.
pub struct OrderPipeline {
    orders: Arc<dyn OrderStore>,
    carts: Arc<CartService>,
    catalog: Arc<dyn Catalog>,
    ledger: Arc<InventoryLedger>,
    coupons: Arc<CouponValidator>,
    payments: Arc<PaymentProcessor>,
    notifier: Arc<dyn Notifier>,
    pricing: PricingConfig,
}

impl OrderPipeline {
    /// Creates a pipeline over the given collaborators
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        carts: Arc<CartService>,
        catalog: Arc<dyn Catalog>,
        ledger: Arc<InventoryLedger>,
        coupons: Arc<CouponValidator>,
        payments: Arc<PaymentProcessor>,
        notifier: Arc<dyn Notifier>,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            orders,
            carts,
            catalog,
            ledger,
            coupons,
            payments,
            notifier,
            pricing,
        }
    }

    /// Converts the user's cart into a priced, stock-committed order and
    /// initiates payment.
    ///
    /// The sequence is: precheck every line against the live catalog,
    /// re-validate any applied coupon, price the order
    /// (`total = (subtotal − discount) + shipping + tax`), deduct stock
    /// through the ledger, record the coupon redemption, persist the order,
    /// clear the cart, then process payment. A failure after deductions were
    /// written compensates them before surfacing, so an order document only
    /// ever exists alongside its ledger entries.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EmptyCart`] if the cart has no items.
    /// - [`StoreError::ProductUnavailable`] / [`StoreError::NotFound`] /
    ///   [`StoreError::InsufficientStock`] from the precheck or the ledger.
    /// - [`StoreError::CouponRejected`] if the applied coupon no longer
    ///   validates.
    /// - [`StoreError::PaymentTimeout`] if the gateway times out; the order
    ///   is persisted and the payment can be retried against it.
    pub async fn create_order(
        &self,
        user_id: UserId,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        notes: Option<String>,
    ) -> StoreResult<Order> {
        let cart = self.carts.cart_entity(user_id).await?;
        if cart.is_empty() {
            return Err(StoreError::EmptyCart);
        }

        // Precheck against the live catalog. The ledger re-checks under its
        // compare-and-swap; this pass exists to fail fast with the product
        // name before anything is written.
        let mut category_ids: Vec<CategoryId> = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let product =
                self.catalog
                    .get(item.product_id)
                    .await?
                    .ok_or_else(|| StoreError::NotFound {
                        entity: "product",
                        id: item.product_id.to_string(),
                    })?;
            if !product.active {
                return Err(StoreError::ProductUnavailable {
                    product: product.name,
                });
            }
            if product.stock_quantity < item.quantity {
                return Err(StoreError::InsufficientStock {
                    product: product.name,
                    requested: item.quantity,
                    available: product.stock_quantity,
                });
            }
            category_ids.push(product.category_id);
        }

        let items: Vec<OrderItem> = cart
            .items
            .iter()
            .map(|item| OrderItem {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                product_image: item.product_image.clone(),
                price: item.price,
                quantity: item.quantity,
                subtotal: item.subtotal,
            })
            .collect();
        let subtotal = cart.subtotal();

        // The coupon is re-validated at checkout time; a coupon that expired
        // or hit its limit since it was applied fails the whole checkout.
        let coupon = match &cart.applied_coupon {
            Some(code) => Some(
                self.coupons
                    .validate(
                        code,
                        subtotal,
                        &cart.product_ids(),
                        &category_ids,
                        user_id,
                    )
                    .await?,
            ),
            None => None,
        };
        let discount_amount = coupon
            .as_ref()
            .map_or(Money::ZERO, |c| CouponValidator::calculate_discount(c, subtotal));

        let taxable = subtotal.saturating_sub(discount_amount);
        let shipping_cost = if taxable >= self.pricing.free_shipping_threshold {
            Money::ZERO
        } else {
            self.pricing.shipping_cost
        };
        let tax = taxable.percent_half_up(self.pricing.tax_rate_percent);
        let total_amount = taxable.add(shipping_cost).add(tax);

        let now = Utc::now();
        let mut order = Order {
            id: OrderId::new(),
            order_number: format!("ORD{}", now.timestamp_millis()),
            user_id,
            items,
            shipping_address,
            subtotal,
            shipping_cost,
            tax,
            discount_amount,
            coupon_code: coupon.as_ref().map(|c| c.code.clone()),
            total_amount,
            status: OrderStatus::Pending,
            payment_status: OrderPaymentStatus::Pending,
            payment_id: None,
            payment_method,
            tracking_number: None,
            notes,
            created_at: now,
            updated_at: now,
            shipped_at: None,
            delivered_at: None,
            version: 0,
        };

        self.deduct_stock(&order).await?;

        if let Some(coupon) = &coupon {
            if let Err(err) = self.record_redemption(coupon, &order).await {
                self.compensate_deductions(&order).await;
                return Err(err);
            }
        }

        if let Err(err) = self.orders.insert(order.clone()).await {
            if let Some(coupon) = &coupon {
                self.compensate_redemption(coupon, user_id).await;
            }
            self.compensate_deductions(&order).await;
            return Err(err);
        }

        self.carts.clear(user_id).await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            user_id = %user_id,
            total = %order.total_amount,
            "order created"
        );

        let payment_outcome = self.payments.process(&mut order).await;

        // Merge the payment outcome onto the freshest stored copy under the
        // version guard; a transition that raced in (an immediate cancel)
        // keeps precedence over the payment fields.
        loop {
            let current = self.require_order(order.id).await?;
            if current.status != OrderStatus::Pending {
                order = current;
                break;
            }
            let mut updated = current.clone();
            updated.payment_id = order.payment_id;
            updated.payment_status = order.payment_status;
            if order.status == OrderStatus::Confirmed {
                updated.status = OrderStatus::Confirmed;
            }
            updated.updated_at = Utc::now();
            updated.version += 1;
            if self
                .orders
                .save_if_version(updated.clone(), current.version)
                .await?
            {
                order = updated;
                break;
            }
        }

        match payment_outcome {
            Ok(_) => {
                notification::notify_order_confirmed(&self.notifier, &order);
                Ok(order)
            }
            Err(err) => Err(err),
        }
    }

    /// Cancels an order on behalf of its owner, restoring stock and
    /// refunding a settled payment. Self-service only; admins cancel through
    /// [`Self::update_status`].
    ///
    /// The transition itself is the serialization point: the status flip is
    /// written through a version-guarded save, and stock restoration and the
    /// refund run only after that write wins. A concurrent cancel loses the
    /// version check, re-reads the cancelled order, and fails the guard, so
    /// the side effects apply exactly once.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the order does not exist.
    /// - [`StoreError::AccessDenied`] if the actor is not the owner.
    /// - [`StoreError::InvalidTransition`] once the order has shipped (or
    ///   was already cancelled).
    pub async fn cancel(&self, order_id: OrderId, actor: Actor) -> StoreResult<Order> {
        loop {
            let order = self.require_order(order_id).await?;
            if order.user_id != actor.user_id {
                return Err(StoreError::AccessDenied);
            }
            if !order.status.is_cancellable() {
                return Err(StoreError::InvalidTransition {
                    from: order.status,
                    to: OrderStatus::Cancelled,
                });
            }

            let was_paid = order.payment_status == OrderPaymentStatus::Completed;
            let mut updated = order.clone();
            updated.status = OrderStatus::Cancelled;
            if was_paid {
                updated.payment_status = OrderPaymentStatus::Refunded;
            }
            updated.updated_at = Utc::now();
            updated.version += 1;

            if !self
                .orders
                .save_if_version(updated.clone(), order.version)
                .await?
            {
                // Lost the race against another transition; re-read and retry.
                continue;
            }

            self.restore_stock(&updated, StockChangeType::OrderCancellation, "Order cancelled")
                .await;
            if was_paid {
                self.payments.refund_for_order(&updated).await?;
            }

            tracing::info!(
                order_id = %updated.id,
                order_number = %updated.order_number,
                "order cancelled"
            );
            notification::notify_status_changed(&self.notifier, &updated);
            return Ok(updated);
        }
    }

    /// Moves an order to `new_status` (admin only), applying the
    /// transition's side effects: timestamps for shipping and delivery,
    /// COD settlement on delivery, stock restoration on cancellation and
    /// return, payment refund on refund.
    ///
    /// Like [`Self::cancel`], the version-guarded status write is the
    /// serialization point; stock restoration and gateway refunds run only
    /// in the caller that won it, so racing transitions never double-apply.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the order does not exist.
    /// - [`StoreError::AccessDenied`] for non-admin actors.
    /// - [`StoreError::InvalidTransition`] if the state machine forbids the
    ///   move.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
        actor: Actor,
    ) -> StoreResult<Order> {
        if !actor.admin {
            return Err(StoreError::AccessDenied);
        }
        loop {
            let order = self.require_order(order_id).await?;
            if !order.status.can_transition_to(new_status) {
                return Err(StoreError::InvalidTransition {
                    from: order.status,
                    to: new_status,
                });
            }

            let now = Utc::now();
            let was_paid = order.payment_status == OrderPaymentStatus::Completed;
            let mut updated = order.clone();
            match new_status {
                OrderStatus::Shipped => updated.shipped_at = Some(now),
                OrderStatus::Delivered => {
                    updated.delivered_at = Some(now);
                    // Cash on delivery settles at handover
                    if updated.payment_method.is_cod() {
                        updated.payment_status = OrderPaymentStatus::Completed;
                    }
                }
                OrderStatus::Cancelled | OrderStatus::Refunded => {
                    if was_paid {
                        updated.payment_status = OrderPaymentStatus::Refunded;
                    }
                }
                OrderStatus::Pending
                | OrderStatus::Confirmed
                | OrderStatus::Processing
                | OrderStatus::Returned
                | OrderStatus::ReturnRequested => {}
            }
            updated.status = new_status;
            updated.updated_at = now;
            updated.version += 1;

            if !self
                .orders
                .save_if_version(updated.clone(), order.version)
                .await?
            {
                continue;
            }

            // Side effects only for the transition that won the write
            match new_status {
                OrderStatus::Cancelled => {
                    self.restore_stock(
                        &updated,
                        StockChangeType::OrderCancellation,
                        "Order cancelled",
                    )
                    .await;
                    if was_paid {
                        self.payments.refund_for_order(&updated).await?;
                    }
                }
                OrderStatus::Returned => {
                    self.restore_stock(&updated, StockChangeType::OrderReturn, "Order returned")
                        .await;
                }
                OrderStatus::Refunded => {
                    if was_paid {
                        self.payments.refund_for_order(&updated).await?;
                    }
                }
                _ => {}
            }

            tracing::info!(
                order_id = %updated.id,
                order_number = %updated.order_number,
                status = ?new_status,
                "order status updated"
            );
            notification::notify_status_changed(&self.notifier, &updated);
            return Ok(updated);
        }
    }

    /// Requests a return for a delivered order, on behalf of its owner.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the order does not exist.
    /// - [`StoreError::AccessDenied`] if the actor is not the owner.
    /// - [`StoreError::InvalidTransition`] unless the order is delivered.
    pub async fn request_return(&self, order_id: OrderId, actor: Actor) -> StoreResult<Order> {
        loop {
            let order = self.require_order(order_id).await?;
            if order.user_id != actor.user_id {
                return Err(StoreError::AccessDenied);
            }
            if !order
                .status
                .can_transition_to(OrderStatus::ReturnRequested)
            {
                return Err(StoreError::InvalidTransition {
                    from: order.status,
                    to: OrderStatus::ReturnRequested,
                });
            }

            let mut updated = order.clone();
            updated.status = OrderStatus::ReturnRequested;
            updated.updated_at = Utc::now();
            updated.version += 1;

            if !self
                .orders
                .save_if_version(updated.clone(), order.version)
                .await?
            {
                continue;
            }

            notification::notify_status_changed(&self.notifier, &updated);
            return Ok(updated);
        }
    }

    /// Sets the carrier tracking number (admin only)
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the order does not exist.
    /// - [`StoreError::AccessDenied`] for non-admin actors.
    pub async fn update_tracking_number(
        &self,
        order_id: OrderId,
        tracking_number: &str,
        actor: Actor,
    ) -> StoreResult<Order> {
        if !actor.admin {
            return Err(StoreError::AccessDenied);
        }
        loop {
            let order = self.require_order(order_id).await?;
            let mut updated = order.clone();
            updated.tracking_number = Some(tracking_number.to_string());
            updated.updated_at = Utc::now();
            updated.version += 1;

            if self
                .orders
                .save_if_version(updated.clone(), order.version)
                .await?
            {
                return Ok(updated);
            }
        }
    }

    /// Fetches an order, visible to its owner and to admins
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the order does not exist.
    /// - [`StoreError::AccessDenied`] for anyone else.
    pub async fn get_order(&self, order_id: OrderId, actor: Actor) -> StoreResult<Order> {
        let order = self.require_order(order_id).await?;
        if !actor.admin && order.user_id != actor.user_id {
            return Err(StoreError::AccessDenied);
        }
        Ok(order)
    }

    /// A user's order history, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the order store fails.
    pub async fn user_orders(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
        self.orders.for_user(user_id).await
    }

    /// Orders in a given status, newest first (admin only)
    ///
    /// # Errors
    ///
    /// - [`StoreError::AccessDenied`] for non-admin actors.
    pub async fn orders_by_status(
        &self,
        status: OrderStatus,
        actor: Actor,
    ) -> StoreResult<Vec<Order>> {
        if !actor.admin {
            return Err(StoreError::AccessDenied);
        }
        self.orders.by_status(status).await
    }

    async fn require_order(&self, order_id: OrderId) -> StoreResult<Order> {
        self.orders
            .find(order_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "order",
                id: order_id.to_string(),
            })
    }

    /// Deducts every line through the ledger; a mid-sequence failure puts the
    /// already-deducted lines back before surfacing.
    async fn deduct_stock(&self, order: &Order) -> StoreResult<()> {
        for (index, item) in order.items.iter().enumerate() {
            if let Err(err) = self
                .ledger
                .deduct_for_order(item.product_id, item.quantity, &order.order_number)
                .await
            {
                for deducted in &order.items[..index] {
                    self.restore_line(
                        deducted.product_id,
                        deducted.quantity,
                        StockChangeType::OrderCancellation,
                        "Checkout rolled back",
                        &order.order_number,
                    )
                    .await;
                }
                return Err(err);
            }
        }
        Ok(())
    }

    async fn record_redemption(&self, coupon: &Coupon, order: &Order) -> StoreResult<()> {
        self.coupons
            .record_usage(coupon.id, order.user_id, order.id)
            .await
    }

    async fn compensate_redemption(&self, coupon: &Coupon, user_id: UserId) {
        if let Err(err) = self.coupons.revert_usage(coupon.id, user_id).await {
            tracing::error!(
                coupon_id = %coupon.id,
                user_id = %user_id,
                error = %err,
                "failed to revert coupon redemption during checkout rollback"
            );
        }
    }

    async fn compensate_deductions(&self, order: &Order) {
        for item in &order.items {
            self.restore_line(
                item.product_id,
                item.quantity,
                StockChangeType::OrderCancellation,
                "Checkout rolled back",
                &order.order_number,
            )
            .await;
        }
    }

    async fn restore_stock(&self, order: &Order, change_type: StockChangeType, notes: &str) {
        for item in &order.items {
            self.restore_line(
                item.product_id,
                item.quantity,
                change_type,
                notes,
                &order.order_number,
            )
            .await;
        }
    }

    /// Restoration must not abort part-way: a product deleted since purchase
    /// is logged and skipped so the remaining lines still come back.
    async fn restore_line(
        &self,
        product_id: crate::types::ProductId,
        quantity: u32,
        change_type: StockChangeType,
        notes: &str,
        order_number: &str,
    ) {
        if let Err(err) = self
            .ledger
            .adjust_stock(
                product_id,
                i64::from(quantity),
                change_type,
                notes,
                Some(order_number),
            )
            .await
        {
            tracing::error!(
                product_id = %product_id,
                quantity,
                order_number = %order_number,
                error = %err,
                "stock restoration failed"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::OrderItem;

    #[tokio::test]
    async fn orders_listed_newest_first() {
        let store = InMemoryOrderStore::new();
        let user = UserId::new();
        for offset in 0..3 {
            let now = Utc::now() + chrono::Duration::seconds(offset);
            store
                .insert(Order {
                    id: OrderId::new(),
                    order_number: format!("ORD{offset}"),
                    user_id: user,
                    items: vec![sample_item()],
                    shipping_address: sample_address(),
                    subtotal: Money::from_units(10),
                    shipping_cost: Money::ZERO,
                    tax: Money::ZERO,
                    discount_amount: Money::ZERO,
                    coupon_code: None,
                    total_amount: Money::from_units(10),
                    status: OrderStatus::Pending,
                    payment_status: OrderPaymentStatus::Pending,
                    payment_id: None,
                    payment_method: PaymentMethod::Cod,
                    tracking_number: None,
                    notes: None,
                    created_at: now,
                    updated_at: now,
                    shipped_at: None,
                    delivered_at: None,
                    version: 0,
                })
                .await
                .unwrap();
        }

        let orders = store.for_user(user).await.unwrap();
        assert_eq!(orders.len(), 3);
        assert_eq!(orders[0].order_number, "ORD2");
        assert_eq!(orders[2].order_number, "ORD0");
    }

    #[tokio::test]
    async fn versioned_save_rejects_stale_writers() {
        let store = InMemoryOrderStore::new();
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            order_number: "ORD1".to_string(),
            user_id: UserId::new(),
            items: vec![sample_item()],
            shipping_address: sample_address(),
            subtotal: Money::from_units(10),
            shipping_cost: Money::ZERO,
            tax: Money::ZERO,
            discount_amount: Money::ZERO,
            coupon_code: None,
            total_amount: Money::from_units(10),
            status: OrderStatus::Pending,
            payment_status: OrderPaymentStatus::Pending,
            payment_id: None,
            payment_method: PaymentMethod::Cod,
            tracking_number: None,
            notes: None,
            created_at: now,
            updated_at: now,
            shipped_at: None,
            delivered_at: None,
            version: 0,
        };
        store.insert(order.clone()).await.unwrap();

        let mut first = order.clone();
        first.status = OrderStatus::Cancelled;
        first.version = 1;
        assert!(store.save_if_version(first, 0).await.unwrap());

        // A second writer that read version 0 must lose
        let mut second = order.clone();
        second.status = OrderStatus::Confirmed;
        second.version = 1;
        assert!(!store.save_if_version(second, 0).await.unwrap());

        let stored = store.find(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled);
        assert_eq!(stored.version, 1);
    }

    fn sample_item() -> OrderItem {
        OrderItem {
            product_id: crate::types::ProductId::new(),
            product_name: "Widget".to_string(),
            product_image: None,
            price: Money::from_units(10),
            quantity: 1,
            subtotal: Money::from_units(10),
        }
    }

    fn sample_address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Asha Rao".to_string(),
            phone: "9999999999".to_string(),
            street: "1 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "KA".to_string(),
            zip_code: "560001".to_string(),
            country: "IN".to_string(),
        }
    }
}
