//! Application wiring.
//!
//! [`Store`] assembles the services over a set of stores and collaborators.
//! The in-memory constructors are what the test suite and local development
//! use; a deployment would construct the same graph over persistent store
//! implementations.

use crate::cart::{CartService, CartStore, InMemoryCartStore};
use crate::catalog::{Catalog, InMemoryCatalog};
use crate::config::Config;
use crate::coupon::{
    CouponStore, CouponUsageStore, CouponValidator, InMemoryCouponStore, InMemoryCouponUsageStore,
};
use crate::inventory::{InMemoryStockHistory, InventoryLedger, StockHistoryStore};
use crate::notification::{LoggingNotifier, Notifier};
use crate::order::{InMemoryOrderStore, OrderPipeline, OrderStore};
use crate::payment::{
    InMemoryPaymentStore, MockPaymentGateway, PaymentGateway, PaymentProcessor, PaymentStore,
};
use std::sync::Arc;

/// The assembled storefront backend.
///
/// Holds shared handles to every service; cloning handles out of it is cheap.
pub struct Store {
    /// Product catalog
    pub catalog: Arc<dyn Catalog>,
    /// Stock mutation and audit trail
    pub ledger: Arc<InventoryLedger>,
    /// Coupon validation and redemption
    pub coupons: Arc<CouponValidator>,
    /// Coupon document store (admin-side coupon management)
    pub coupon_store: Arc<dyn CouponStore>,
    /// Cart operations
    pub carts: Arc<CartService>,
    /// Checkout and order lifecycle
    pub orders: Arc<OrderPipeline>,
    /// Payment settlement and records
    pub payments: Arc<PaymentProcessor>,
}

impl Store {
    /// Builds a store over in-memory stores and the mock payment gateway
    #[must_use]
    pub fn in_memory(config: Config) -> Self {
        Self::with_gateway(config, MockPaymentGateway::shared())
    }

    /// Builds an in-memory store over the given payment gateway.
    ///
    /// Tests use this to inject declining or timing-out gateways.
    #[must_use]
    pub fn with_gateway(config: Config, gateway: Arc<dyn PaymentGateway>) -> Self {
        let catalog: Arc<dyn Catalog> = Arc::new(InMemoryCatalog::new());
        let history: Arc<dyn StockHistoryStore> = Arc::new(InMemoryStockHistory::new());
        let coupon_store: Arc<dyn CouponStore> = Arc::new(InMemoryCouponStore::new());
        let usage_store: Arc<dyn CouponUsageStore> = Arc::new(InMemoryCouponUsageStore::new());
        let cart_store: Arc<dyn CartStore> = Arc::new(InMemoryCartStore::new());
        let order_store: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());
        let payment_store: Arc<dyn PaymentStore> = Arc::new(InMemoryPaymentStore::new());
        let notifier: Arc<dyn Notifier> = LoggingNotifier::shared();

        let ledger = Arc::new(InventoryLedger::new(
            Arc::clone(&catalog),
            Arc::clone(&history),
        ));
        let coupons = Arc::new(CouponValidator::new(
            Arc::clone(&coupon_store),
            Arc::clone(&usage_store),
        ));
        let carts = Arc::new(CartService::new(
            Arc::clone(&cart_store),
            Arc::clone(&catalog),
            Arc::clone(&coupons),
        ));
        let payments = Arc::new(PaymentProcessor::new(
            Arc::clone(&payment_store),
            Arc::clone(&order_store),
            gateway,
            Arc::clone(&notifier),
            config.payment.currency.clone(),
        ));
        let orders = Arc::new(OrderPipeline::new(
            Arc::clone(&order_store),
            Arc::clone(&carts),
            Arc::clone(&catalog),
            Arc::clone(&ledger),
            Arc::clone(&coupons),
            Arc::clone(&payments),
            Arc::clone(&notifier),
            config.pricing,
        ));

        Self {
            catalog,
            ledger,
            coupons,
            coupon_store,
            carts,
            orders,
            payments,
        }
    }
}
