//! Inventory ledger: the single choke point for stock mutation.
//!
//! Every stock change goes through [`InventoryLedger::adjust_stock`], which
//! pairs the quantity write with exactly one append-only [`StockHistory`]
//! record. Concurrent adjustments to the same product are serialized through
//! an optimistic compare-and-swap on the product's version field; a plain
//! read-then-write would let two concurrent orders both pass the stock check
//! and oversell.

use crate::catalog::Catalog;
use crate::error::{StoreError, StoreResult};
use crate::types::{Product, ProductId, StockChangeType, StockHistory};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Append-only store for stock history records.
#[async_trait]
pub trait StockHistoryStore: Send + Sync {
    /// Append one record
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn append(&self, record: StockHistory) -> StoreResult<()>;

    /// All records for a product, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn for_product(&self, product_id: ProductId) -> StoreResult<Vec<StockHistory>>;
}

/// In-memory stock history store.
#[derive(Debug, Default)]
pub struct InMemoryStockHistory {
    records: RwLock<Vec<StockHistory>>,
}

impl InMemoryStockHistory {
    /// Creates an empty history store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockHistoryStore for InMemoryStockHistory {
    async fn append(&self, record: StockHistory) -> StoreResult<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn for_product(&self, product_id: ProductId) -> StoreResult<Vec<StockHistory>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|record| record.product_id == product_id)
            .cloned()
            .collect())
    }
}

/// Owns stock mutation and the audit trail of stock changes.
pub struct InventoryLedger {
    catalog: Arc<dyn Catalog>,
    history: Arc<dyn StockHistoryStore>,
}

impl InventoryLedger {
    /// Creates a ledger over the given catalog and history store
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>, history: Arc<dyn StockHistoryStore>) -> Self {
        Self { catalog, history }
    }

    /// Applies a signed stock delta to a product and records it.
    ///
    /// The read-check-write cycle retries on version conflicts until it wins,
    /// so the check and the write are atomic with respect to other callers on
    /// the same product. Rejected adjustments (result below zero) apply
    /// nothing and record nothing.
    ///
    /// Returns the post-change quantity.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the product does not exist.
    /// - [`StoreError::InsufficientStock`] if the delta would drive the
    ///   quantity below zero.
    /// - [`StoreError::Integrity`] if the history append fails after the
    ///   quantity was already written; the error carries the product and
    ///   reference so reconciliation can re-derive the missing record.
    pub async fn adjust_stock(
        &self,
        product_id: ProductId,
        delta: i64,
        change_type: StockChangeType,
        notes: &str,
        reference_id: Option<&str>,
    ) -> StoreResult<u32> {
        loop {
            let product = self
                .catalog
                .get(product_id)
                .await?
                .ok_or_else(|| StoreError::NotFound {
                    entity: "product",
                    id: product_id.to_string(),
                })?;

            let next = i64::from(product.stock_quantity) + delta;
            if next < 0 {
                return Err(StoreError::InsufficientStock {
                    product: product.name,
                    requested: u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX),
                    available: product.stock_quantity,
                });
            }
            let next = u32::try_from(next).map_err(|_| {
                StoreError::Validation(format!("stock overflow for product {product_id}"))
            })?;

            if !self
                .catalog
                .compare_and_swap_stock(product_id, product.version, next)
                .await?
            {
                // Lost the race against another adjustment; re-read and retry.
                continue;
            }

            let record = StockHistory {
                id: Uuid::new_v4(),
                product_id,
                change_quantity: delta,
                new_quantity: next,
                change_type,
                notes: notes.to_string(),
                reference_id: reference_id.map(ToString::to_string),
                timestamp: Utc::now(),
            };
            if let Err(err) = self.history.append(record).await {
                tracing::error!(
                    product_id = %product_id,
                    delta,
                    new_quantity = next,
                    error = %err,
                    "stock quantity written but history append failed"
                );
                return Err(StoreError::Integrity {
                    step: "stock-history-append",
                    reference: product_id.to_string(),
                    detail: err.to_string(),
                });
            }

            tracing::debug!(
                product_id = %product_id,
                delta,
                new_quantity = next,
                change_type = ?change_type,
                "stock adjusted"
            );
            return Ok(next);
        }
    }

    /// Deducts stock when an order commits
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::adjust_stock`].
    pub async fn deduct_for_order(
        &self,
        product_id: ProductId,
        quantity: u32,
        order_number: &str,
    ) -> StoreResult<u32> {
        self.adjust_stock(
            product_id,
            -i64::from(quantity),
            StockChangeType::OrderPlacement,
            "Order placed",
            Some(order_number),
        )
        .await
    }

    /// Restores stock when an order is cancelled
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::adjust_stock`].
    pub async fn restore_for_cancellation(
        &self,
        product_id: ProductId,
        quantity: u32,
        order_number: &str,
    ) -> StoreResult<u32> {
        self.adjust_stock(
            product_id,
            i64::from(quantity),
            StockChangeType::OrderCancellation,
            "Order cancelled",
            Some(order_number),
        )
        .await
    }

    /// Restores stock when a delivered order is returned
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::adjust_stock`].
    pub async fn restore_for_return(
        &self,
        product_id: ProductId,
        quantity: u32,
        order_number: &str,
    ) -> StoreResult<u32> {
        self.adjust_stock(
            product_id,
            i64::from(quantity),
            StockChangeType::OrderReturn,
            "Order returned",
            Some(order_number),
        )
        .await
    }

    /// Adds supplier stock
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::adjust_stock`].
    pub async fn restock(
        &self,
        product_id: ProductId,
        quantity: u32,
        notes: &str,
    ) -> StoreResult<u32> {
        self.adjust_stock(
            product_id,
            i64::from(quantity),
            StockChangeType::Restock,
            notes,
            None,
        )
        .await
    }

    /// Products at or below their low-stock threshold, lowest stock first
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog read fails.
    pub async fn low_stock_alerts(&self) -> StoreResult<Vec<Product>> {
        let mut low: Vec<Product> = self
            .catalog
            .products()
            .await?
            .into_iter()
            .filter(|product| product.stock_quantity <= product.low_stock_threshold)
            .collect();
        low.sort_by_key(|product| product.stock_quantity);
        Ok(low)
    }

    /// The audit trail for one product, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the history store read fails.
    pub async fn history_for(&self, product_id: ProductId) -> StoreResult<Vec<StockHistory>> {
        self.history.for_product(product_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::types::{CategoryId, Money};

    async fn ledger_with_product(stock: u32) -> (InventoryLedger, Arc<InMemoryCatalog>, ProductId) {
        let catalog = InMemoryCatalog::shared();
        let product = Product {
            id: ProductId::new(),
            name: "Widget".to_string(),
            price: Money::from_units(10),
            discount_price: None,
            category_id: CategoryId::new(),
            image: None,
            stock_quantity: stock,
            low_stock_threshold: 2,
            active: true,
            version: 0,
        };
        let id = product.id;
        catalog.upsert(product).await.unwrap();
        let ledger = InventoryLedger::new(
            Arc::clone(&catalog) as Arc<dyn Catalog>,
            Arc::new(InMemoryStockHistory::new()),
        );
        (ledger, catalog, id)
    }

    #[tokio::test]
    async fn adjustment_writes_quantity_and_history_together() {
        let (ledger, catalog, id) = ledger_with_product(10).await;

        let new_qty = ledger
            .adjust_stock(id, -3, StockChangeType::OrderPlacement, "Order placed", Some("ORD1"))
            .await
            .unwrap();
        assert_eq!(new_qty, 7);
        assert_eq!(catalog.get(id).await.unwrap().unwrap().stock_quantity, 7);

        let history = ledger.history_for(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].change_quantity, -3);
        assert_eq!(history[0].new_quantity, 7);
        assert_eq!(history[0].reference_id.as_deref(), Some("ORD1"));
    }

    #[tokio::test]
    async fn negative_result_is_rejected_in_full() {
        let (ledger, catalog, id) = ledger_with_product(2).await;

        let err = ledger
            .adjust_stock(id, -5, StockChangeType::OrderPlacement, "Order placed", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientStock {
                requested: 5,
                available: 2,
                ..
            }
        ));

        // No partial deduction, no ledger record
        assert_eq!(catalog.get(id).await.unwrap().unwrap().stock_quantity, 2);
        assert!(ledger.history_for(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let (ledger, _, _) = ledger_with_product(1).await;
        let err = ledger
            .adjust_stock(
                ProductId::new(),
                1,
                StockChangeType::Restock,
                "Restock",
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "product", .. }));
    }

    #[tokio::test]
    async fn low_stock_alerts_sorted_ascending() {
        let catalog = InMemoryCatalog::shared();
        for (name, stock, threshold) in [("A", 5, 2), ("B", 1, 2), ("C", 2, 2), ("D", 0, 2)] {
            catalog
                .upsert(Product {
                    id: ProductId::new(),
                    name: name.to_string(),
                    price: Money::from_units(1),
                    discount_price: None,
                    category_id: CategoryId::new(),
                    image: None,
                    stock_quantity: stock,
                    low_stock_threshold: threshold,
                    active: true,
                    version: 0,
                })
                .await
                .unwrap();
        }
        let ledger = InventoryLedger::new(
            Arc::clone(&catalog) as Arc<dyn Catalog>,
            Arc::new(InMemoryStockHistory::new()),
        );

        let alerts = ledger.low_stock_alerts().await.unwrap();
        let names: Vec<&str> = alerts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["D", "B", "C"]);
    }
}
