//! Catalog collaborator interface.
//!
//! Product CRUD, search, and categorization live outside this subsystem; the
//! core only needs price/availability reads and a version-guarded stock write
//! for the inventory ledger. The in-memory implementation stands in for the
//! document store in tests and demos.

use crate::error::{StoreError, StoreResult};
use crate::types::{Product, ProductId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Read/write surface the core needs from the product catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch a product by id
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn get(&self, id: ProductId) -> StoreResult<Option<Product>>;

    /// Whether a product with this id exists
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn exists(&self, id: ProductId) -> StoreResult<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// All products, in no particular order
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn products(&self) -> StoreResult<Vec<Product>>;

    /// Insert or replace a product document
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn upsert(&self, product: Product) -> StoreResult<()>;

    /// Write a new stock quantity iff the product's version still matches
    /// `expected_version`, bumping the version on success.
    ///
    /// Returns `false` on a version conflict (the caller re-reads and
    /// retries). This is the only stock-write path, and only the inventory
    /// ledger may call it; going around the ledger loses the history record
    /// that must accompany every stock change.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the product does not exist.
    async fn compare_and_swap_stock(
        &self,
        id: ProductId,
        expected_version: u64,
        new_quantity: u32,
    ) -> StoreResult<bool>;
}

/// In-memory catalog backed by a `RwLock`-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn upsert(&self, product: Product) -> StoreResult<()> {
        self.products.write().await.insert(product.id, product);
        Ok(())
    }

    async fn compare_and_swap_stock(
        &self,
        id: ProductId,
        expected_version: u64,
        new_quantity: u32,
    ) -> StoreResult<bool> {
        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            entity: "product",
            id: id.to_string(),
        })?;

        if product.version != expected_version {
            return Ok(false);
        }

        product.stock_quantity = new_quantity;
        product.version += 1;
        Ok(true)
    }
}
