//! Per-user cart mutation.
//!
//! Carts are created lazily on first touch and only ever emptied, never
//! deleted. Line prices are snapshots taken at add/update time; catalog stock
//! is checked against live values but never reserved here; reservation
//! happens at order time, so a race between cart and checkout is possible
//! and is resolved by the order pipeline's second check. Saves replace the
//! whole cart document (last write wins); totals are always recomputed from
//! the full item list before saving.

use crate::catalog::Catalog;
use crate::coupon::CouponValidator;
use crate::error::{StoreError, StoreResult};
use crate::types::{Cart, CartItem, CategoryId, Money, Product, ProductId, UserId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Store for cart documents, one per user.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Fetch a user's cart, if one exists
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn find_by_user(&self, user_id: UserId) -> StoreResult<Option<Cart>>;

    /// Replace the user's cart document in full (last write wins)
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn save(&self, cart: Cart) -> StoreResult<()>;
}

/// In-memory cart store keyed by user.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<UserId, Cart>>,
}

impl InMemoryCartStore {
    /// Creates an empty cart store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn find_by_user(&self, user_id: UserId) -> StoreResult<Option<Cart>> {
        Ok(self.carts.read().await.get(&user_id).cloned())
    }

    async fn save(&self, cart: Cart) -> StoreResult<()> {
        self.carts.write().await.insert(cart.user_id, cart);
        Ok(())
    }
}

/// Cart operations, all scoped to a single user's cart.
pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn Catalog>,
    coupons: Arc<CouponValidator>,
}

impl CartService {
    /// Creates a cart service over the given collaborators
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartStore>,
        catalog: Arc<dyn Catalog>,
        coupons: Arc<CouponValidator>,
    ) -> Self {
        Self {
            carts,
            catalog,
            coupons,
        }
    }

    /// The user's cart, created empty on first access
    ///
    /// # Errors
    ///
    /// Returns an error if the cart store fails.
    pub async fn get_cart(&self, user_id: UserId) -> StoreResult<Cart> {
        self.get_or_create(user_id).await
    }

    /// The user's existing cart, for callers that need one with items
    ///
    /// # Errors
    ///
    /// [`StoreError::EmptyCart`] if the user has no cart at all.
    pub async fn cart_entity(&self, user_id: UserId) -> StoreResult<Cart> {
        self.carts
            .find_by_user(user_id)
            .await?
            .ok_or(StoreError::EmptyCart)
    }

    /// Adds a product to the cart, merging with an existing line.
    ///
    /// The merged quantity is re-checked against live stock, and the line
    /// snapshot (name, image, unit price) is refreshed from the catalog.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Validation`] for a zero quantity.
    /// - [`StoreError::NotFound`] if the product does not exist.
    /// - [`StoreError::ProductUnavailable`] if it is inactive.
    /// - [`StoreError::InsufficientStock`] if stock cannot cover the line.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> StoreResult<Cart> {
        if quantity == 0 {
            return Err(StoreError::Validation(
                "quantity must be greater than zero".to_string(),
            ));
        }

        let mut cart = self.get_or_create(user_id).await?;
        let product = self.require_product(product_id).await?;

        if !product.active {
            return Err(StoreError::ProductUnavailable {
                product: product.name,
            });
        }

        let merged_quantity = cart
            .items
            .iter()
            .find(|item| item.product_id == product_id)
            .map_or(quantity, |item| item.quantity + quantity);

        Self::check_stock(&product, merged_quantity)?;

        let price = product.effective_price();
        let line = CartItem {
            product_id,
            product_name: product.name.clone(),
            product_image: product.image.clone(),
            price,
            quantity: merged_quantity,
            subtotal: price.multiply(merged_quantity),
        };

        match cart
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            Some(existing) => *existing = line,
            None => cart.items.push(line),
        }

        self.finish_mutation(cart).await
    }

    /// Sets a line's quantity; zero or negative removes the line.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the cart, line, or product is missing.
    /// - [`StoreError::InsufficientStock`] if stock cannot cover the new
    ///   quantity.
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> StoreResult<Cart> {
        let mut cart = self.require_cart(user_id).await?;

        let position = cart
            .items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "cart item",
                id: product_id.to_string(),
            })?;

        if quantity <= 0 {
            cart.items.remove(position);
            return self.finish_mutation(cart).await;
        }

        let quantity = quantity.unsigned_abs();
        let product = self.require_product(product_id).await?;
        Self::check_stock(&product, quantity)?;

        let item = &mut cart.items[position];
        item.quantity = quantity;
        item.subtotal = item.price.multiply(quantity);

        self.finish_mutation(cart).await
    }

    /// Removes a line from the cart; removing an absent line is a no-op
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the user has no cart.
    pub async fn remove_item(&self, user_id: UserId, product_id: ProductId) -> StoreResult<Cart> {
        let mut cart = self.require_cart(user_id).await?;
        cart.items.retain(|item| item.product_id != product_id);
        self.finish_mutation(cart).await
    }

    /// Empties the cart; a missing cart is a no-op
    ///
    /// # Errors
    ///
    /// Returns an error if the cart store fails.
    pub async fn clear(&self, user_id: UserId) -> StoreResult<()> {
        let Some(mut cart) = self.carts.find_by_user(user_id).await? else {
            return Ok(());
        };
        cart.items.clear();
        cart.discount = Money::ZERO;
        cart.applied_coupon = None;
        self.finish_mutation(cart).await?;
        Ok(())
    }

    /// Validates a coupon against the cart and stores its discount.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EmptyCart`] if the cart has no items.
    /// - Validator failures ([`StoreError::NotFound`],
    ///   [`StoreError::CouponRejected`]) pass through untouched.
    pub async fn apply_coupon(&self, user_id: UserId, code: &str) -> StoreResult<Cart> {
        let mut cart = self.get_or_create(user_id).await?;
        if cart.is_empty() {
            return Err(StoreError::EmptyCart);
        }

        let product_ids = cart.product_ids();
        let mut category_ids: Vec<CategoryId> = Vec::with_capacity(product_ids.len());
        for product_id in &product_ids {
            if let Some(product) = self.catalog.get(*product_id).await? {
                category_ids.push(product.category_id);
            }
        }

        let coupon = self
            .coupons
            .validate(code, cart.total_price, &product_ids, &category_ids, user_id)
            .await?;
        let discount = CouponValidator::calculate_discount(&coupon, cart.total_price);

        cart.applied_coupon = Some(coupon.code);
        cart.discount = discount;
        self.finish_mutation(cart).await
    }

    /// Clears any applied coupon and its discount
    ///
    /// # Errors
    ///
    /// Returns an error if the cart store fails.
    pub async fn remove_coupon(&self, user_id: UserId) -> StoreResult<Cart> {
        let mut cart = self.get_or_create(user_id).await?;
        cart.applied_coupon = None;
        cart.discount = Money::ZERO;
        self.finish_mutation(cart).await
    }

    async fn get_or_create(&self, user_id: UserId) -> StoreResult<Cart> {
        if let Some(cart) = self.carts.find_by_user(user_id).await? {
            return Ok(cart);
        }
        let cart = Cart::new(user_id, Utc::now());
        self.carts.save(cart.clone()).await?;
        Ok(cart)
    }

    async fn require_cart(&self, user_id: UserId) -> StoreResult<Cart> {
        self.carts
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "cart",
                id: user_id.to_string(),
            })
    }

    async fn require_product(&self, product_id: ProductId) -> StoreResult<Product> {
        self.catalog
            .get(product_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "product",
                id: product_id.to_string(),
            })
    }

    fn check_stock(product: &Product, requested: u32) -> StoreResult<()> {
        if product.stock_quantity < requested {
            return Err(StoreError::InsufficientStock {
                product: product.name.clone(),
                requested,
                available: product.stock_quantity,
            });
        }
        Ok(())
    }

    /// Every mutation funnels through here: recompute totals from the full
    /// item list, stamp the update time, replace the document.
    async fn finish_mutation(&self, mut cart: Cart) -> StoreResult<Cart> {
        cart.recalculate_totals();
        cart.updated_at = Utc::now();
        self.carts.save(cart.clone()).await?;
        Ok(cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::coupon::{
        CouponStore, CouponUsageStore, InMemoryCouponStore, InMemoryCouponUsageStore,
    };
    use crate::types::{Coupon, Discount};

    struct Fixture {
        service: CartService,
        catalog: Arc<InMemoryCatalog>,
        coupons: Arc<InMemoryCouponStore>,
    }

    fn fixture() -> Fixture {
        let catalog = InMemoryCatalog::shared();
        let coupons = Arc::new(InMemoryCouponStore::new());
        let validator = Arc::new(CouponValidator::new(
            Arc::clone(&coupons) as Arc<dyn CouponStore>,
            Arc::new(InMemoryCouponUsageStore::new()) as Arc<dyn CouponUsageStore>,
        ));
        let service = CartService::new(
            Arc::new(InMemoryCartStore::new()),
            Arc::clone(&catalog) as Arc<dyn Catalog>,
            validator,
        );
        Fixture {
            service,
            catalog,
            coupons,
        }
    }

    async fn seed_product(catalog: &InMemoryCatalog, price: Money, stock: u32) -> ProductId {
        let product = Product {
            id: ProductId::new(),
            name: "Widget".to_string(),
            price,
            discount_price: None,
            category_id: CategoryId::new(),
            image: Some("widget.png".to_string()),
            stock_quantity: stock,
            low_stock_threshold: 1,
            active: true,
            version: 0,
        };
        let id = product.id;
        catalog.upsert(product).await.unwrap();
        id
    }

    #[tokio::test]
    async fn cart_is_created_lazily() {
        let fx = fixture();
        let user = UserId::new();
        let cart = fx.service.get_cart(user).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Money::ZERO);
    }

    #[tokio::test]
    async fn add_snapshots_price_and_merges_lines() {
        let fx = fixture();
        let user = UserId::new();
        let product_id = seed_product(&fx.catalog, Money::from_units(10), 10).await;

        fx.service.add_item(user, product_id, 2).await.unwrap();

        // A later catalog price change must not alter the existing line
        let mut product = fx.catalog.get(product_id).await.unwrap().unwrap();
        product.price = Money::from_units(99);
        fx.catalog.upsert(product).await.unwrap();

        let cart = fx.service.get_cart(user).await.unwrap();
        assert_eq!(cart.items[0].price, Money::from_units(10));
        assert_eq!(cart.total_price, Money::from_units(20));

        // Merging refreshes the snapshot and re-checks the combined quantity
        let cart = fx.service.add_item(user, product_id, 3).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.items[0].price, Money::from_units(99));
        assert_eq!(cart.total_items, 5);
    }

    #[tokio::test]
    async fn add_rejects_inactive_and_oversized() {
        let fx = fixture();
        let user = UserId::new();
        let product_id = seed_product(&fx.catalog, Money::from_units(10), 3).await;

        let err = fx.service.add_item(user, product_id, 4).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { .. }));

        // Merged quantity over stock is rejected too
        fx.service.add_item(user, product_id, 2).await.unwrap();
        let err = fx.service.add_item(user, product_id, 2).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { .. }));

        let mut product = fx.catalog.get(product_id).await.unwrap().unwrap();
        product.active = false;
        fx.catalog.upsert(product).await.unwrap();
        let err = fx.service.add_item(user, product_id, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::ProductUnavailable { .. }));
    }

    #[tokio::test]
    async fn update_quantity_zero_removes_line() {
        let fx = fixture();
        let user = UserId::new();
        let product_id = seed_product(&fx.catalog, Money::from_units(10), 10).await;

        fx.service.add_item(user, product_id, 2).await.unwrap();
        let cart = fx
            .service
            .update_quantity(user, product_id, 0)
            .await
            .unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items, 0);
        assert_eq!(cart.total_price, Money::ZERO);
    }

    #[tokio::test]
    async fn update_quantity_rewrites_subtotal() {
        let fx = fixture();
        let user = UserId::new();
        let product_id = seed_product(&fx.catalog, Money::from_units(10), 10).await;

        fx.service.add_item(user, product_id, 2).await.unwrap();
        let cart = fx
            .service
            .update_quantity(user, product_id, 7)
            .await
            .unwrap();
        assert_eq!(cart.items[0].subtotal, Money::from_units(70));
        assert_eq!(cart.total_price, Money::from_units(70));

        let err = fx
            .service
            .update_quantity(user, product_id, 11)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { .. }));
    }

    #[tokio::test]
    async fn coupon_on_empty_cart_is_rejected() {
        let fx = fixture();
        let err = fx
            .service
            .apply_coupon(UserId::new(), "OFF10")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyCart));
    }

    #[tokio::test]
    async fn apply_and_remove_coupon() {
        let fx = fixture();
        let user = UserId::new();
        let product_id = seed_product(&fx.catalog, Money::from_units(100), 10).await;
        fx.service.add_item(user, product_id, 1).await.unwrap();

        let mut coupon = Coupon::new("OFF10", Discount::Percentage(10));
        coupon.max_discount_amount = Some(Money::from_units(50));
        fx.coupons.upsert(coupon).await.unwrap();

        let cart = fx.service.apply_coupon(user, "OFF10").await.unwrap();
        assert_eq!(cart.applied_coupon.as_deref(), Some("OFF10"));
        assert_eq!(cart.discount, Money::from_units(10));
        assert_eq!(cart.total_price, Money::from_units(90));

        let cart = fx.service.remove_coupon(user).await.unwrap();
        assert!(cart.applied_coupon.is_none());
        assert_eq!(cart.discount, Money::ZERO);
        assert_eq!(cart.total_price, Money::from_units(100));
    }

    #[tokio::test]
    async fn clear_empties_but_keeps_cart() {
        let fx = fixture();
        let user = UserId::new();
        let product_id = seed_product(&fx.catalog, Money::from_units(10), 10).await;

        fx.service.add_item(user, product_id, 2).await.unwrap();
        fx.service.clear(user).await.unwrap();

        let cart = fx.service.get_cart(user).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Money::ZERO);
        assert!(cart.applied_coupon.is_none());
    }
}
