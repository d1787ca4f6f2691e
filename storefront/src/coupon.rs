//! Coupon validation, discount computation, and redemption recording.
//!
//! Validation is a stateless rules pass; redemption is the mutating half and
//! has the same race class as stock: two concurrent redemptions against a
//! coupon's last remaining use must not both succeed. The store's
//! limit-guarded increment is atomic per coupon, and the `(coupon, user)`
//! uniqueness constraint is enforced at the storage layer as the backstop.

use crate::error::{CouponRejection, StoreError, StoreResult};
use crate::types::{CategoryId, Coupon, CouponId, CouponUsage, Discount, Money, OrderId, ProductId, UserId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Store for coupon documents.
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Look a coupon up by its redemption code
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Coupon>>;

    /// Look a coupon up by id
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn find_by_id(&self, id: CouponId) -> StoreResult<Option<Coupon>>;

    /// Insert or replace a coupon document
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn upsert(&self, coupon: Coupon) -> StoreResult<()>;

    /// Atomically increments `used_count` iff the usage limit is not yet
    /// reached. Returns `false` when the limit blocks the increment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the coupon does not exist.
    async fn try_increment_usage(&self, id: CouponId) -> StoreResult<bool>;

    /// Reverses one increment (compensation path only)
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the coupon does not exist.
    async fn decrement_usage(&self, id: CouponId) -> StoreResult<()>;
}

/// Store for coupon redemption records, unique per `(coupon, user)`.
#[async_trait]
pub trait CouponUsageStore: Send + Sync {
    /// Whether this user has already redeemed this coupon
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn exists(&self, coupon_id: CouponId, user_id: UserId) -> StoreResult<bool>;

    /// Inserts a usage record, enforcing the `(coupon, user)` uniqueness
    /// constraint. Returns `false` if a record already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn insert_unique(&self, usage: CouponUsage) -> StoreResult<bool>;

    /// Removes a usage record (compensation path only)
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    async fn remove(&self, coupon_id: CouponId, user_id: UserId) -> StoreResult<()>;
}

/// In-memory coupon store.
#[derive(Debug, Default)]
pub struct InMemoryCouponStore {
    coupons: RwLock<HashMap<CouponId, Coupon>>,
}

impl InMemoryCouponStore {
    /// Creates an empty coupon store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponStore for InMemoryCouponStore {
    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Coupon>> {
        Ok(self
            .coupons
            .read()
            .await
            .values()
            .find(|coupon| coupon.code == code)
            .cloned())
    }

    async fn find_by_id(&self, id: CouponId) -> StoreResult<Option<Coupon>> {
        Ok(self.coupons.read().await.get(&id).cloned())
    }

    async fn upsert(&self, coupon: Coupon) -> StoreResult<()> {
        self.coupons.write().await.insert(coupon.id, coupon);
        Ok(())
    }

    async fn try_increment_usage(&self, id: CouponId) -> StoreResult<bool> {
        let mut coupons = self.coupons.write().await;
        let coupon = coupons.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            entity: "coupon",
            id: id.to_string(),
        })?;

        if coupon
            .usage_limit
            .is_some_and(|limit| coupon.used_count >= limit)
        {
            return Ok(false);
        }
        coupon.used_count += 1;
        Ok(true)
    }

    async fn decrement_usage(&self, id: CouponId) -> StoreResult<()> {
        let mut coupons = self.coupons.write().await;
        let coupon = coupons.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            entity: "coupon",
            id: id.to_string(),
        })?;
        coupon.used_count = coupon.used_count.saturating_sub(1);
        Ok(())
    }
}

/// In-memory usage store keyed on `(coupon, user)`.
#[derive(Debug, Default)]
pub struct InMemoryCouponUsageStore {
    usages: RwLock<HashMap<(CouponId, UserId), CouponUsage>>,
}

impl InMemoryCouponUsageStore {
    /// Creates an empty usage store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponUsageStore for InMemoryCouponUsageStore {
    async fn exists(&self, coupon_id: CouponId, user_id: UserId) -> StoreResult<bool> {
        Ok(self
            .usages
            .read()
            .await
            .contains_key(&(coupon_id, user_id)))
    }

    async fn insert_unique(&self, usage: CouponUsage) -> StoreResult<bool> {
        let mut usages = self.usages.write().await;
        let key = (usage.coupon_id, usage.user_id);
        if usages.contains_key(&key) {
            return Ok(false);
        }
        usages.insert(key, usage);
        Ok(true)
    }

    async fn remove(&self, coupon_id: CouponId, user_id: UserId) -> StoreResult<()> {
        self.usages.write().await.remove(&(coupon_id, user_id));
        Ok(())
    }
}

/// Checks a coupon's applicability and records redemptions.
pub struct CouponValidator {
    coupons: Arc<dyn CouponStore>,
    usages: Arc<dyn CouponUsageStore>,
}

impl CouponValidator {
    /// Creates a validator over the given stores
    #[must_use]
    pub fn new(coupons: Arc<dyn CouponStore>, usages: Arc<dyn CouponUsageStore>) -> Self {
        Self { coupons, usages }
    }

    /// Validates a coupon for the given order, short-circuiting on the first
    /// failing check: existence, active flag, validity window, minimum order
    /// amount, usage limit, per-user single use, then product and category
    /// applicability.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unknown codes, otherwise
    /// [`StoreError::CouponRejected`] naming the failing check.
    pub async fn validate(
        &self,
        code: &str,
        order_amount: Money,
        product_ids: &[ProductId],
        category_ids: &[CategoryId],
        user_id: UserId,
    ) -> StoreResult<Coupon> {
        let coupon = self
            .coupons
            .find_by_code(code)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "coupon",
                id: code.to_string(),
            })?;

        if !coupon.active {
            return Err(CouponRejection::Inactive.into());
        }

        let now = Utc::now();
        if coupon.start_date.is_some_and(|start| now < start) {
            return Err(CouponRejection::NotYetValid.into());
        }
        if coupon.expiry_date.is_some_and(|expiry| now > expiry) {
            return Err(CouponRejection::Expired.into());
        }

        if let Some(required) = coupon.min_order_amount {
            if order_amount < required {
                return Err(CouponRejection::BelowMinimum { required }.into());
            }
        }

        if coupon
            .usage_limit
            .is_some_and(|limit| coupon.used_count >= limit)
        {
            return Err(CouponRejection::LimitReached.into());
        }

        if self.usages.exists(coupon.id, user_id).await? {
            return Err(CouponRejection::AlreadyUsed.into());
        }

        if !coupon.applicable_product_ids.is_empty()
            && !product_ids
                .iter()
                .any(|id| coupon.applicable_product_ids.contains(id))
        {
            return Err(CouponRejection::NotApplicable.into());
        }

        if !coupon.applicable_category_ids.is_empty()
            && !category_ids
                .iter()
                .any(|id| coupon.applicable_category_ids.contains(id))
        {
            return Err(CouponRejection::NotApplicable.into());
        }

        Ok(coupon)
    }

    /// Computes the discount a coupon grants on `order_amount`.
    ///
    /// Percentage discounts round half-up to the cent; the result is clamped
    /// to `max_discount_amount` and then to the order amount itself, so a
    /// discount never exceeds the total and never goes negative.
    #[must_use]
    pub fn calculate_discount(coupon: &Coupon, order_amount: Money) -> Money {
        let discount = match coupon.discount {
            Discount::Percentage(percent) => order_amount.percent_half_up(percent),
            Discount::FixedAmount(amount) => amount,
        };

        let discount = match coupon.max_discount_amount {
            Some(cap) => discount.min(cap),
            None => discount,
        };

        discount.min(order_amount)
    }

    /// Records one redemption: limit-guarded increment of `used_count` plus
    /// the unique `(coupon, user)` usage record. A duplicate redemption rolls
    /// the increment back and fails, so the counter never drifts from the
    /// usage records.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the coupon vanished.
    /// - [`CouponRejection::LimitReached`] if the limit blocks the increment.
    /// - [`CouponRejection::AlreadyUsed`] if this user already redeemed it.
    pub async fn record_usage(
        &self,
        coupon_id: CouponId,
        user_id: UserId,
        order_id: OrderId,
    ) -> StoreResult<()> {
        if !self.coupons.try_increment_usage(coupon_id).await? {
            return Err(CouponRejection::LimitReached.into());
        }

        let usage = CouponUsage {
            coupon_id,
            user_id,
            order_id,
            used_at: Utc::now(),
        };
        if !self.usages.insert_unique(usage).await? {
            // Storage-layer uniqueness caught a concurrent duplicate; undo
            // the increment so the counter matches the records.
            self.coupons.decrement_usage(coupon_id).await?;
            return Err(CouponRejection::AlreadyUsed.into());
        }

        tracing::info!(
            coupon_id = %coupon_id,
            user_id = %user_id,
            order_id = %order_id,
            "coupon usage recorded"
        );
        Ok(())
    }

    /// Reverses a recorded redemption (order-pipeline compensation only)
    ///
    /// # Errors
    ///
    /// Returns an error if either store fails.
    pub async fn revert_usage(&self, coupon_id: CouponId, user_id: UserId) -> StoreResult<()> {
        self.usages.remove(coupon_id, user_id).await?;
        self.coupons.decrement_usage(coupon_id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn validator() -> (CouponValidator, Arc<InMemoryCouponStore>) {
        let coupons = Arc::new(InMemoryCouponStore::new());
        let usages = Arc::new(InMemoryCouponUsageStore::new());
        (
            CouponValidator::new(
                Arc::clone(&coupons) as Arc<dyn CouponStore>,
                usages as Arc<dyn CouponUsageStore>,
            ),
            coupons,
        )
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let (validator, _) = validator();
        let err = validator
            .validate("NOPE", Money::from_units(100), &[], &[], UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "coupon", .. }));
    }

    #[tokio::test]
    async fn inactive_coupon_is_rejected() {
        let (validator, coupons) = validator();
        let mut coupon = Coupon::new("OFF10", Discount::Percentage(10));
        coupon.active = false;
        coupons.upsert(coupon).await.unwrap();

        let err = validator
            .validate("OFF10", Money::from_units(100), &[], &[], UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::CouponRejected(CouponRejection::Inactive)
        ));
    }

    #[tokio::test]
    async fn validity_window_is_enforced() {
        let (validator, coupons) = validator();
        let now = Utc::now();

        let mut early = Coupon::new("EARLY", Discount::Percentage(10));
        early.start_date = Some(now + Duration::hours(1));
        coupons.upsert(early).await.unwrap();

        let mut late = Coupon::new("LATE", Discount::Percentage(10));
        late.expiry_date = Some(now - Duration::hours(1));
        coupons.upsert(late).await.unwrap();

        let err = validator
            .validate("EARLY", Money::from_units(100), &[], &[], UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::CouponRejected(CouponRejection::NotYetValid)
        ));

        let err = validator
            .validate("LATE", Money::from_units(100), &[], &[], UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::CouponRejected(CouponRejection::Expired)
        ));
    }

    #[tokio::test]
    async fn minimum_order_amount_is_enforced() {
        let (validator, coupons) = validator();
        let mut coupon = Coupon::new("MIN100", Discount::Percentage(10));
        coupon.min_order_amount = Some(Money::from_units(100));
        coupons.upsert(coupon).await.unwrap();

        let err = validator
            .validate("MIN100", Money::from_units(99), &[], &[], UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::CouponRejected(CouponRejection::BelowMinimum { .. })
        ));

        assert!(validator
            .validate("MIN100", Money::from_units(100), &[], &[], UserId::new())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn product_and_category_restrictions() {
        let (validator, coupons) = validator();
        let product = ProductId::new();
        let category = CategoryId::new();

        let mut coupon = Coupon::new("SCOPED", Discount::Percentage(10));
        coupon.applicable_product_ids.insert(product);
        coupons.upsert(coupon).await.unwrap();

        let mut by_category = Coupon::new("CAT", Discount::Percentage(10));
        by_category.applicable_category_ids.insert(category);
        coupons.upsert(by_category).await.unwrap();

        // Wrong product
        let err = validator
            .validate(
                "SCOPED",
                Money::from_units(100),
                &[ProductId::new()],
                &[],
                UserId::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::CouponRejected(CouponRejection::NotApplicable)
        ));

        // Matching product
        assert!(validator
            .validate("SCOPED", Money::from_units(100), &[product], &[], UserId::new())
            .await
            .is_ok());

        // Matching category
        assert!(validator
            .validate(
                "CAT",
                Money::from_units(100),
                &[ProductId::new()],
                &[category],
                UserId::new(),
            )
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn percentage_discount_clamped_to_cap() {
        // 10% of 1000.00 is 100.00, capped at 50.00
        let mut coupon = Coupon::new("OFF10", Discount::Percentage(10));
        coupon.min_order_amount = Some(Money::from_units(100));
        coupon.max_discount_amount = Some(Money::from_units(50));

        let discount = CouponValidator::calculate_discount(&coupon, Money::from_units(1000));
        assert_eq!(discount, Money::from_units(50));
    }

    #[tokio::test]
    async fn fixed_discount_never_exceeds_order_amount() {
        let coupon = Coupon::new("FLAT200", Discount::FixedAmount(Money::from_units(200)));
        let discount = CouponValidator::calculate_discount(&coupon, Money::from_units(120));
        assert_eq!(discount, Money::from_units(120));
    }

    #[tokio::test]
    async fn redemption_is_single_use_per_user() {
        let (validator, coupons) = validator();
        let coupon = Coupon::new("ONCE", Discount::Percentage(5));
        let coupon_id = coupon.id;
        coupons.upsert(coupon).await.unwrap();

        let user = UserId::new();
        validator
            .record_usage(coupon_id, user, OrderId::new())
            .await
            .unwrap();

        let err = validator
            .record_usage(coupon_id, user, OrderId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::CouponRejected(CouponRejection::AlreadyUsed)
        ));

        // The failed duplicate rolled its increment back
        let stored = coupons.find_by_id(coupon_id).await.unwrap().unwrap();
        assert_eq!(stored.used_count, 1);

        // And validation now rejects the user up front
        let err = validator
            .validate("ONCE", Money::from_units(100), &[], &[], user)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::CouponRejected(CouponRejection::AlreadyUsed)
        ));
    }

    #[tokio::test]
    async fn usage_limit_blocks_redemption() {
        let (validator, coupons) = validator();
        let mut coupon = Coupon::new("LIMIT1", Discount::Percentage(5));
        coupon.usage_limit = Some(1);
        let coupon_id = coupon.id;
        coupons.upsert(coupon).await.unwrap();

        validator
            .record_usage(coupon_id, UserId::new(), OrderId::new())
            .await
            .unwrap();

        let err = validator
            .record_usage(coupon_id, UserId::new(), OrderId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::CouponRejected(CouponRejection::LimitReached)
        ));
    }
}
