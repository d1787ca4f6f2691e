//! Domain types for the storefront backend.
//!
//! Value objects, entities, and state types for carts, coupons, orders,
//! payments, and the inventory ledger. Monetary amounts are cents-based to
//! avoid floating-point errors; every price captured in a cart or order line
//! is an immutable snapshot taken at add-time, never a live reference into
//! the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a product
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Creates a new random `ProductId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ProductId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(Uuid);

impl CategoryId {
    /// Creates a new random `CategoryId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random `OrderId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OrderId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a coupon
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CouponId(Uuid);

impl CouponId {
    /// Creates a new random `CouponId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CouponId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CouponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a payment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(Uuid);

impl PaymentId {
    /// Creates a new random `PaymentId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole currency units
    ///
    /// # Panics
    ///
    /// Panics if the conversion would overflow (`units * 100 > u64::MAX`).
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn from_units(units: u64) -> Self {
        match units.checked_mul(100) {
            Some(cents) => Self(cents),
            None => panic!("Money::from_units overflow"),
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Adds two money amounts
    ///
    /// # Panics
    ///
    /// Panics if the addition would overflow.
    /// Use `checked_add` for non-panicking addition.
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn add(self, other: Self) -> Self {
        match self.checked_add(other) {
            Some(result) => result,
            None => panic!("Money::add overflow"),
        }
    }

    /// Subtracts `other`, clamping at zero instead of going negative
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies money by a quantity
    ///
    /// # Panics
    ///
    /// Panics if the multiplication would overflow.
    /// Use `checked_multiply` for non-panicking multiplication.
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn multiply(self, quantity: u32) -> Self {
        match self.checked_multiply(quantity) {
            Some(result) => result,
            None => panic!("Money::multiply overflow"),
        }
    }

    /// Computes `percent`% of this amount, rounded half-up to the cent
    #[must_use]
    pub fn percent_half_up(self, percent: u32) -> Self {
        let product = u128::from(self.0) * u128::from(percent);
        let rounded = (product + 50) / 100;
        Self(u64::try_from(rounded).unwrap_or(u64::MAX))
    }

    /// Returns the smaller of two amounts
    #[must_use]
    pub const fn min(self, other: Self) -> Self {
        if self.0 <= other.0 { self } else { other }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Identity (external collaborator surface)
// ============================================================================

/// The authenticated caller of an operation.
///
/// Identity lookup itself is an external concern; the pipeline only needs the
/// user id and whether the caller holds the admin role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The acting user
    pub user_id: UserId,
    /// Whether the caller holds the admin role
    pub admin: bool,
}

impl Actor {
    /// A regular customer
    #[must_use]
    pub const fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            admin: false,
        }
    }

    /// An administrator
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            admin: true,
        }
    }
}

// ============================================================================
// Catalog Entities
// ============================================================================

/// Product entity as seen by this subsystem.
///
/// Owned by the catalog collaborator; the core only reads price and
/// availability and writes `stock_quantity` through the inventory ledger.
/// `version` backs the ledger's optimistic compare-and-swap on stock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product identifier
    pub id: ProductId,
    /// Product name
    pub name: String,
    /// Regular price
    pub price: Money,
    /// Promotional price; when set it wins over `price` for cart snapshots
    pub discount_price: Option<Money>,
    /// Category the product belongs to
    pub category_id: CategoryId,
    /// Primary product image, if any
    pub image: Option<String>,
    /// Units currently in stock (ledger-owned)
    pub stock_quantity: u32,
    /// Stock level at or below which the product appears in low-stock alerts
    pub low_stock_threshold: u32,
    /// Whether the product can be sold
    pub active: bool,
    /// Optimistic concurrency version, bumped on every stock write
    pub version: u64,
}

impl Product {
    /// The price a cart line snapshots: the promotional price if present
    #[must_use]
    pub fn effective_price(&self) -> Money {
        self.discount_price.unwrap_or(self.price)
    }
}

// ============================================================================
// Cart
// ============================================================================

/// A single line in a cart.
///
/// Name, image, and price are snapshots taken when the line was added or
/// updated; catalog changes do not retroactively alter the line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product the line refers to
    pub product_id: ProductId,
    /// Product name at snapshot time
    pub product_name: String,
    /// Product image at snapshot time
    pub product_image: Option<String>,
    /// Unit price at snapshot time
    pub price: Money,
    /// Quantity selected (always > 0)
    pub quantity: u32,
    /// `price * quantity`
    pub subtotal: Money,
}

/// Per-user staging area of selected products before order creation.
///
/// At most one cart exists per user. Carts are created lazily on first touch
/// and never hard-deleted, only emptied. Totals are always recomputed from
/// the item list as a whole, never incrementally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Owning user (unique per cart)
    pub user_id: UserId,
    /// Cart lines, one per product
    pub items: Vec<CartItem>,
    /// `max(0, Σ subtotal − discount)`
    pub total_price: Money,
    /// `Σ quantity`
    pub total_items: u32,
    /// Discount computed from the applied coupon
    pub discount: Money,
    /// Code of the applied coupon, if any
    pub applied_coupon: Option<String>,
    /// When the cart was created
    pub created_at: DateTime<Utc>,
    /// When the cart was last mutated
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for `user_id`
    #[must_use]
    pub const fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            total_price: Money::ZERO,
            total_items: 0,
            discount: Money::ZERO,
            applied_coupon: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of line subtotals, before any discount
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items
            .iter()
            .fold(Money::ZERO, |acc, item| acc.add(item.subtotal))
    }

    /// Product ids of all lines
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.items.iter().map(|item| item.product_id).collect()
    }

    /// Recomputes `total_items` and `total_price` from the item list.
    ///
    /// Always a full fold over the lines so the totals cannot drift from the
    /// items under partial updates.
    pub fn recalculate_totals(&mut self) {
        self.total_items = self.items.iter().map(|item| item.quantity).sum();
        self.total_price = self.subtotal().saturating_sub(self.discount);
    }
}

// ============================================================================
// Coupons
// ============================================================================

/// How a coupon reduces the order total
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Discount {
    /// Percentage of the order amount (half-up rounded to the cent)
    Percentage(u32),
    /// Flat amount off the order
    FixedAmount(Money),
}

/// Promotional code reducing an order total, subject to eligibility and
/// usage-limit rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Unique coupon identifier
    pub id: CouponId,
    /// Unique redemption code
    pub code: String,
    /// Discount rule
    pub discount: Discount,
    /// Minimum order amount required, if any
    pub min_order_amount: Option<Money>,
    /// Cap on the computed discount, if any
    pub max_discount_amount: Option<Money>,
    /// Start of the validity window (absent = unbounded)
    pub start_date: Option<DateTime<Utc>>,
    /// End of the validity window (absent = unbounded)
    pub expiry_date: Option<DateTime<Utc>>,
    /// Maximum total redemptions across all users, if any
    pub usage_limit: Option<u32>,
    /// Redemptions so far; monotonically increasing, never above `usage_limit`
    pub used_count: u32,
    /// Whether the coupon can currently be redeemed
    pub active: bool,
    /// Products the coupon applies to (empty = all products)
    pub applicable_product_ids: HashSet<ProductId>,
    /// Categories the coupon applies to (empty = all categories)
    pub applicable_category_ids: HashSet<CategoryId>,
}

impl Coupon {
    /// Creates an active, unrestricted coupon with the given code and rule
    #[must_use]
    pub fn new(code: impl Into<String>, discount: Discount) -> Self {
        Self {
            id: CouponId::new(),
            code: code.into(),
            discount,
            min_order_amount: None,
            max_discount_amount: None,
            start_date: None,
            expiry_date: None,
            usage_limit: None,
            used_count: 0,
            active: true,
            applicable_product_ids: HashSet::new(),
            applicable_category_ids: HashSet::new(),
        }
    }
}

/// Immutable record of a single coupon redemption.
///
/// At most one exists per `(coupon_id, user_id)` pair; the usage store
/// enforces that uniqueness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponUsage {
    /// Redeemed coupon
    pub coupon_id: CouponId,
    /// Redeeming user
    pub user_id: UserId,
    /// Order the redemption was applied to
    pub order_id: OrderId,
    /// When the redemption happened
    pub used_at: DateTime<Utc>,
}

// ============================================================================
// Orders
// ============================================================================

/// A frozen order line.
///
/// Copied from the cart snapshot at order creation; never re-read from the
/// catalog afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product the line refers to
    pub product_id: ProductId,
    /// Product name at purchase time
    pub product_name: String,
    /// Product image at purchase time
    pub product_image: Option<String>,
    /// Unit price at purchase time
    pub price: Money,
    /// Quantity purchased
    pub quantity: u32,
    /// `price * quantity`
    pub subtotal: Money,
}

/// Shipping destination frozen into the order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    /// Recipient full name
    pub full_name: String,
    /// Contact phone number
    pub phone: String,
    /// Street address
    pub street: String,
    /// City
    pub city: String,
    /// State or region
    pub state: String,
    /// Postal code
    pub zip_code: String,
    /// Country
    pub country: String,
}

/// Order lifecycle status.
///
/// Advanced only through the order pipeline's state machine; see
/// [`OrderStatus::can_transition_to`] for the legal transition table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created, awaiting confirmation/payment
    Pending,
    /// Payment settled or confirmed by an admin
    Confirmed,
    /// Being prepared for shipment
    Processing,
    /// Handed to the carrier
    Shipped,
    /// Received by the customer
    Delivered,
    /// Cancelled before shipment (stock restored)
    Cancelled,
    /// Customer asked to return a delivered order
    ReturnRequested,
    /// Return received (stock restored)
    Returned,
    /// Payment refunded after return
    Refunded,
}

impl OrderStatus {
    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// `PENDING → CONFIRMED → PROCESSING → SHIPPED → DELIVERED`, with
    /// cancellation allowed from `PENDING`/`CONFIRMED` and the post-delivery
    /// branch `DELIVERED → RETURN_REQUESTED → RETURNED → REFUNDED`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
                | (Self::Delivered, Self::ReturnRequested)
                | (Self::ReturnRequested, Self::Returned)
                | (Self::Returned, Self::Refunded)
        )
    }

    /// Whether a customer may still cancel an order in this status
    #[must_use]
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

/// Payment state carried on the order itself
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderPaymentStatus {
    /// Not yet settled (includes cash on delivery until handover)
    Pending,
    /// Settled in full
    Completed,
    /// Last attempt failed
    Failed,
    /// Refunded after return
    Refunded,
}

/// How the customer pays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Credit card via the gateway
    CreditCard,
    /// Debit card via the gateway
    DebitCard,
    /// UPI transfer via the gateway
    Upi,
    /// Net banking via the gateway
    NetBanking,
    /// Cash on delivery (no upfront settlement)
    Cod,
    /// Stored-value wallet via the gateway
    Wallet,
}

impl PaymentMethod {
    /// Whether this method settles on delivery rather than at checkout
    #[must_use]
    pub const fn is_cod(self) -> bool {
        matches!(self, Self::Cod)
    }
}

/// A priced, stock-committed order.
///
/// Identity, items, address, and all monetary fields are immutable once
/// created; only status, payment linkage, tracking, and the shipped/delivered
/// timestamps change afterwards. The total invariant holds for the lifetime
/// of the order: `total_amount = (subtotal − discount_amount) +
/// shipping_cost + tax`, computed once at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique order identifier
    pub id: OrderId,
    /// Human-facing order number (`ORD<millis>`)
    pub order_number: String,
    /// Purchasing user
    pub user_id: UserId,
    /// Frozen order lines
    pub items: Vec<OrderItem>,
    /// Frozen shipping destination
    pub shipping_address: ShippingAddress,
    /// Sum of line subtotals
    pub subtotal: Money,
    /// Shipping charge (zero at or above the free-shipping threshold)
    pub shipping_cost: Money,
    /// Tax on the discounted subtotal
    pub tax: Money,
    /// Coupon discount applied
    pub discount_amount: Money,
    /// Code of the applied coupon, if any
    pub coupon_code: Option<String>,
    /// Final amount charged
    pub total_amount: Money,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Payment state
    pub payment_status: OrderPaymentStatus,
    /// Payment record backing this order, once initiated
    pub payment_id: Option<PaymentId>,
    /// Payment method chosen at checkout
    pub payment_method: PaymentMethod,
    /// Carrier tracking number, once shipped
    pub tracking_number: Option<String>,
    /// Free-form customer notes
    pub notes: Option<String>,
    /// When the order was created
    pub created_at: DateTime<Utc>,
    /// When the order was last changed
    pub updated_at: DateTime<Utc>,
    /// When the order entered `SHIPPED`
    pub shipped_at: Option<DateTime<Utc>>,
    /// When the order entered `DELIVERED`
    pub delivered_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency version, bumped on every write
    pub version: u64,
}

// ============================================================================
// Payments
// ============================================================================

/// State of a payment attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    /// Created, not yet submitted to the gateway
    Initiated,
    /// Submitted, awaiting the gateway's verdict
    Processing,
    /// Settled
    Success,
    /// Declined or errored
    Failed,
    /// Returned to the customer
    Refunded,
    /// Abandoned before settlement
    Cancelled,
}

/// A payment attempt for an order.
///
/// One-to-one with the order on the happy path; gateway-mediated methods may
/// accumulate several attempts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Unique payment identifier
    pub id: PaymentId,
    /// Order being paid for
    pub order_id: OrderId,
    /// Paying user
    pub user_id: UserId,
    /// Amount charged (the order's total)
    pub amount: Money,
    /// ISO currency code
    pub currency: String,
    /// Payment method
    pub method: PaymentMethod,
    /// Attempt state
    pub status: PaymentState,
    /// Gateway transaction id, once settled
    pub transaction_id: Option<String>,
    /// Last four digits of the card, for card methods
    pub card_last4: Option<String>,
    /// Card network, for card methods
    pub card_brand: Option<String>,
    /// When the attempt was created
    pub created_at: DateTime<Utc>,
    /// When the attempt settled
    pub completed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Inventory Ledger
// ============================================================================

/// Why a stock quantity changed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockChangeType {
    /// Direct admin correction
    ManualUpdate,
    /// Deduction when an order commits (negative delta)
    OrderPlacement,
    /// Restoration when an order is cancelled (positive delta)
    OrderCancellation,
    /// Restoration when a delivered order is returned (positive delta)
    OrderReturn,
    /// Supplier delivery (positive delta)
    Restock,
}

/// Immutable, append-only record of one stock mutation.
///
/// `new_quantity` equals the product's stock quantity immediately after the
/// mutation, so replaying `change_quantity` values from the baseline always
/// reproduces the current stock level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockHistory {
    /// Unique record identifier
    pub id: Uuid,
    /// Product whose stock changed
    pub product_id: ProductId,
    /// Signed delta applied
    pub change_quantity: i64,
    /// Stock quantity immediately after the change
    pub new_quantity: u32,
    /// Why the change happened
    #[serde(rename = "type")]
    pub change_type: StockChangeType,
    /// Free-form context
    pub notes: String,
    /// Order id or manual-update reference, if any
    pub reference_id: Option<String>,
    /// When the change was applied
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn money_percent_rounds_half_up() {
        // 18% of 1000.00 is exactly 180.00
        assert_eq!(
            Money::from_units(1000).percent_half_up(18),
            Money::from_units(180)
        );
        // 18% of 0.03 = 0.0054 -> 0.01
        assert_eq!(Money::from_cents(3).percent_half_up(18), Money::from_cents(1));
        // 10% of 0.05 = 0.005 -> rounds up to 0.01
        assert_eq!(Money::from_cents(5).percent_half_up(10), Money::from_cents(1));
        // 10% of 0.04 = 0.004 -> rounds down to 0.00
        assert_eq!(Money::from_cents(4).percent_half_up(10), Money::ZERO);
    }

    #[test]
    fn money_saturating_sub_clamps_at_zero() {
        let small = Money::from_cents(100);
        let large = Money::from_cents(500);
        assert_eq!(small.saturating_sub(large), Money::ZERO);
        assert_eq!(large.saturating_sub(small), Money::from_cents(400));
    }

    #[test]
    fn money_display_uses_two_decimals() {
        assert_eq!(Money::from_cents(118_000).to_string(), "1180.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn cart_totals_are_recomputed_from_items() {
        let mut cart = Cart::new(UserId::new(), Utc::now());
        cart.items.push(CartItem {
            product_id: ProductId::new(),
            product_name: "Widget".to_string(),
            product_image: None,
            price: Money::from_units(10),
            quantity: 3,
            subtotal: Money::from_units(30),
        });
        cart.items.push(CartItem {
            product_id: ProductId::new(),
            product_name: "Gadget".to_string(),
            product_image: None,
            price: Money::from_units(5),
            quantity: 2,
            subtotal: Money::from_units(10),
        });
        cart.discount = Money::from_units(15);
        cart.recalculate_totals();

        assert_eq!(cart.total_items, 5);
        assert_eq!(cart.total_price, Money::from_units(25));
    }

    #[test]
    fn cart_total_never_goes_negative() {
        let mut cart = Cart::new(UserId::new(), Utc::now());
        cart.items.push(CartItem {
            product_id: ProductId::new(),
            product_name: "Widget".to_string(),
            product_image: None,
            price: Money::from_units(10),
            quantity: 1,
            subtotal: Money::from_units(10),
        });
        cart.discount = Money::from_units(50);
        cart.recalculate_totals();

        assert_eq!(cart.total_price, Money::ZERO);
    }

    #[test]
    fn order_status_transition_table() {
        use OrderStatus::{
            Cancelled, Confirmed, Delivered, Pending, Processing, Refunded, ReturnRequested,
            Returned, Shipped,
        };

        // Forward path
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));

        // Cancellation side branch
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Processing.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));

        // Post-delivery branch
        assert!(Delivered.can_transition_to(ReturnRequested));
        assert!(ReturnRequested.can_transition_to(Returned));
        assert!(Returned.can_transition_to(Refunded));

        // Terminal states
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Refunded.can_transition_to(Pending));

        // No skipping
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Confirmed.can_transition_to(Delivered));
    }

    #[test]
    fn document_field_names_match_store_schema() {
        let record = StockHistory {
            id: Uuid::new_v4(),
            product_id: ProductId::new(),
            change_quantity: -2,
            new_quantity: 8,
            change_type: StockChangeType::OrderPlacement,
            notes: "Order placed".to_string(),
            reference_id: Some("ORD1".to_string()),
            timestamp: Utc::now(),
        };
        let doc = serde_json::to_value(&record).unwrap();
        assert!(doc.get("productId").is_some());
        assert!(doc.get("changeQuantity").is_some());
        assert!(doc.get("newQuantity").is_some());
        assert_eq!(doc.get("type").unwrap(), "ORDER_PLACEMENT");
        assert!(doc.get("referenceId").is_some());
    }
}
