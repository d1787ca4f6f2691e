//! Error types for the storefront backend.
//!
//! Every failure maps to a propagation class (see [`ErrorKind`]):
//! validation, forbidden, not-found, and conflict errors are synchronous
//! rejections with no side effects applied; external-service errors come from
//! the payment gateway; integrity errors mean a step failed *after* state was
//! already persisted and carry enough context for reconciliation. Callers
//! must treat integrity errors as "reconcile, do not retry the whole
//! operation"; retrying order creation after one would duplicate the order.

use crate::payment::GatewayError;
use crate::types::{Money, OrderId, OrderStatus};
use thiserror::Error;

/// Convenience alias for storefront results
pub type StoreResult<T> = Result<T, StoreError>;

/// Propagation class of a [`StoreError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input shape; rejected before touching state
    Validation,
    /// The caller is authenticated but not allowed to act on the resource
    Forbidden,
    /// Referenced entity absent
    NotFound,
    /// State precondition violated (stock, coupon, transition, empty cart)
    Conflict,
    /// Payment gateway failure or timeout
    ExternalService,
    /// Post-persistence step failed, leaving partially-applied state
    Integrity,
}

/// Why a coupon was rejected during validation or redemption
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CouponRejection {
    /// The coupon has been deactivated
    #[error("coupon is inactive")]
    Inactive,
    /// The validity window has not opened yet
    #[error("coupon is not yet valid")]
    NotYetValid,
    /// The validity window has closed
    #[error("coupon has expired")]
    Expired,
    /// The order is below the coupon's minimum amount
    #[error("minimum order amount of {required} required")]
    BelowMinimum {
        /// Minimum order amount the coupon demands
        required: Money,
    },
    /// Total redemptions have reached the usage limit
    #[error("coupon usage limit reached")]
    LimitReached,
    /// This user has already redeemed the coupon
    #[error("coupon has already been used by this user")]
    AlreadyUsed,
    /// No cart item matches the coupon's product/category restrictions
    #[error("coupon is not applicable to any items in the cart")]
    NotApplicable,
}

/// Errors produced by cart, coupon, inventory, and order operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input failed shape validation before any state was touched
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity type (e.g. "product", "order")
        entity: &'static str,
        /// Identifier that failed to resolve
        id: String,
    },

    /// The product exists but is not currently sellable
    #[error("product is not available: {product}")]
    ProductUnavailable {
        /// Product name
        product: String,
    },

    /// The requested quantity exceeds what is in stock
    #[error("insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Product name
        product: String,
        /// Units requested
        requested: u32,
        /// Units actually available
        available: u32,
    },

    /// The operation requires a non-empty cart
    #[error("cart is empty")]
    EmptyCart,

    /// Coupon validation or redemption failed
    #[error("coupon rejected: {0}")]
    CouponRejected(#[from] CouponRejection),

    /// The order status state machine forbids this transition
    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Current status
        from: OrderStatus,
        /// Requested status
        to: OrderStatus,
    },

    /// The caller may not act on this resource
    #[error("access denied")]
    AccessDenied,

    /// The payment gateway rejected or failed the request
    #[error("payment gateway error: {0}")]
    PaymentGateway(#[from] GatewayError),

    /// The payment gateway did not answer in time.
    ///
    /// The order is already persisted; retry the payment, not order creation.
    #[error("payment timed out for order {order_id}")]
    PaymentTimeout {
        /// Order whose payment attempt timed out
        order_id: OrderId,
    },

    /// A step failed after earlier state was already persisted.
    ///
    /// Carries the failed step and the reference (order id, product id) a
    /// reconciliation job needs to repair the partial state.
    #[error("integrity failure during {step} for {reference}: {detail}")]
    Integrity {
        /// Pipeline step that failed
        step: &'static str,
        /// Entity reference for reconciliation
        reference: String,
        /// Underlying failure description
        detail: String,
    },
}

impl StoreError {
    /// The propagation class of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::AccessDenied => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ProductUnavailable { .. }
            | Self::InsufficientStock { .. }
            | Self::EmptyCart
            | Self::CouponRejected(_)
            | Self::InvalidTransition { .. } => ErrorKind::Conflict,
            Self::PaymentGateway(_) | Self::PaymentTimeout { .. } => ErrorKind::ExternalService,
            Self::Integrity { .. } => ErrorKind::Integrity,
        }
    }
}
