//! Order-fulfillment backend for an online store.
//!
//! The core is the checkout transaction: a cart is priced, a coupon is
//! validated, stock is reserved through an append-only inventory ledger,
//! payment is initiated, and a persistent order comes out the other side.
//! After checkout, a status state machine drives the order through shipping,
//! delivery, and the cancellation and return paths, each with its stock and
//! payment side effects.
//!
//! # Architecture
//!
//! - [`types`]: shared domain types: ids, [`Money`](types::Money), carts,
//!   coupons, orders, payments.
//! - [`catalog`]: read/write access to products, including the
//!   compare-and-swap primitive the ledger builds on.
//! - [`inventory`]: the [`InventoryLedger`](inventory::InventoryLedger),
//!   sole owner of stock mutation and its audit trail.
//! - [`coupon`]: validation rules, discount math, and race-safe redemption
//!   recording.
//! - [`cart`]: per-user carts with snapshot pricing.
//! - [`order`]: the checkout pipeline and the status state machine.
//! - [`payment`]: gateway abstraction, payment records, refunds.
//! - [`notification`]: fire-and-forget customer notification hooks.
//! - [`app`]: wires the above into a running [`Store`](app::Store).
//!
//! Persistence is behind per-entity store traits; the in-memory
//! implementations back the test suite and local development.
//!
//! # Example
//!
//! ```no_run
//! use storefront::app::Store;
//! use storefront::config::Config;
//! use storefront::types::{PaymentMethod, ShippingAddress, UserId};
//!
//! # async fn run() -> Result<(), storefront::error::StoreError> {
//! let store = Store::in_memory(Config::from_env());
//! let user = UserId::new();
//! // ... seed the catalog, fill the cart ...
//! let order = store
//!     .orders
//!     .create_order(
//!         user,
//!         ShippingAddress {
//!             full_name: "Asha Rao".into(),
//!             phone: "9999999999".into(),
//!             street: "1 MG Road".into(),
//!             city: "Bengaluru".into(),
//!             state: "KA".into(),
//!             zip_code: "560001".into(),
//!             country: "IN".into(),
//!         },
//!         PaymentMethod::CreditCard,
//!         None,
//!     )
//!     .await?;
//! println!("placed {}", order.order_number);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod coupon;
pub mod error;
pub mod inventory;
pub mod notification;
pub mod order;
pub mod payment;
pub mod types;

pub use app::Store;
pub use config::Config;
pub use error::{ErrorKind, StoreError, StoreResult};
