//! Configuration for the storefront backend.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::types::Money;
use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Pricing formula knobs (tax, shipping)
    pub pricing: PricingConfig,
    /// Payment settings
    pub payment: PaymentConfig,
}

/// Pricing configuration.
///
/// The pipeline applies a fixed formula: shipping is free at or above the
/// threshold, tax is a flat percentage of the discounted subtotal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Tax rate as a whole percentage of the discounted subtotal
    pub tax_rate_percent: u32,
    /// Order amount at or above which shipping is free
    pub free_shipping_threshold: Money,
    /// Flat shipping charge below the threshold
    pub shipping_cost: Money,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate_percent: 18,
            free_shipping_threshold: Money::from_units(500),
            shipping_cost: Money::from_units(50),
        }
    }
}

/// Payment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// ISO currency code stamped onto payment records
    pub currency: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            pricing: PricingConfig {
                tax_rate_percent: env::var("TAX_RATE_PERCENT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(18),
                free_shipping_threshold: env::var("FREE_SHIPPING_THRESHOLD_CENTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map_or_else(|| Money::from_units(500), Money::from_cents),
                shipping_cost: env::var("SHIPPING_COST_CENTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map_or_else(|| Money::from_units(50), Money::from_cents),
            },
            payment: PaymentConfig {
                currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            },
        }
    }
}
