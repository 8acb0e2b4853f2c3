//! Supported commerce platforms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// External commerce platform a product originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductSource {
    /// Shopify store.
    Shopify,
    /// WooCommerce store.
    WooCommerce,
    /// BigCommerce store.
    BigCommerce,
    /// Custom or otherwise unrecognized platform.
    Custom,
}

impl ProductSource {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductSource::Shopify => "shopify",
            ProductSource::WooCommerce => "woocommerce",
            ProductSource::BigCommerce => "bigcommerce",
            ProductSource::Custom => "custom",
        }
    }
}

impl fmt::Display for ProductSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProductSource {
    type Err = std::convert::Infallible;

    /// Unrecognized platform names parse to [`ProductSource::Custom`] so
    /// that an unknown source degrades to best-effort handling instead of
    /// rejecting the job.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "shopify" => ProductSource::Shopify,
            "woocommerce" | "woo" => ProductSource::WooCommerce,
            "bigcommerce" => ProductSource::BigCommerce,
            _ => ProductSource::Custom,
        })
    }
}
