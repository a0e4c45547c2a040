//! Cart line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CurrencyCode, Price, ProductId};

/// Product data handed to [`Cart::add`](super::Cart::add).
///
/// Built by the catalog from the product record at the time of the add;
/// `max_quantity` is the stock still available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemDescriptor {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Price,
    pub max_quantity: u32,
    pub image_url: Option<String>,
}

/// One product line in a cart.
///
/// ## Invariants
///
/// - `1 <= quantity <= max_quantity`
/// - `unit_price` is not negative
///
/// Both hold for every item reachable through [`Cart`](super::Cart); the
/// fields are private so that only the cart changes the quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub(super) product_id: ProductId,
    pub(super) title: String,
    pub(super) unit_price: Decimal,
    pub(super) quantity: u32,
    pub(super) max_quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) image_url: Option<String>,
}

impl CartItem {
    pub(super) fn from_descriptor(descriptor: CartItemDescriptor, quantity: u32) -> Self {
        Self {
            product_id: descriptor.product_id,
            title: descriptor.title,
            unit_price: descriptor.unit_price.amount(),
            quantity,
            max_quantity: descriptor.max_quantity,
            image_url: descriptor.image_url,
        }
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub const fn max_quantity(&self) -> u32 {
        self.max_quantity
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Unit price in the owning cart's currency.
    #[must_use]
    pub fn unit_price(&self, currency: CurrencyCode) -> Price {
        // Non-negative by construction and by snapshot validation.
        Price::new(self.unit_price, currency).unwrap_or_else(|_| Price::zero(currency))
    }

    /// `unit_price * quantity` in the owning cart's currency.
    #[must_use]
    pub fn line_total(&self, currency: CurrencyCode) -> Price {
        self.unit_price(currency).times(self.quantity)
    }

    /// Whether the quantity has reached the stock ceiling.
    #[must_use]
    pub const fn is_at_max(&self) -> bool {
        self.quantity >= self.max_quantity
    }
}
