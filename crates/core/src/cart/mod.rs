//! The shopping cart aggregate.
//!
//! A [`Cart`] is an ordered collection of [`CartItem`]s keyed by
//! [`ProductId`]. Each item is a counter bounded in `[1, max_quantity]`;
//! dropping a counter below one removes the item.
//!
//! # Overflow policy
//!
//! Quantities above `max_quantity` are clamped, never rejected. Every
//! mutation returns a [`CartChange`] describing the outcome, including
//! whether the requested quantity was clamped, so callers can tell the
//! customer without treating it as an error.
//!
//! # Example
//!
//! ```
//! use temple_pos_core::{Cart, CartItemDescriptor, CurrencyCode, Price, ProductId};
//!
//! let mut cart = Cart::new(CurrencyCode::USD);
//! let lamp = CartItemDescriptor {
//!     product_id: ProductId::new(1),
//!     title: "Oil lamp offering".to_owned(),
//!     unit_price: Price::from_cents(1000, CurrencyCode::USD).unwrap(),
//!     max_quantity: 3,
//!     image_url: None,
//! };
//!
//! cart.add(lamp.clone(), 1);
//! cart.add(lamp, 1);
//! assert_eq!(cart.total().display(), "$20.00");
//!
//! cart.update_quantity(ProductId::new(1), 5);
//! assert_eq!(cart.total().display(), "$30.00");
//! ```

mod item;
pub mod snapshot;

pub use item::{CartItem, CartItemDescriptor};
pub use snapshot::{CartSnapshot, SnapshotError};

use tracing::debug;

use crate::types::{CurrencyCode, Price, ProductId};

/// Why an add was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The requested quantity was zero.
    ZeroQuantity,
    /// The product has no stock left.
    SoldOut,
    /// The product is priced in a different currency than the cart.
    CurrencyMismatch,
}

/// Outcome of a cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was appended.
    Added { quantity: u32, clamped: bool },
    /// An existing line's quantity was increased.
    Incremented { quantity: u32, clamped: bool },
    /// An existing line's quantity was replaced.
    Updated { quantity: u32, clamped: bool },
    /// A line was removed.
    Removed,
    /// Every line was removed.
    Cleared,
    /// The product was not in the cart.
    Unchanged,
    /// The add request was not applied.
    Ignored(IgnoreReason),
}

impl CartChange {
    /// Whether the requested quantity was capped at `max_quantity`.
    #[must_use]
    pub const fn was_clamped(&self) -> bool {
        matches!(
            self,
            Self::Added { clamped: true, .. }
                | Self::Incremented { clamped: true, .. }
                | Self::Updated { clamped: true, .. }
        )
    }

    /// Whether the cart contents may have changed.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        !matches!(self, Self::Unchanged | Self::Ignored(_))
    }
}

/// The in-memory cart.
///
/// Items keep their insertion order for display. The cart never holds two
/// lines for the same product.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cart {
    currency: CurrencyCode,
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart priced in `currency`.
    #[must_use]
    pub const fn new(currency: CurrencyCode) -> Self {
        Self {
            currency,
            items: Vec::new(),
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// If the product is already in the cart its quantity is incremented and
    /// the line keeps the price it was first added at; `max_quantity` is
    /// refreshed from `descriptor`. The resulting quantity is clamped to
    /// `max_quantity`.
    pub fn add(&mut self, descriptor: CartItemDescriptor, quantity: u32) -> CartChange {
        if quantity == 0 {
            return CartChange::Ignored(IgnoreReason::ZeroQuantity);
        }
        if descriptor.max_quantity == 0 {
            return CartChange::Ignored(IgnoreReason::SoldOut);
        }
        if descriptor.unit_price.currency_code() != self.currency {
            return CartChange::Ignored(IgnoreReason::CurrencyMismatch);
        }

        let product_id = descriptor.product_id;
        if let Some(item) = self.find_mut(product_id) {
            item.max_quantity = descriptor.max_quantity;
            let requested = item.quantity.saturating_add(quantity);
            let clamped = requested > item.max_quantity;
            item.quantity = requested.min(item.max_quantity);
            if clamped {
                debug!(%product_id, requested, max = item.max_quantity, "clamped cart increment");
            }
            return CartChange::Incremented {
                quantity: item.quantity,
                clamped,
            };
        }

        let clamped = quantity > descriptor.max_quantity;
        let quantity = quantity.min(descriptor.max_quantity);
        self.items
            .push(CartItem::from_descriptor(descriptor, quantity));
        CartChange::Added { quantity, clamped }
    }

    /// Remove a product's line. Absent products are not an error.
    pub fn remove(&mut self, product_id: ProductId) -> CartChange {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        if self.items.len() == before {
            CartChange::Unchanged
        } else {
            CartChange::Removed
        }
    }

    /// Replace a product's quantity.
    ///
    /// A quantity below one removes the line. Larger values are clamped to
    /// `max_quantity`.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) -> CartChange {
        if quantity < 1 {
            return self.remove(product_id);
        }
        let Some(item) = self.find_mut(product_id) else {
            return CartChange::Unchanged;
        };

        let requested = u32::try_from(quantity).unwrap_or(u32::MAX);
        let clamped = requested > item.max_quantity;
        item.quantity = requested.min(item.max_quantity);
        CartChange::Updated {
            quantity: item.quantity,
            clamped,
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) -> CartChange {
        self.items.clear();
        CartChange::Cleared
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items
            .iter()
            .map(|item| item.line_total(self.currency))
            .fold(Price::zero(self.currency), |acc, line| {
                // Every line is priced in the cart currency.
                acc.checked_add(&line).unwrap_or(acc)
            })
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, item| acc.saturating_add(item.quantity))
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    fn find_mut(&mut self, product_id: ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_id == product_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn descriptor(id: i32, cents: i64, max_quantity: u32) -> CartItemDescriptor {
        CartItemDescriptor {
            product_id: ProductId::new(id),
            title: format!("Offering {id}"),
            unit_price: Price::from_cents(cents, CurrencyCode::USD).unwrap(),
            max_quantity,
            image_url: None,
        }
    }

    fn usd(cents: i64) -> Price {
        Price::from_cents(cents, CurrencyCode::USD).unwrap()
    }

    #[test]
    fn test_add_then_update_then_remove_scenario() {
        let mut cart = Cart::new(CurrencyCode::USD);
        let id = ProductId::new(1);

        cart.add(descriptor(1, 1000, 3), 1);
        cart.add(descriptor(1, 1000, 3), 1);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(id).unwrap().quantity(), 2);
        assert_eq!(cart.total(), usd(2000));

        let change = cart.update_quantity(id, 5);
        assert_eq!(
            change,
            CartChange::Updated {
                quantity: 3,
                clamped: true
            }
        );
        assert_eq!(cart.total(), usd(3000));

        assert_eq!(cart.remove(id), CartChange::Removed);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), usd(0));
    }

    #[test]
    fn test_repeated_adds_sum_and_clamp() {
        let mut cart = Cart::new(CurrencyCode::USD);
        let increments = [2, 1, 3, 1];
        let mut last = CartChange::Unchanged;
        for n in increments {
            last = cart.add(descriptor(4, 500, 5), n);
        }
        // 2 + 1 + 3 + 1 = 7, capped at 5
        assert_eq!(cart.get(ProductId::new(4)).unwrap().quantity(), 5);
        assert!(last.was_clamped());
    }

    #[test]
    fn test_add_new_line_clamped_to_max() {
        let mut cart = Cart::new(CurrencyCode::USD);
        let change = cart.add(descriptor(2, 100, 2), 10);
        assert_eq!(
            change,
            CartChange::Added {
                quantity: 2,
                clamped: true
            }
        );
    }

    #[test]
    fn test_add_keeps_first_price_but_refreshes_max() {
        let mut cart = Cart::new(CurrencyCode::USD);
        cart.add(descriptor(3, 1000, 10), 4);
        let change = cart.add(descriptor(3, 1500, 2), 1);

        let item = cart.get(ProductId::new(3)).unwrap();
        assert_eq!(item.quantity(), 2);
        assert_eq!(item.max_quantity(), 2);
        assert_eq!(item.unit_price(CurrencyCode::USD), usd(1000));
        assert!(change.was_clamped());
    }

    #[test]
    fn test_add_ignores_zero_quantity_sold_out_and_foreign_currency() {
        let mut cart = Cart::new(CurrencyCode::USD);
        assert_eq!(
            cart.add(descriptor(1, 100, 3), 0),
            CartChange::Ignored(IgnoreReason::ZeroQuantity)
        );
        assert_eq!(
            cart.add(descriptor(1, 100, 0), 1),
            CartChange::Ignored(IgnoreReason::SoldOut)
        );

        let mut euro = descriptor(1, 100, 3);
        euro.unit_price = Price::from_cents(100, CurrencyCode::EUR).unwrap();
        assert_eq!(
            cart.add(euro, 1),
            CartChange::Ignored(IgnoreReason::CurrencyMismatch)
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_to_zero_or_negative_removes() {
        for quantity in [0, -1, -100] {
            let mut cart = Cart::new(CurrencyCode::USD);
            cart.add(descriptor(1, 100, 3), 2);
            cart.add(descriptor(2, 100, 3), 1);

            let mut expected = cart.clone();
            expected.remove(ProductId::new(1));

            assert_eq!(
                cart.update_quantity(ProductId::new(1), quantity),
                CartChange::Removed
            );
            assert_eq!(cart, expected);
        }
    }

    #[test]
    fn test_update_and_remove_absent_are_no_ops() {
        let mut cart = Cart::new(CurrencyCode::USD);
        cart.add(descriptor(1, 100, 3), 1);
        let before = cart.clone();

        assert_eq!(
            cart.update_quantity(ProductId::new(99), 2),
            CartChange::Unchanged
        );
        assert_eq!(cart.remove(ProductId::new(99)), CartChange::Unchanged);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_update_huge_quantity_saturates_then_clamps() {
        let mut cart = Cart::new(CurrencyCode::USD);
        cart.add(descriptor(1, 100, 7), 1);
        let change = cart.update_quantity(ProductId::new(1), i64::MAX);
        assert_eq!(
            change,
            CartChange::Updated {
                quantity: 7,
                clamped: true
            }
        );
    }

    #[test]
    fn test_zero_priced_items_do_not_affect_total() {
        let mut cart = Cart::new(CurrencyCode::USD);
        cart.add(descriptor(1, 250, 5), 2);
        cart.add(descriptor(2, 0, 5), 3);
        assert_eq!(cart.total(), usd(500));
        assert!(!cart.total().amount().is_sign_negative());
    }

    #[test]
    fn test_total_is_exact_decimal() {
        let mut cart = Cart::new(CurrencyCode::USD);
        cart.add(descriptor(1, 10, 10), 1);
        cart.add(descriptor(2, 20, 10), 1);
        assert_eq!(cart.total().amount(), Decimal::new(30, 2));
    }

    #[test]
    fn test_clear_empties_and_zeroes_total() {
        let mut cart = Cart::new(CurrencyCode::USD);
        cart.add(descriptor(1, 100, 3), 2);
        cart.add(descriptor(2, 300, 3), 1);
        assert_eq!(cart.clear(), CartChange::Cleared);
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.total(), usd(0));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut cart = Cart::new(CurrencyCode::USD);
        for id in [5, 2, 9] {
            cart.add(descriptor(id, 100, 3), 1);
        }
        cart.add(descriptor(2, 100, 3), 1);
        let ids: Vec<i32> = cart.items().iter().map(|i| i.product_id().as_i32()).collect();
        assert_eq!(ids, vec![5, 2, 9]);
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_change_flags() {
        assert!(!CartChange::Unchanged.is_mutation());
        assert!(!CartChange::Ignored(IgnoreReason::SoldOut).is_mutation());
        assert!(CartChange::Removed.is_mutation());
        assert!(!CartChange::Removed.was_clamped());
    }
}
