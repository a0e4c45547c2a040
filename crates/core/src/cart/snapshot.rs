//! Persisted cart layout.
//!
//! A cart is stored under a single key as a versioned JSON document:
//!
//! ```text
//! {"version":1,"currency":"USD","savedAt":"2026-10-16T09:30:00Z","items":[...]}
//! ```
//!
//! The legacy layout, a bare JSON array of items with float prices, is still
//! accepted on read and migrated. Every decoded cart is validated against the
//! item invariants before it is handed out.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Cart, CartItem};
use crate::types::{CurrencyCode, ProductId};

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u64 = 1;

/// Errors decoding a persisted cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The payload does not have the expected shape.
    #[error("malformed cart snapshot: {0}")]
    Malformed(String),
    /// The payload was written by an unknown schema version.
    #[error("unsupported cart snapshot version {0}")]
    UnsupportedVersion(u64),
    /// An item violates a cart invariant.
    #[error("invalid cart item {product_id}: {reason}")]
    Invalid {
        product_id: ProductId,
        reason: String,
    },
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Serialized form of a [`Cart`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub version: u64,
    pub currency: CurrencyCode,
    pub saved_at: DateTime<Utc>,
    pub items: Vec<CartItem>,
}

/// Item shape written by the browser-storage cart, before snapshots were versioned.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyItem {
    product_id: ProductId,
    #[serde(alias = "displayName")]
    title: String,
    unit_price: rust_decimal::Decimal,
    quantity: u32,
    max_quantity: u32,
    #[serde(default)]
    image_url: Option<String>,
}

impl From<LegacyItem> for CartItem {
    fn from(item: LegacyItem) -> Self {
        Self {
            product_id: item.product_id,
            title: item.title,
            unit_price: item.unit_price,
            quantity: item.quantity,
            max_quantity: item.max_quantity,
            image_url: item.image_url.filter(|url| !url.is_empty()),
        }
    }
}

impl CartSnapshot {
    /// Capture the current state of `cart`.
    #[must_use]
    pub fn capture(cart: &Cart, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            currency: cart.currency,
            saved_at,
            items: cart.items.clone(),
        }
    }

    /// Validate and convert back into a cart.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::UnsupportedVersion` for a foreign version and
    /// `SnapshotError::Invalid` if any item breaks a cart invariant.
    pub fn into_cart(self) -> Result<Cart, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        validated(self.currency, self.items)
    }

    /// Decode a stored payload, migrating the legacy array layout.
    ///
    /// Legacy carts are priced in `legacy_currency`.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the payload is malformed, has an unknown
    /// version, or holds an item that breaks a cart invariant.
    pub fn decode(value: Value, legacy_currency: CurrencyCode) -> Result<Cart, SnapshotError> {
        match value {
            Value::Array(_) => {
                let legacy: Vec<LegacyItem> = serde_json::from_value(value)?;
                validated(
                    legacy_currency,
                    legacy.into_iter().map(CartItem::from).collect(),
                )
            }
            Value::Object(ref fields) => {
                let version = fields
                    .get("version")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| SnapshotError::Malformed("missing version".to_owned()))?;
                if version != SNAPSHOT_VERSION {
                    return Err(SnapshotError::UnsupportedVersion(version));
                }
                serde_json::from_value::<Self>(value)?.into_cart()
            }
            other => Err(SnapshotError::Malformed(format!(
                "expected an object or array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl Cart {
    /// Capture this cart for persistence.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::capture(self, Utc::now())
    }
}

fn validated(currency: CurrencyCode, items: Vec<CartItem>) -> Result<Cart, SnapshotError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in &items {
        let invalid = |reason: String| SnapshotError::Invalid {
            product_id: item.product_id,
            reason,
        };

        if !seen.insert(item.product_id) {
            return Err(invalid("duplicate product".to_owned()));
        }
        if item.max_quantity == 0 {
            return Err(invalid("max quantity is zero".to_owned()));
        }
        if item.quantity == 0 || item.quantity > item.max_quantity {
            return Err(invalid(format!(
                "quantity {} outside 1..={}",
                item.quantity, item.max_quantity
            )));
        }
        if item.unit_price.is_sign_negative() && !item.unit_price.is_zero() {
            return Err(invalid(format!("negative unit price {}", item.unit_price)));
        }
    }
    Ok(Cart { currency, items })
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::cart::CartItemDescriptor;
    use crate::types::Price;

    fn sample_cart() -> Cart {
        let mut cart = Cart::new(CurrencyCode::USD);
        for (id, cents, max) in [(3, 2500, 4), (1, 1099, 2), (7, 0, 10)] {
            cart.add(
                CartItemDescriptor {
                    product_id: ProductId::new(id),
                    title: format!("Seva {id}"),
                    unit_price: Price::from_cents(cents, CurrencyCode::USD).unwrap(),
                    max_quantity: max,
                    image_url: Some(format!("https://cdn.example.org/{id}.jpg")),
                },
                2,
            );
        }
        cart
    }

    #[test]
    fn test_round_trip_preserves_order_and_values() {
        let cart = sample_cart();
        let value = serde_json::to_value(cart.snapshot()).unwrap();
        let restored = CartSnapshot::decode(value, CurrencyCode::EUR).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_snapshot_uses_camel_case_and_string_prices() {
        let value = serde_json::to_value(sample_cart().snapshot()).unwrap();
        assert_eq!(value["version"], json!(1));
        assert!(value.get("savedAt").is_some());
        assert_eq!(value["items"][0]["productId"], json!(3));
        assert_eq!(value["items"][0]["maxQuantity"], json!(4));
        assert_eq!(value["items"][1]["unitPrice"], json!("10.99"));
    }

    #[test]
    fn test_legacy_array_is_migrated() {
        let legacy = json!([
            {"productId": 1, "title": "Abhishekam", "unitPrice": 10.5, "quantity": 2, "maxQuantity": 3, "imageUrl": ""},
            {"productId": 2, "displayName": "Annual plan", "unitPrice": 120, "quantity": 1, "maxQuantity": 1}
        ]);
        let cart = CartSnapshot::decode(legacy, CurrencyCode::INR).unwrap();

        assert_eq!(cart.currency(), CurrencyCode::INR);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[1].title(), "Annual plan");
        assert_eq!(cart.items()[0].image_url(), None);
        assert_eq!(cart.total().amount(), Decimal::new(141, 0));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let value = json!({"version": 2, "currency": "USD", "savedAt": "2026-10-16T00:00:00Z", "items": []});
        assert_eq!(
            CartSnapshot::decode(value, CurrencyCode::USD).unwrap_err(),
            SnapshotError::UnsupportedVersion(2)
        );
    }

    #[test]
    fn test_quantity_above_max_rejected() {
        let value = json!([
            {"productId": 4, "title": "Puja", "unitPrice": "5.00", "quantity": 9, "maxQuantity": 3}
        ]);
        let err = CartSnapshot::decode(value, CurrencyCode::USD).unwrap_err();
        assert!(matches!(err, SnapshotError::Invalid { product_id, .. } if product_id == ProductId::new(4)));
    }

    #[test]
    fn test_duplicate_and_negative_rejected() {
        let duplicate = json!([
            {"productId": 1, "title": "A", "unitPrice": 1, "quantity": 1, "maxQuantity": 3},
            {"productId": 1, "title": "A", "unitPrice": 1, "quantity": 1, "maxQuantity": 3}
        ]);
        assert!(matches!(
            CartSnapshot::decode(duplicate, CurrencyCode::USD),
            Err(SnapshotError::Invalid { .. })
        ));

        let negative = json!([
            {"productId": 1, "title": "A", "unitPrice": -4, "quantity": 1, "maxQuantity": 3}
        ]);
        assert!(matches!(
            CartSnapshot::decode(negative, CurrencyCode::USD),
            Err(SnapshotError::Invalid { .. })
        ));
    }

    #[test]
    fn test_malformed_payloads() {
        for value in [json!("cart"), json!(null), json!({"items": []}), json!([{"productId": "x"}])] {
            assert!(matches!(
                CartSnapshot::decode(value, CurrencyCode::USD),
                Err(SnapshotError::Malformed(_))
            ));
        }
    }
}
