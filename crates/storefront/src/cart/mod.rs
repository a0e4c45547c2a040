//! Session-backed cart provider.
//!
//! The cart for a visitor lives in their session under a single key,
//! [`CART_SESSION_KEY`], as a [`CartSnapshot`] document. A [`CartSession`]
//! is hydrated once per request and written back after every mutation.
//!
//! Handlers get one through the [`CurrentCart`] extractor; nothing else reads
//! or writes the session key.

mod extract;

use tower_sessions::Session;
use tracing::{debug, warn};

use temple_pos_core::{
    Cart, CartChange, CartItemDescriptor, CartSnapshot, CurrencyCode, Price, ProductId,
};

pub use extract::{CartRejection, CurrentCart};

/// Session key holding the cart snapshot.
pub const CART_SESSION_KEY: &str = "cart";

/// Errors reading or writing the session cart.
#[derive(Debug, thiserror::Error)]
pub enum CartError {
    /// The session store failed.
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    /// The cart could not be serialized.
    #[error("cart serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A cart bound to the session it was loaded from.
pub struct CartSession {
    session: Session,
    cart: Cart,
}

impl CartSession {
    /// Hydrate the cart from the session.
    ///
    /// A missing key yields an empty cart. A payload that fails to decode,
    /// or one priced in a currency other than `currency`, is logged,
    /// removed from the session, and replaced by an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session store cannot be read.
    pub async fn load(session: Session, currency: CurrencyCode) -> Result<Self, CartError> {
        let Some(value) = session.get_value(CART_SESSION_KEY).await? else {
            return Ok(Self {
                session,
                cart: Cart::new(currency),
            });
        };

        let cart = match CartSnapshot::decode(value, currency) {
            Ok(cart) if cart.currency() == currency => cart,
            Ok(cart) => {
                warn!(
                    stored = %cart.currency(),
                    configured = %currency,
                    "Discarding cart priced in another currency"
                );
                session.remove_value(CART_SESSION_KEY).await?;
                Cart::new(currency)
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable cart");
                session.remove_value(CART_SESSION_KEY).await?;
                Cart::new(currency)
            }
        };

        Ok(Self { session, cart })
    }

    /// The hydrated cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn total(&self) -> Price {
        self.cart.total()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    /// Add units of a product and persist.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be written back.
    pub async fn add(
        &mut self,
        descriptor: CartItemDescriptor,
        quantity: u32,
    ) -> Result<CartChange, CartError> {
        let change = self.cart.add(descriptor, quantity);
        self.persist(change).await
    }

    /// Remove a product's line and persist.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be written back.
    pub async fn remove(&mut self, product_id: ProductId) -> Result<CartChange, CartError> {
        let change = self.cart.remove(product_id);
        self.persist(change).await
    }

    /// Replace a product's quantity and persist. Below one removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be written back.
    pub async fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartChange, CartError> {
        let change = self.cart.update_quantity(product_id, quantity);
        self.persist(change).await
    }

    /// Empty the cart and persist.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be written back.
    pub async fn clear(&mut self) -> Result<CartChange, CartError> {
        let change = self.cart.clear();
        self.persist(change).await
    }

    /// Write the full snapshot back when `change` touched the cart.
    async fn persist(&self, change: CartChange) -> Result<CartChange, CartError> {
        if change.is_mutation() {
            let snapshot = serde_json::to_value(self.cart.snapshot())?;
            self.session.insert_value(CART_SESSION_KEY, snapshot).await?;
            debug!(?change, lines = self.cart.len(), "Cart persisted");
        }
        Ok(change)
    }
}
