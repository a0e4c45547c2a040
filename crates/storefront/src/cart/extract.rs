//! Extractor giving handlers the visitor's cart.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use super::{CartError, CartSession};
use crate::state::AppState;

/// Extractor that hydrates the cart from the request's session.
///
/// Requires the session layer from
/// [`create_session_layer`](crate::middleware::create_session_layer) to be
/// installed above the route. A route mounted without it is a wiring bug:
/// the extractor rejects with 500 instead of handing out an unsaved cart.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentCart(cart): CurrentCart) -> impl IntoResponse {
///     cart.total().display()
/// }
/// ```
pub struct CurrentCart(pub CartSession);

/// Rejection when the cart cannot be provided.
#[derive(Debug)]
pub enum CartRejection {
    /// No session layer above this route.
    MissingSessionLayer,
    /// The session store failed while loading the cart.
    Load(CartError),
}

impl IntoResponse for CartRejection {
    fn into_response(self) -> Response {
        match &self {
            Self::MissingSessionLayer => {
                let event_id = sentry::capture_message(
                    "cart requested on a route without a session layer",
                    sentry::Level::Error,
                );
                tracing::error!(
                    sentry_event_id = %event_id,
                    "Cart requested on a route without a session layer"
                );
            }
            Self::Load(err) => {
                let event_id = sentry::capture_error(err);
                tracing::error!(error = %err, sentry_event_id = %event_id, "Failed to load cart");
            }
        }
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

impl FromRequestParts<AppState> for CurrentCart {
    type Rejection = CartRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(CartRejection::MissingSessionLayer)?;

        CartSession::load(session, state.config().currency)
            .await
            .map(Self)
            .map_err(CartRejection::Load)
    }
}
