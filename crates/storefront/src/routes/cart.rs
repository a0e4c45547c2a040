//! Cart route handlers.
//!
//! Mutations answer HTMX requests with a fragment and an `HX-Trigger`
//! header (`cart-updated`, plus `cart-quantity-capped` when a quantity was
//! clamped to stock). Plain form posts are redirected back to `/cart`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};
use tracing::{debug, instrument};

use temple_pos_core::{Cart, CartChange, CartItem, ProductId};

use crate::cart::{CartSession, CurrentCart};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::state::AppState;

/// Cart item display data for templates and JSON.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub product_id: i32,
    pub title: String,
    pub quantity: u32,
    pub max_quantity: u32,
    pub at_max: bool,
    pub price: String,
    pub line_price: String,
    pub image_url: Option<String>,
}

/// Cart display data for templates and JSON.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub currency: String,
    /// Exact decimal total, unrounded.
    pub total: String,
    pub total_display: String,
}

impl CartItemView {
    fn new(item: &CartItem, cart: &Cart) -> Self {
        let currency = cart.currency();
        Self {
            product_id: item.product_id().as_i32(),
            title: item.title().to_string(),
            quantity: item.quantity(),
            max_quantity: item.max_quantity(),
            at_max: item.is_at_max(),
            price: item.unit_price(currency).display(),
            line_price: item.line_total(currency).display(),
            image_url: item.image_url().map(str::to_string),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let total = cart.total();
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView::new(item, cart))
                .collect(),
            item_count: cart.item_count(),
            currency: cart.currency().code().to_string(),
            total: total.amount().to_string(),
            total_display: total.display(),
        }
    }
}

/// Add to cart form data.
///
/// A missing or blank `quantity` (a cleared number input) means one.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub quantity: Option<u32>,
}

/// Update cart form data.
///
/// `quantity` is signed: zero or below removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Deserialize a form value, treating an empty field as absent.
fn empty_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(de::Error::custom),
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// `HX-Trigger` events for a mutation outcome.
fn trigger_for(change: CartChange) -> Option<&'static str> {
    if change.was_clamped() {
        Some("cart-updated, cart-quantity-capped")
    } else if change.is_mutation() {
        Some("cart-updated")
    } else {
        None
    }
}

/// Record a Sentry breadcrumb for a line change that touched the cart.
///
/// Returns whether a breadcrumb was recorded.
fn line_breadcrumb(change: CartChange, message: &str, product_id: ProductId) -> bool {
    if !change.is_mutation() {
        return false;
    }
    let product_id = product_id.to_string();
    add_breadcrumb("cart", message, Some(&[("product_id", product_id.as_str())]));
    true
}

fn with_trigger(change: CartChange, body: impl IntoResponse) -> Response {
    match trigger_for(change) {
        Some(events) => (AppendHeaders([("HX-Trigger", events)]), body).into_response(),
        None => body.into_response(),
    }
}

/// Respond to a line mutation with the refreshed items fragment.
fn items_response(headers: &HeaderMap, cart: &CartSession, change: CartChange) -> Response {
    if !is_htmx(headers) {
        return Redirect::to("/cart").into_response();
    }
    with_trigger(
        change,
        CartItemsTemplate {
            cart: CartView::from(cart.cart()),
        },
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(cart))]
pub async fn show(CurrentCart(cart): CurrentCart) -> impl IntoResponse {
    CartShowTemplate {
        cart: CartView::from(cart.cart()),
    }
}

/// Cart contents and total as JSON.
#[instrument(skip(cart))]
pub async fn summary(CurrentCart(cart): CurrentCart) -> Json<CartView> {
    Json(CartView::from(cart.cart()))
}

/// Get cart count badge (HTMX).
#[instrument(skip(cart))]
pub async fn count(CurrentCart(cart): CurrentCart) -> impl IntoResponse {
    CartCountTemplate {
        count: cart.item_count(),
    }
}

/// Add a catalog product to the cart.
///
/// Unknown or inactive products are ignored and the cart is left as is.
/// Returns the count badge for HTMX requests.
#[instrument(skip(state, cart, headers))]
pub async fn add(
    State(state): State<AppState>,
    CurrentCart(mut cart): CurrentCart,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = form.quantity.unwrap_or(1);

    let change = match state.catalog().find(form.product_id).await? {
        Some(product) => cart.add(product.descriptor(), quantity).await?,
        None => {
            debug!(product_id = %form.product_id, "Ignoring add for unknown product");
            CartChange::Unchanged
        }
    };

    line_breadcrumb(change, "Added to cart", form.product_id);

    if !is_htmx(&headers) {
        return Ok(Redirect::to("/cart").into_response());
    }
    Ok(with_trigger(
        change,
        CartCountTemplate {
            count: cart.item_count(),
        },
    ))
}

/// Update a line's quantity (HTMX).
#[instrument(skip(cart, headers))]
pub async fn update(
    CurrentCart(mut cart): CurrentCart,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let change = cart.update_quantity(form.product_id, form.quantity).await?;
    Ok(items_response(&headers, &cart, change))
}

/// Remove a line (HTMX).
#[instrument(skip(cart, headers))]
pub async fn remove(
    CurrentCart(mut cart): CurrentCart,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let change = cart.remove(form.product_id).await?;
    line_breadcrumb(change, "Removed from cart", form.product_id);
    Ok(items_response(&headers, &cart, change))
}

/// Empty the cart (HTMX).
#[instrument(skip(cart, headers))]
pub async fn clear(CurrentCart(mut cart): CurrentCart, headers: HeaderMap) -> Result<Response> {
    let change = cart.clear().await?;
    add_breadcrumb("cart", "Cleared cart", None);
    Ok(items_response(&headers, &cart, change))
}
