//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use xtremefit_core::{Cart, PaymentMethod};

use crate::api::{ApiError, CheckoutRequest};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, SessionCart};
use crate::routes::cart::{CartView, MISSING_SIZE_MESSAGE};
use crate::state::AppState;
use crate::views::Layout;

const CARD_UNAVAILABLE_MESSAGE: &str =
    "Card payments are coming soon. Please choose Cash on Delivery.";

/// Checkout form data.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub address: String,
    pub payment_method: Option<String>,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub login_required: bool,
    pub cart: CartView,
    pub customer_name: String,
    pub address: String,
    pub error: Option<String>,
}

/// Turn the submitted form into an API request, or explain why not.
fn build_request(cart: &Cart, form: &CheckoutForm) -> std::result::Result<CheckoutRequest, String> {
    if cart.is_empty() {
        return Err("Your cart is empty.".to_string());
    }
    if cart.has_missing_size() {
        return Err(MISSING_SIZE_MESSAGE.to_string());
    }

    let address = form.address.trim();
    if address.is_empty() {
        return Err("Please enter your delivery address.".to_string());
    }

    let payment_method = form
        .payment_method
        .clone()
        .map_or(PaymentMethod::CashOnDelivery, PaymentMethod::from);
    if !payment_method.is_available() {
        return Err(CARD_UNAVAILABLE_MESSAGE.to_string());
    }

    Ok(CheckoutRequest {
        address: address.to_string(),
        payment_method,
        items: cart.checkout_items(),
    })
}

/// Display the checkout page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    OptionalAuth(user): OptionalAuth,
    cart: SessionCart,
) -> impl IntoResponse {
    let error = cart
        .cart()
        .has_missing_size()
        .then(|| MISSING_SIZE_MESSAGE.to_string());

    CheckoutTemplate {
        layout,
        login_required: user.is_none(),
        cart: CartView::new(cart.cart(), &state.config().storage_url),
        customer_name: user
            .map(|user| user.profile.display_name().to_string())
            .unwrap_or_default(),
        address: String::new(),
        error,
    }
}

/// Place the order.
///
/// On success the cart is emptied and the visitor lands on their order
/// history with a confirmation banner.
#[instrument(skip_all)]
pub async fn place_order(
    State(state): State<AppState>,
    layout: Layout,
    RequireAuth(user): RequireAuth,
    mut cart: SessionCart,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let render_error = |cart: &Cart, error: String| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutTemplate {
                layout: layout.clone(),
                login_required: false,
                cart: CartView::new(cart, &state.config().storage_url),
                customer_name: user.profile.display_name().to_string(),
                address: form.address.clone(),
                error: Some(error),
            },
        )
            .into_response()
    };

    if cart.cart().is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let request = match build_request(cart.cart(), &form) {
        Ok(request) => request,
        Err(message) => return Ok(render_error(cart.cart(), message)),
    };

    match state.api().checkout(user.token(), &request).await {
        Ok(()) => {
            tracing::info!(user_id = %user.profile.id, items = request.items.len(), "Order placed");
            add_breadcrumb("checkout", "Order placed", None);
            cart.cart_mut().clear();
            cart.save().await?;
            Ok(Redirect::to("/my-orders?placed=1").into_response())
        }
        Err(e @ ApiError::Unauthorized(_)) => Err(AppError::Api(e)),
        Err(e) => {
            tracing::warn!("Checkout rejected: {e}");
            Ok(render_error(cart.cart(), e.form_message()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use xtremefit_core::{CartProduct, Price, ProductId};

    use super::*;

    fn cart_with(sizes: &[&str], size: Option<&str>) -> Cart {
        let mut cart = Cart::new();
        cart.add(
            &CartProduct {
                id: ProductId::new(7),
                name: "Runner".to_string(),
                price: Price::parse("49.50").unwrap(),
                image: None,
                sizes: sizes.iter().map(ToString::to_string).collect(),
            },
            size,
            2,
        );
        cart
    }

    fn form(address: &str, payment: Option<&str>) -> CheckoutForm {
        CheckoutForm {
            address: address.to_string(),
            payment_method: payment.map(ToString::to_string),
        }
    }

    #[test]
    fn test_build_request() {
        let cart = cart_with(&["42"], Some("42"));
        let request = build_request(&cart, &form("  1 Main St  ", Some("cod"))).unwrap();

        assert_eq!(request.address, "1 Main St");
        assert_eq!(request.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].quantity, 2);
        assert_eq!(request.items[0].size.as_deref(), Some("42"));
    }

    #[test]
    fn test_rejects_empty_address() {
        let cart = cart_with(&[], None);
        assert_eq!(
            build_request(&cart, &form("   ", None)).unwrap_err(),
            "Please enter your delivery address."
        );
    }

    #[test]
    fn test_rejects_card_payment() {
        let cart = cart_with(&[], None);
        assert_eq!(
            build_request(&cart, &form("1 Main St", Some("card"))).unwrap_err(),
            CARD_UNAVAILABLE_MESSAGE
        );
    }

    #[test]
    fn test_rejects_missing_size() {
        let cart = cart_with(&["41", "42"], None);
        assert_eq!(
            build_request(&cart, &form("1 Main St", None)).unwrap_err(),
            MISSING_SIZE_MESSAGE
        );
    }

    #[test]
    fn test_rejects_empty_cart() {
        assert!(build_request(&Cart::new(), &form("1 Main St", None)).is_err());
    }
}
