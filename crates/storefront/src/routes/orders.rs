//! Order history route handlers (requires login).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use xtremefit_core::OrderId;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::state::AppState;
use crate::views::{Layout, OrderDetail, OrderSummary};

/// Query parameters for the order list.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    /// Set after a successful checkout.
    pub placed: Option<String>,
}

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderSummary>,
    pub placed: bool,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub layout: Layout,
    pub order: OrderDetail,
    pub back_href: &'static str,
}

/// Display the visitor's orders, newest first as returned by the API.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    RequireAuth(user): RequireAuth,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse> {
    let orders = state.api().my_orders(user.token()).await?;

    Ok(OrdersIndexTemplate {
        layout,
        orders: orders.iter().map(OrderSummary::from).collect(),
        placed: query.placed.is_some(),
    })
}

/// Display one of the visitor's orders.
#[instrument(skip(state, layout, user))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = state.api().my_order(user.token(), id).await?;

    Ok(OrderShowTemplate {
        layout,
        order: OrderDetail::new(&order, &state.config().storage_url),
        back_href: "/my-orders",
    })
}
