//! Admin order management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderValue,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use xtremefit_core::{OrderId, OrderStatus};

use crate::api::{ApiError, Order};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::orders::OrderShowTemplate;
use crate::state::AppState;
use crate::views::{HxRequest, Layout, OrderDetail, OrderSummary};

// =============================================================================
// View Types
// =============================================================================

/// `<option>` of the status select.
#[derive(Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Order table row.
#[derive(Clone)]
pub struct AdminOrderRow {
    pub summary: OrderSummary,
    pub customer: String,
    pub statuses: Vec<StatusOption>,
}

impl From<&Order> for AdminOrderRow {
    fn from(order: &Order) -> Self {
        Self {
            summary: order.into(),
            customer: order.user.as_ref().map_or_else(
                || "-".to_string(),
                |user| {
                    if user.name.is_empty() {
                        user.email.clone()
                    } else {
                        user.name.clone()
                    }
                },
            ),
            statuses: OrderStatus::ALL
                .iter()
                .map(|status| StatusOption {
                    value: status.as_str(),
                    label: status.label(),
                    selected: *status == order.status,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Form and Query Types
// =============================================================================

/// Status change form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Query parameters for the order table.
#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub updated: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Order table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders/index.html")]
pub struct AdminOrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<AdminOrderRow>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Single order row fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "admin/partials/order_row.html")]
pub struct OrderRowTemplate {
    pub order: AdminOrderRow,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display all orders.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(user): RequireAdmin,
    Query(query): Query<IndexQuery>,
) -> Result<impl IntoResponse> {
    let orders = state.api().admin_orders(user.token()).await?;

    Ok(AdminOrdersTemplate {
        layout,
        orders: orders.iter().map(AdminOrderRow::from).collect(),
        notice: query.updated.map(|_| "Order status updated.".to_string()),
        error: query.error.filter(|error| !error.is_empty()),
    })
}

/// Display one order.
///
/// The API has no admin detail endpoint, so the order is looked up in the
/// admin order list.
#[instrument(skip(state, layout, user))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let orders = state.api().admin_orders(user.token()).await?;
    let order = orders
        .iter()
        .find(|order| order.id == id)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    Ok(OrderShowTemplate {
        layout,
        order: OrderDetail::new(order, &state.config().storage_url),
        back_href: "/admin/orders",
    })
}

/// Change an order's status.
///
/// HTMX requests get the refreshed table row; plain form posts are sent back
/// to the table.
#[instrument(skip(state, user, form))]
pub async fn update_status(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let status: OrderStatus = form.status.parse().map_err(AppError::BadRequest)?;

    match state
        .api()
        .update_order_status(user.token(), id, status)
        .await
    {
        Ok(updated) => {
            tracing::info!(order_id = %id, status = %status, "Order status updated");
            add_breadcrumb("admin", "Order status updated", None);

            if !is_htmx {
                return Ok(Redirect::to("/admin/orders?updated=1").into_response());
            }

            // The update response may omit the customer and items
            let mut order = match state.api().admin_orders(user.token()).await {
                Ok(orders) => orders
                    .into_iter()
                    .find(|order| order.id == id)
                    .unwrap_or(updated),
                Err(e) => {
                    tracing::warn!("Failed to reload orders after status change: {e}");
                    updated
                }
            };
            order.status = status;

            Ok(OrderRowTemplate {
                order: AdminOrderRow::from(&order),
            }
            .into_response())
        }
        Err(e @ (ApiError::Unauthorized(_) | ApiError::Forbidden(_))) => Err(AppError::Api(e)),
        Err(e) => {
            tracing::warn!(order_id = %id, "Status update failed: {e}");
            let target = format!(
                "/admin/orders?error={}",
                urlencoding::encode(&e.message_or("Failed to update order status"))
            );
            let mut response = Redirect::to(&target).into_response();
            if is_htmx && let Ok(value) = HeaderValue::from_str(&target) {
                response.headers_mut().insert("hx-redirect", value);
            }
            Ok(response)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_order_row() {
        let order: Order = serde_json::from_str(
            r#"{"id":3,"status":"paid","payment_method":"cash","total":"12.5",
                "user":{"name":"Ada","email":"ada@example.com"},
                "items":[{"quantity":1,"unit_price":"12.5"}]}"#,
        )
        .unwrap();
        let row = AdminOrderRow::from(&order);

        assert_eq!(row.customer, "Ada");
        assert_eq!(row.summary.payment, "Cash on Delivery");
        assert_eq!(row.summary.items, "1 item");
        assert_eq!(row.statuses.len(), 4);
        assert_eq!(
            row.statuses
                .iter()
                .filter(|option| option.selected)
                .map(|option| option.value)
                .collect::<Vec<_>>(),
            vec!["paid"]
        );
    }

    #[test]
    fn test_row_without_customer() {
        let order: Order =
            serde_json::from_str(r#"{"id":4,"total":"0","items":[]}"#).unwrap();
        assert_eq!(AdminOrderRow::from(&order).customer, "-");
    }
}
