//! Customer order endpoints.

use reqwest::Method;
use tracing::instrument;

use xtremefit_core::OrderId;

use super::types::{CheckoutRequest, ItemEnvelope, ListEnvelope, Order};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Place an order for the given cart items (`POST /api/checkout`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the API rejects the order, or
    /// another error if the request fails.
    #[instrument(skip(self, token, payload), fields(items = payload.items.len()))]
    pub async fn checkout(&self, token: &str, payload: &CheckoutRequest) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, "checkout", Some(token))
            .json(payload);
        self.execute_unit(request).await
    }

    /// Orders placed by the token's owner (`GET /api/my-orders`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn my_orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        let envelope: ListEnvelope<Order> = self
            .execute(self.request(Method::GET, "my-orders", Some(token)))
            .await?;
        Ok(envelope.into_vec())
    }

    /// One order placed by the token's owner (`GET /api/my-orders/{id}`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the order does not exist or belongs
    /// to someone else.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn my_order(&self, token: &str, id: OrderId) -> Result<Order, ApiError> {
        let envelope: ItemEnvelope<Order> = self
            .execute(self.request(Method::GET, &format!("my-orders/{id}"), Some(token)))
            .await?;
        Ok(envelope.into_inner())
    }
}
