//! Admin endpoints for products and orders.
//!
//! Every call requires an admin token. Product writes drop the catalog cache
//! so storefront pages show the change immediately.

use reqwest::Method;
use tracing::instrument;

use xtremefit_core::{OrderId, OrderStatus, ProductId};

use super::types::{ItemEnvelope, ListEnvelope, Order, Product, ProductInput, StatusUpdateRequest};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// All products, including ones hidden from the storefront.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn admin_products(&self, token: &str) -> Result<Vec<Product>, ApiError> {
        let envelope: ListEnvelope<Product> = self
            .execute(self.request(Method::GET, "admin/products", Some(token)))
            .await?;
        Ok(envelope.into_vec())
    }

    /// Create a product from a multipart form.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] with field errors when the API
    /// rejects the input.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        token: &str,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let request = self
            .request(Method::POST, "admin/products", Some(token))
            .multipart(input.to_multipart()?);
        let envelope: ItemEnvelope<Product> = self.execute(request).await?;
        self.invalidate_catalog();
        Ok(envelope.into_inner())
    }

    /// Update a product from a multipart form.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] with field errors when the API
    /// rejects the input.
    #[instrument(skip(self, token, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &str,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let request = self
            .request(Method::POST, &format!("admin/products/{id}"), Some(token))
            .multipart(input.to_multipart()?);
        let envelope: ItemEnvelope<Product> = self.execute(request).await?;
        self.invalidate_catalog();
        Ok(envelope.into_inner())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses or the request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &str, id: ProductId) -> Result<(), ApiError> {
        self.execute_unit(self.request(
            Method::DELETE,
            &format!("admin/products/{id}"),
            Some(token),
        ))
        .await?;
        self.invalidate_catalog();
        Ok(())
    }

    /// All orders, with customer and items.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn admin_orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        let envelope: ListEnvelope<Order> = self
            .execute(self.request(Method::GET, "admin/orders", Some(token)))
            .await?;
        Ok(envelope.into_vec())
    }

    /// Move an order to a new status and return the updated order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the transition or the request fails.
    #[instrument(skip(self, token), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        token: &str,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let request = self
            .request(Method::PUT, &format!("admin/orders/{id}"), Some(token))
            .json(&StatusUpdateRequest { status });
        let envelope: ItemEnvelope<Order> = self.execute(request).await?;
        Ok(envelope.into_inner())
    }
}
