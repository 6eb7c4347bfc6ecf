//! Catalog endpoints: products and categories.

use reqwest::Method;
use tracing::{debug, instrument};

use xtremefit_core::ProductId;

use super::cache::{CacheKey, CacheValue};
use super::types::{Category, ItemEnvelope, ListEnvelope, Product};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// List all products (`GET /api/products`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cache().get(&CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let envelope: ListEnvelope<Product> = self
            .execute(self.request(Method::GET, "products", None))
            .await?;
        let products = envelope.into_vec();

        self.cache()
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get one product (`GET /api/products/{id}`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.cache().get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let envelope: ItemEnvelope<Product> = self
            .execute(self.request(Method::GET, &format!("products/{id}"), None))
            .await?;
        let product = envelope.into_inner();

        self.cache()
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List all categories (`GET /api/categories`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache().get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = self.fetch_categories().await?;

        self.cache()
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// Check that the API answers, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), ApiError> {
        self.fetch_categories().await.map(|_| ())
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, ApiError> {
        let envelope: ListEnvelope<Category> = self
            .execute(self.request(Method::GET, "categories", None))
            .await?;
        Ok(envelope.into_vec())
    }

    /// Drop every cached catalog response.
    pub fn invalidate_catalog(&self) {
        self.cache().invalidate_all();
    }
}
