//! Categories and products.

use anyhow::{Context, Result};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::client::unwrap_data;
use super::AdminClient;
use crate::models::catalog::{ProductsPayload, VerifyProduct};
use crate::models::{Category, CategoryInput, Page, PageQuery, Product};

impl AdminClient {
    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    /// The category endpoint does not report a total; the page size is it.
    pub async fn list_categories(&self, query: &PageQuery) -> Result<Page<Category>> {
        let items: Vec<Category> = self
            .get("/category", &query.to_query())
            .await
            .context("Failed to fetch categories")?;
        Ok(Page::from_items(items))
    }

    pub async fn create_category(&self, input: &CategoryInput) -> Result<Value> {
        self.post("/category/add", input)
            .await
            .context("Failed to create category")
    }

    pub async fn update_category(&self, id: &str, input: &CategoryInput) -> Result<Value> {
        self.put(&format!("/category/{}", id), input)
            .await
            .context("Failed to update category")
    }

    pub async fn delete_category(&self, id: &str) -> Result<Value> {
        self.delete(&format!("/category/{}", id))
            .await
            .context("Failed to delete category")
    }

    /// Create when `id` is `None`, otherwise update.
    pub async fn save_category(&self, id: Option<&str>, input: &CategoryInput) -> Result<Value> {
        match id {
            Some(id) => self.update_category(id, input).await,
            None => self.create_category(input).await,
        }
    }

    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    pub async fn list_products(&self, query: &PageQuery) -> Result<Page<Product>> {
        let body = self
            .send(Method::GET, "/product", &query.to_query(), None)
            .await
            .context("Failed to fetch products")?;

        // Older deployments put pagination next to `data` instead of inside it
        let root_total = body.pointer("/pagination/total").and_then(Value::as_u64);

        let payload: ProductsPayload = unwrap_data(body).context("Failed to parse products")?;
        Ok(match payload {
            ProductsPayload::Paged { products, pagination } => {
                let total = pagination.and_then(|p| p.total).or(root_total);
                Page::with_total(products, total)
            }
            ProductsPayload::Plain(products) => Page::with_total(products, root_total),
        })
    }

    /// Submit a product for review. The body is passed through unchanged.
    pub async fn request_product<B: Serialize>(&self, product: &B) -> Result<Value> {
        self.post("/product/add", product)
            .await
            .context("Failed to submit product")
    }

    pub async fn approve_product(&self, id: &str) -> Result<Value> {
        self.verify_product(id, true).await
    }

    pub async fn reject_product(&self, id: &str) -> Result<Value> {
        self.verify_product(id, false).await
    }

    async fn verify_product(&self, id: &str, verified: bool) -> Result<Value> {
        self.patch(&format!("/product/{}/verify", id), &VerifyProduct { verified })
            .await
            .with_context(|| format!("Failed to update verification of product {}", id))
    }
}
