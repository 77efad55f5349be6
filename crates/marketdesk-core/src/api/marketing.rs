//! Banner ads and subscription plans.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{info, warn};

use super::AdminClient;
use crate::models::{Banner, Page, PageQuery, SubscriptionInput, SubscriptionPlan};

/// Multipart field the banner endpoint reads the image from.
const BANNER_FIELD: &str = "image";

/// Content type for an image file, by extension.
fn image_mime(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

impl AdminClient {
    // ------------------------------------------------------------------
    // Banners
    // ------------------------------------------------------------------

    pub async fn list_banners(&self, query: &PageQuery) -> Result<Page<Banner>> {
        let items: Vec<Banner> = self
            .get("/banner", &query.to_query())
            .await
            .context("Failed to fetch banners")?;
        Ok(Page::from_items(items))
    }

    /// Upload an image file as a new banner.
    pub async fn upload_banner(&self, path: &Path) -> Result<Value> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "banner".to_string());
        self.upload_banner_bytes(file_name, bytes).await
    }

    pub async fn upload_banner_bytes(&self, file_name: String, bytes: Vec<u8>) -> Result<Value> {
        let mime = image_mime(&file_name);
        let part = Part::bytes(bytes).file_name(file_name).mime_str(mime)?;
        let form = Form::new().part(BANNER_FIELD, part);

        let created: Value = self
            .post_multipart("/banner/create", form)
            .await
            .context("Failed to upload banner")?;
        info!("Banner uploaded");
        Ok(created)
    }

    /// Upload `path` and then delete the banner it replaces. The old banner
    /// is only removed once the upload succeeded; failing to remove it is
    /// logged, the new banner stays.
    pub async fn replace_banner(&self, old_id: &str, path: &Path) -> Result<Value> {
        let created = self.upload_banner(path).await?;
        if let Err(e) = self.delete_banner(old_id).await {
            warn!(banner = %old_id, error = %e, "Uploaded replacement but failed to delete old banner");
        }
        Ok(created)
    }

    pub async fn delete_banner(&self, id: &str) -> Result<Value> {
        self.delete(&format!("/banner/{}", id))
            .await
            .context("Failed to delete banner")
    }

    // ------------------------------------------------------------------
    // Subscription plans
    // ------------------------------------------------------------------

    pub async fn list_plans(&self) -> Result<Page<SubscriptionPlan>> {
        let items: Vec<SubscriptionPlan> = self
            .get("/subscription", &[])
            .await
            .context("Failed to fetch subscription plans")?;
        Ok(Page::from_items(items))
    }

    pub async fn create_plan(&self, input: &SubscriptionInput) -> Result<Value> {
        self.post("/subscription", input)
            .await
            .context("Failed to create subscription plan")
    }

    pub async fn update_plan(&self, id: &str, input: &SubscriptionInput) -> Result<Value> {
        self.put(&format!("/subscription/{}", id), input)
            .await
            .context("Failed to update subscription plan")
    }

    pub async fn delete_plan(&self, id: &str) -> Result<Value> {
        self.delete(&format!("/subscription/{}", id))
            .await
            .context("Failed to delete subscription plan")
    }

    /// Create when `id` is `None`, otherwise update.
    pub async fn save_plan(&self, id: Option<&str>, input: &SubscriptionInput) -> Result<Value> {
        match id {
            Some(id) => self.update_plan(id, input).await,
            None => self.create_plan(input).await,
        }
    }
}
