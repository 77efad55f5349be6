use serde::{Deserialize, Serialize};

use super::Media;
use crate::utils::format_date;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    #[serde(rename = "_id")]
    pub id: String,
    pub banner: Option<Media>,
    pub image: Option<Media>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

impl Banner {
    pub fn image_url(&self) -> Option<&str> {
        self.banner
            .as_ref()
            .and_then(|m| m.url.as_deref())
            .or_else(|| self.image.as_ref().and_then(|m| m.url.as_deref()))
    }

    pub fn display_date(&self) -> String {
        self.created_at.as_deref().map(format_date).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "planName", default)]
    pub name: String,
    #[serde(rename = "pricePerMonth")]
    pub price_per_month: Option<f64>,
    #[serde(rename = "pricePerYear")]
    pub price_per_year: Option<f64>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

impl SubscriptionPlan {
    pub fn display_pricing(&self) -> String {
        let price = |p: Option<f64>| p.map(|p| format!("${:.2}", p)).unwrap_or_else(|| "-".to_string());
        format!("{}/mo, {}/yr", price(self.price_per_month), price(self.price_per_year))
    }
}

/// Body of the subscription plan create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionInput {
    #[serde(rename = "planName")]
    pub name: String,
    #[serde(rename = "pricePerMonth")]
    pub price_per_month: f64,
    #[serde(rename = "pricePerYear")]
    pub price_per_year: f64,
    pub features: Vec<String>,
}
