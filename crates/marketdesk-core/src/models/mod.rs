//! Data models for the marketplace admin API.
//!
//! - `Category`, `Product`: catalog records
//! - `Seller`, `Buyer`: marketplace members
//! - `Banner`, `SubscriptionPlan`: marketing content
//! - `Overview` and the chart reports with their normalizers
//! - `PageQuery` / `Page`: pagination

pub mod account;
pub mod catalog;
pub mod marketing;
pub mod member;
pub mod page;
pub mod report;

use serde::{Deserialize, Serialize};

pub use account::{ApiMessage, Profile, ProfileUpdate};
pub use catalog::{Category, CategoryInput, Product};
pub use marketing::{Banner, SubscriptionInput, SubscriptionPlan};
pub use member::{Buyer, Seller, SellerDecision};
pub use page::{Page, PageQuery, Pagination, DEFAULT_PAGE_SIZE};
pub use report::{
    format_label, normalize_joining, normalize_revenue, JoiningReport, JoiningRow, Overview,
    Period, RevenueReport, RevenueRow,
};

/// Uploaded file reference (`{ url }`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Media {
    pub url: Option<String>,
}

/// A relation the API sends either populated (`{ _id, name }`) or as a bare id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamedRef {
    Populated {
        #[serde(rename = "_id")]
        id: String,
        name: Option<String>,
    },
    Id(String),
}

impl NamedRef {
    pub fn id(&self) -> &str {
        match self {
            NamedRef::Populated { id, .. } => id,
            NamedRef::Id(id) => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            NamedRef::Populated { name, .. } => name.as_deref(),
            NamedRef::Id(_) => None,
        }
    }
}
