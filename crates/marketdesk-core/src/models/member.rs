use serde::{Deserialize, Serialize};

use super::{Media, Pagination};
use crate::utils::format_date;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub avatar: Option<Media>,
    #[serde(rename = "shopId")]
    pub shop_id: Option<String>,
    #[serde(rename = "vendorStatus")]
    pub vendor_status: Option<String>,
    pub role: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

impl Seller {
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar.as_ref().and_then(|a| a.url.as_deref())
    }

    pub fn shop(&self) -> &str {
        self.shop_id.as_deref().unwrap_or("")
    }

    pub fn display_date(&self) -> String {
        self.created_at.as_deref().map(format_date).unwrap_or_default()
    }

    /// Two-letter avatar fallback.
    pub fn initials(&self) -> String {
        self.name.chars().take(2).collect()
    }
}

/// Outcome of a seller application review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SellerDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct SellerStatusUpdate {
    pub status: SellerDecision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Buyer {
    #[serde(rename = "userId")]
    pub id: String,
    #[serde(rename = "buyerName", default)]
    pub name: String,
    #[serde(rename = "totalOrders", default)]
    pub total_orders: u64,
    #[serde(rename = "deliveredOrders", default)]
    pub delivered_orders: u64,
    #[serde(rename = "activityLog")]
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BuyersPayload {
    #[serde(default)]
    pub users: Vec<Buyer>,
    pub pagination: Option<Pagination>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seller_helpers() {
        let json = r#"{"_id": "s1", "name": "Acme Goods", "email": "a@acme.io",
            "avatar": {"url": "https://cdn/a.png"}, "vendorStatus": "pending"}"#;
        let seller: Seller = serde_json::from_str(json).expect("parse seller");
        assert_eq!(seller.avatar_url(), Some("https://cdn/a.png"));
        assert_eq!(seller.shop(), "");
        assert_eq!(seller.initials(), "Ac");
        assert_eq!(
            serde_json::to_value(SellerStatusUpdate { status: SellerDecision::Rejected }).expect("serialize"),
            serde_json::json!({"status": "rejected"})
        );
    }

    #[test]
    fn test_buyers_payload() {
        let json = r#"{"users": [{"userId": "b1", "buyerName": "Kim", "totalOrders": 5,
            "deliveredOrders": 3, "activityLog": "active"}], "pagination": {"total": 31}}"#;
        let payload: BuyersPayload = serde_json::from_str(json).expect("parse buyers");
        assert_eq!(payload.users[0].name, "Kim");
        assert_eq!(payload.users[0].delivered_orders, 3);
        assert_eq!(payload.pagination.and_then(|p| p.total), Some(31));
    }
}
