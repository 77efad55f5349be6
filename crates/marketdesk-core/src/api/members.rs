//! Sellers, seller applications and buyers.

use anyhow::{Context, Result};
use serde_json::Value;

use super::AdminClient;
use crate::models::member::{BuyersPayload, SellerStatusUpdate};
use crate::models::{Buyer, Page, PageQuery, Seller, SellerDecision};

impl AdminClient {
    pub async fn list_sellers(&self, query: &PageQuery) -> Result<Page<Seller>> {
        let items: Vec<Seller> = self
            .get("/user/sellers", &query.to_query())
            .await
            .context("Failed to fetch sellers")?;
        Ok(Page::from_items(items))
    }

    /// Applications still waiting for a decision.
    pub async fn seller_requests(&self, query: &PageQuery) -> Result<Page<Seller>> {
        let items: Vec<Seller> = self
            .get("/user/sellers/pending", &query.to_query())
            .await
            .context("Failed to fetch seller requests")?;
        Ok(Page::from_items(items))
    }

    pub async fn review_seller(&self, id: &str, decision: SellerDecision) -> Result<Value> {
        self.patch(
            &format!("/user/sellers/{}/status", id),
            &SellerStatusUpdate { status: decision },
        )
        .await
        .with_context(|| format!("Failed to review seller {}", id))
    }

    pub async fn approve_seller(&self, id: &str) -> Result<Value> {
        self.review_seller(id, SellerDecision::Approved).await
    }

    pub async fn reject_seller(&self, id: &str) -> Result<Value> {
        self.review_seller(id, SellerDecision::Rejected).await
    }

    pub async fn list_buyers(&self, query: &PageQuery) -> Result<Page<Buyer>> {
        let payload: BuyersPayload = self
            .get("/admin/dashboard/users", &query.to_query())
            .await
            .context("Failed to fetch buyers")?;
        let total = payload.pagination.and_then(|p| p.total);
        Ok(Page::with_total(payload.users, total))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::models::PageQuery;
    use crate::testutil::signed_in_client;

    #[tokio::test]
    async fn test_seller_requests_and_review() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/sellers/pending"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "_id": "s1", "name": "Acme", "email": "a@acme.io", "shopId": "acme-shop" }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/user/sellers/s1/status"))
            .and(body_json(json!({ "status": "approved" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/user/sellers/s2/status"))
            .and(body_json(json!({ "status": "rejected" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in_client(&server);
        let page = client.seller_requests(&PageQuery::default()).await.expect("requests");
        assert_eq!(page.items[0].shop(), "acme-shop");

        client.approve_seller("s1").await.expect("approve");
        client.reject_seller("s2").await.expect("reject");
    }

    #[tokio::test]
    async fn test_list_sellers_bare_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/sellers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "_id": "s1", "name": "Acme" },
                { "_id": "s2", "name": "Bolt" }
            ])))
            .mount(&server)
            .await;

        let page = signed_in_client(&server)
            .list_sellers(&PageQuery::default())
            .await
            .expect("sellers");
        assert_eq!(page.total, 2);
        assert_eq!(page.items[1].name, "Bolt");
    }

    #[tokio::test]
    async fn test_list_buyers_uses_reported_total() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/dashboard/users"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "users": [{ "userId": "b1", "buyerName": "Kim", "totalOrders": 2, "activityLog": "active" }],
                    "pagination": { "total": 21 }
                }
            })))
            .mount(&server)
            .await;

        let query = PageQuery::new(3);
        let page = signed_in_client(&server).list_buyers(&query).await.expect("buyers");
        assert_eq!(page.total, 21);
        assert_eq!(page.showing_range(&query), (21, 21));
        assert_eq!(page.items[0].status.as_deref(), Some("active"));
    }
}
