use serde::{Deserialize, Serialize};

use super::{Media, NamedRef, Pagination};
use crate::utils::format_date;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub parent: Option<NamedRef>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

impl Category {
    pub fn display_date(&self) -> String {
        self.created_at.as_deref().map(format_date).unwrap_or_default()
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_ref().map(NamedRef::id)
    }
}

/// Body of the category create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl CategoryInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// An empty parent id means "top level".
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        let parent = parent.into();
        self.parent = if parent.is_empty() { None } else { Some(parent) };
        self
    }

    /// Pre-fill the edit form from an existing category.
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            color: category.color.clone().unwrap_or_default(),
            parent: category.parent_id().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub photos: Vec<Media>,
    #[serde(rename = "detailedDescription")]
    pub detailed_description: Option<String>,
    pub country: Option<String>,
    pub category: Option<NamedRef>,
    pub vendor: Option<NamedRef>,
    pub status: Option<String>,
    pub verified: Option<bool>,
    #[serde(default)]
    pub colors: Vec<String>,
}

impl Product {
    /// The SKU when there is one, otherwise the record id.
    pub fn product_id(&self) -> &str {
        self.sku.as_deref().filter(|s| !s.is_empty()).unwrap_or(&self.id)
    }

    /// The thumbnail, falling back to the first photo.
    pub fn image(&self) -> Option<&str> {
        self.thumbnail
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.photos.first().and_then(|p| p.url.as_deref()))
    }

    pub fn display_price(&self) -> String {
        self.price.map(|p| format!("${:.2}", p)).unwrap_or_else(|| "-".to_string())
    }

    pub fn display_verified(&self) -> &'static str {
        if self.verified.unwrap_or(false) {
            "Yes"
        } else {
            "No"
        }
    }
}

/// `data` of the product list: either `{ products, pagination }` or a bare
/// array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProductsPayload {
    Paged {
        products: Vec<Product>,
        pagination: Option<Pagination>,
    },
    Plain(Vec<Product>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct VerifyProduct {
    pub verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_fallbacks() {
        let json = r#"{"_id": "p1", "title": "Lamp", "sku": "", "price": 12.5,
            "photos": [{"url": "https://cdn/p1.jpg"}], "verified": true}"#;
        let product: Product = serde_json::from_str(json).expect("parse product");
        assert_eq!(product.product_id(), "p1");
        assert_eq!(product.image(), Some("https://cdn/p1.jpg"));
        assert_eq!(product.display_price(), "$12.50");
        assert_eq!(product.display_verified(), "Yes");

        let json = r#"{"_id": "p2", "title": "Desk", "sku": "DSK-1", "thumbnail": "https://cdn/t.jpg"}"#;
        let product: Product = serde_json::from_str(json).expect("parse product");
        assert_eq!(product.product_id(), "DSK-1");
        assert_eq!(product.image(), Some("https://cdn/t.jpg"));
        assert_eq!(product.display_price(), "-");
    }

    #[test]
    fn test_products_payload_shapes() {
        let paged: ProductsPayload = serde_json::from_str(
            r#"{"products": [{"_id": "p1"}], "pagination": {"total": 40}}"#,
        )
        .expect("parse paged");
        assert!(matches!(paged, ProductsPayload::Paged { ref products, pagination: Some(ref p) }
            if products.len() == 1 && p.total == Some(40)));

        let plain: ProductsPayload = serde_json::from_str(r#"[{"_id": "p1"}, {"_id": "p2"}]"#).expect("parse plain");
        assert!(matches!(plain, ProductsPayload::Plain(ref v) if v.len() == 2));
    }

    #[test]
    fn test_category_input_from_category() {
        let json = r##"{"_id": "c2", "name": "Lamps", "color": "#fff", "parent": {"_id": "c1", "name": "Home"}}"##;
        let category: Category = serde_json::from_str(json).expect("parse category");
        let input = CategoryInput::from_category(&category);
        assert_eq!(input, CategoryInput::new("Lamps").with_color("#fff").with_parent("c1"));

        let body = serde_json::to_value(CategoryInput::new("Top").with_parent("")).expect("serialize");
        assert_eq!(body, serde_json::json!({"name": "Top", "color": ""}));
    }
}
