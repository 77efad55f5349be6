use serde::{Deserialize, Serialize};

/// Rows per page used by every list screen.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Pagination parameters sent as query string on list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
        }
    }
}

impl PageQuery {
    pub fn new(page: u32) -> Self {
        Self {
            page: page.max(1),
            ..Self::default()
        }
    }

    /// Blank searches are dropped rather than sent as `search=`.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        let trimmed = search.trim();
        self.search = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(ref search) = self.search {
            query.push(("search", search.clone()));
        }
        query
    }

    /// Cache entry name for a resource listed with these parameters.
    pub fn cache_key(&self, resource: &str) -> String {
        let mut key = format!("{}-p{}-l{}", resource, self.page, self.limit);
        if let Some(ref search) = self.search {
            let slug: String = search
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
                .collect();
            key.push_str("-s");
            key.push_str(&slug);
        }
        key
    }
}

/// Pagination block some list endpoints attach to their payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub total: Option<u64>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    #[serde(rename = "totalPages")]
    pub total_pages: Option<u64>,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    /// A page whose total is just the number of rows returned.
    pub fn from_items(items: Vec<T>) -> Self {
        let total = items.len() as u64;
        Self { items, total }
    }

    pub fn with_total(items: Vec<T>, total: Option<u64>) -> Self {
        let total = total.unwrap_or(items.len() as u64);
        Self { items, total }
    }

    /// 1-based first and last row shown for `query`, clamped to the total.
    pub fn showing_range(&self, query: &PageQuery) -> (u64, u64) {
        let page = u64::from(query.page.max(1));
        let limit = u64::from(query.limit);
        let first = ((page - 1) * limit + 1).min(self.total);
        let last = (page * limit).min(self.total);
        (first, last)
    }

    pub fn total_pages(&self, limit: u32) -> u64 {
        if limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(limit))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
