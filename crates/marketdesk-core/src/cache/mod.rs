//! Local response cache.
//!
//! `CacheManager` keeps API responses as JSON files so list screens can show
//! something immediately and refetch only once an entry is stale. Entry
//! names are the resource followed by its query (see
//! [`PageQuery::cache_key`](crate::models::PageQuery::cache_key)), so a
//! mutation drops every cached page of its resource with one prefix
//! invalidation.

pub mod manager;

pub use manager::{CacheManager, CachedData, DEFAULT_STALE_MINUTES};
