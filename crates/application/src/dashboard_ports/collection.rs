use async_trait::async_trait;
use fieldforce_core::AppResult;
use fieldforce_domain::{CollectionPage, CollectionQuery};

/// Paginated, filterable remote collection.
#[async_trait]
pub trait CollectionSource<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Fetches the page the query describes.
    async fn fetch_page(&self, query: &CollectionQuery) -> AppResult<CollectionPage<T>>;
}

/// Collection that can be fetched whole, for client-side tallies.
#[async_trait]
pub trait FullCollectionSource<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Fetches every record visible to the caller, unfiltered.
    async fn fetch_all(&self) -> AppResult<Vec<T>>;
}
