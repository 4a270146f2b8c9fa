use std::cmp::Ordering;

use async_trait::async_trait;
use fieldforce_application::{CollectionSource, FullCollectionSource};
use fieldforce_core::AppResult;
use fieldforce_domain::{
    CollectionItem, CollectionPage, CollectionQuery, SortDirection, paginate,
};
use tokio::sync::RwLock;

/// Collection held in memory and queried locally.
///
/// Used for lists the backend only returns whole, such as a coordinator's
/// team, so they page, filter and search like any remote collection.
#[derive(Default)]
pub struct InMemoryCollectionSource<T> {
    items: RwLock<Vec<T>>,
}

impl<T: CollectionItem> InMemoryCollectionSource<T> {
    /// Creates a source over the given records.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }

    /// Replaces every record.
    pub async fn replace(&self, items: Vec<T>) {
        *self.items.write().await = items;
    }

    /// Returns the number of records held.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Returns whether no record is held.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

fn matches_query<T: CollectionItem>(item: &T, query: &CollectionQuery) -> bool {
    if let Some(status) = query.status_filter()
        && item.category() != Some(status)
    {
        return false;
    }

    match query.effective_search_term() {
        Some(term) => {
            let needle = term.to_lowercase();
            item.search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        }
        None => true,
    }
}

#[async_trait]
impl<T: CollectionItem> CollectionSource<T> for InMemoryCollectionSource<T> {
    async fn fetch_page(&self, query: &CollectionQuery) -> AppResult<CollectionPage<T>> {
        let mut matching: Vec<T> = self
            .items
            .read()
            .await
            .iter()
            .filter(|item| matches_query(*item, query))
            .cloned()
            .collect();

        if let Some(sort) = query.sort() {
            matching.sort_by(|left, right| {
                let ordering = match (
                    left.sort_value(&sort.field),
                    right.sort_value(&sort.field),
                ) {
                    (Some(left), Some(right)) => left.cmp(&right),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        Ok(paginate(&matching, query.page(), query.page_size()))
    }
}

#[async_trait]
impl<T: CollectionItem> FullCollectionSource<T> for InMemoryCollectionSource<T> {
    async fn fetch_all(&self) -> AppResult<Vec<T>> {
        Ok(self.items.read().await.clone())
    }
}
