use std::collections::BTreeMap;
use std::str::FromStr;

use fieldforce_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Page size used by list views unless the user picks another one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Sort direction for collection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AppError::Validation(format!(
                "unknown sort direction '{value}'"
            ))),
        }
    }
}

/// Sort field plus direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    /// Backend field name.
    pub field: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Creates a sort specification.
    #[must_use]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Parameters of one list request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionQuery {
    page: u32,
    page_size: u32,
    sort: Option<SortSpec>,
    search_term: String,
    status_filter: Option<String>,
}

impl Default for CollectionQuery {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
            search_term: String::new(),
            status_filter: None,
        }
    }
}

impl CollectionQuery {
    /// Creates a first-page query with the given page size.
    pub fn new(page_size: u32) -> AppResult<Self> {
        let mut query = Self::default();
        query.set_page_size(page_size)?;
        Ok(query)
    }

    /// Smallest query whose page metadata reveals a category's total.
    #[must_use]
    pub fn count_probe(category: impl Into<String>) -> Self {
        Self {
            page: 0,
            page_size: 1,
            sort: None,
            search_term: String::new(),
            status_filter: Some(category.into()),
        }
    }

    /// Returns a copy targeting another page.
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Returns a copy with a status filter.
    #[must_use]
    pub fn with_status_filter(mut self, status: Option<String>) -> Self {
        self.set_status_filter(status);
        self
    }

    /// Returns a copy with a search term.
    #[must_use]
    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    /// Returns a copy with a sort specification.
    #[must_use]
    pub fn with_sort(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    /// Zero-based page index.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Items per page, always greater than zero.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Optional sort specification.
    #[must_use]
    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// Free-text search term, possibly empty.
    #[must_use]
    pub fn search_term(&self) -> &str {
        self.search_term.as_str()
    }

    /// Trimmed search term, `None` when blank.
    #[must_use]
    pub fn effective_search_term(&self) -> Option<&str> {
        let trimmed = self.search_term.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Optional status filter.
    #[must_use]
    pub fn status_filter(&self) -> Option<&str> {
        self.status_filter.as_deref()
    }

    /// Sets the page index.
    pub fn set_page(&mut self, page: u32) {
        self.page = page;
    }

    /// Sets the page size, rejecting zero.
    pub fn set_page_size(&mut self, page_size: u32) -> AppResult<()> {
        if page_size == 0 {
            return Err(AppError::Validation(
                "page size must be greater than zero".to_owned(),
            ));
        }

        self.page_size = page_size;
        Ok(())
    }

    /// Sets the sort specification.
    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.sort = sort;
    }

    /// Sets the free-text search term.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Sets the status filter; blank values clear it.
    pub fn set_status_filter(&mut self, status: Option<String>) {
        self.status_filter = status.filter(|value| !value.trim().is_empty());
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPage<T> {
    /// Items in server order.
    pub items: Vec<T>,
    /// Zero-based page index.
    pub page_index: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Number of items across every page.
    pub total_items: u64,
    /// Number of pages.
    pub total_pages: u32,
}

impl<T> CollectionPage<T> {
    /// Creates an empty page for the given query.
    #[must_use]
    pub fn empty(query: &CollectionQuery) -> Self {
        Self {
            items: Vec::new(),
            page_index: query.page(),
            page_size: query.page_size(),
            total_items: 0,
            total_pages: 0,
        }
    }

    /// Returns whether this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns whether another page follows this one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page_index.saturating_add(1) < self.total_pages
    }
}

/// Slices an ordered result set into the page a query asks for.
///
/// Pages past the end are empty, not errors.
#[must_use]
pub fn paginate<T: Clone>(items: &[T], page: u32, page_size: u32) -> CollectionPage<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = u32::try_from(total_items.div_ceil(page_size as usize)).unwrap_or(u32::MAX);
    let start = (page as usize).saturating_mul(page_size as usize);
    let slice = items
        .iter()
        .skip(start)
        .take(page_size as usize)
        .cloned()
        .collect();

    CollectionPage {
        items: slice,
        page_index: page,
        page_size,
        total_items: total_items as u64,
        total_pages,
    }
}

/// Paginated envelope returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope<T> {
    /// Page items.
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    /// Zero-based page index.
    #[serde(default, alias = "number")]
    pub page: u32,
    /// Page size.
    #[serde(default)]
    pub size: u32,
    /// Items across every page.
    #[serde(default)]
    pub total_elements: u64,
    /// Page count.
    #[serde(default)]
    pub total_pages: u32,
    /// Whether this is the first page.
    #[serde(default)]
    pub first: bool,
    /// Whether this is the last page.
    #[serde(default)]
    pub last: bool,
    /// Whether the page is empty.
    #[serde(default)]
    pub empty: bool,
}

impl<T> From<PageEnvelope<T>> for CollectionPage<T> {
    fn from(envelope: PageEnvelope<T>) -> Self {
        Self {
            items: envelope.content,
            page_index: envelope.page,
            page_size: envelope.size,
            total_items: envelope.total_elements,
            total_pages: envelope.total_pages,
        }
    }
}

/// Record shape the in-memory source and client-side tally rely on.
pub trait CollectionItem: Clone + Send + Sync + 'static {
    /// Category used for status filters and tab counts.
    fn category(&self) -> Option<&str> {
        None
    }

    /// Text fields the free-text search looks at.
    fn search_fields(&self) -> Vec<&str>;

    /// Comparable value for a sort field, `None` if the field is unknown.
    fn sort_value(&self, field: &str) -> Option<String>;
}

/// Per-category totals for tab badges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCounts {
    counts: BTreeMap<String, u64>,
    failed: Vec<String>,
}

impl AggregateCounts {
    /// Creates counts with every category at zero.
    #[must_use]
    pub fn zeroed<S: AsRef<str>>(categories: &[S]) -> Self {
        Self {
            counts: categories
                .iter()
                .map(|category| (category.as_ref().to_owned(), 0))
                .collect(),
            failed: Vec::new(),
        }
    }

    /// Sets the count of one category.
    pub fn set(&mut self, category: impl Into<String>, count: u64) {
        self.counts.insert(category.into(), count);
    }

    /// Increments one category if it is tracked.
    pub fn increment(&mut self, category: &str) {
        if let Some(count) = self.counts.get_mut(category) {
            *count = count.saturating_add(1);
        }
    }

    /// Records a category whose count could not be fetched. It reads as zero.
    pub fn mark_failed(&mut self, category: impl Into<String>) {
        let category = category.into();
        self.counts.insert(category.clone(), 0);
        if !self.failed.contains(&category) {
            self.failed.push(category);
        }
    }

    /// Returns the count of one category, zero when unknown.
    #[must_use]
    pub fn get(&self, category: &str) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// Returns the sum over every category.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Returns categories in name order with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts
            .iter()
            .map(|(category, count)| (category.as_str(), *count))
    }

    /// Returns categories whose request failed.
    #[must_use]
    pub fn failed(&self) -> &[String] {
        &self.failed
    }
}
