//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_api_client;
mod in_memory_collection_source;
mod in_memory_preference_store;
mod json_file_preference_store;
mod static_token_provider;

pub use http_api_client::{DEFAULT_HTTP_TIMEOUT, HttpApiClient, HttpApiClientConfig};
pub use in_memory_collection_source::InMemoryCollectionSource;
pub use in_memory_preference_store::InMemoryPreferenceStore;
pub use json_file_preference_store::JsonFilePreferenceStore;
pub use static_token_provider::StaticTokenProvider;
