use std::sync::Arc;
use std::time::Duration;

use fieldforce_application::TokenProvider;
use fieldforce_core::{AppError, AppResult};
use fieldforce_domain::{CollectionPage, CollectionQuery, PageEnvelope};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

mod attendance;
mod dashboard;
mod employees;
mod ports;
mod records;
mod visits;


/// Default request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`HttpApiClient`].
#[derive(Debug, Clone)]
pub struct HttpApiClientConfig {
    /// API root including the proxy prefix, e.g. `http://host/api/proxy`.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpApiClientConfig {
    /// Parses the base URL and keeps the default timeout.
    pub fn new(base_url: &str) -> AppResult<Self> {
        let base_url = Url::parse(base_url).map_err(|error| {
            AppError::Validation(format!("invalid API base URL '{base_url}': {error}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "API base URL '{base_url}' cannot carry paths"
            )));
        }

        Ok(Self {
            base_url,
            timeout: DEFAULT_HTTP_TIMEOUT,
        })
    }

    /// Overrides the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Typed client for the backend REST API.
///
/// Reads are plain GETs; mutations are sent exactly once and never retried
/// here. The bearer token is read from the provider on every request.
#[derive(Clone)]
pub struct HttpApiClient {
    http_client: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenProvider>,
}

/// How a JSON list endpoint treats a body that is not JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListDecoding {
    Strict,
    Lenient,
}

impl HttpApiClient {
    /// Builds a client with its own connection pool.
    pub fn new(config: HttpApiClientConfig, tokens: Arc<dyn TokenProvider>) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

        Ok(Self::with_http_client(http_client, config.base_url, tokens))
    }

    /// Wraps an existing reqwest client.
    #[must_use]
    pub fn with_http_client(
        http_client: reqwest::Client,
        base_url: Url,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            http_client,
            base_url,
            tokens,
        }
    }

    /// Returns the API root.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Internal(format!("API base URL '{}' cannot carry paths", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn collection_endpoint(&self, segments: &[&str], query: &CollectionQuery) -> AppResult<Url> {
        let mut url = self.endpoint(segments)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("page", &query.page().to_string())
                .append_pair("size", &query.page_size().to_string());
            if let Some(sort) = query.sort() {
                pairs.append_pair(
                    "sort",
                    &format!("{},{}", sort.field, sort.direction.as_str()),
                );
            }
            if let Some(search) = query.effective_search_term() {
                pairs.append_pair("search", search);
            }
            if let Some(status) = query.status_filter() {
                pairs.append_pair("status", status);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http_client.request(method, url);
        match self.tokens.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> AppResult<Response> {
        let path = url.path().to_owned();
        let mut builder = self.request(method.clone(), url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|error| {
            warn!(method = %method, path = %path, error = %error, "api request failed");
            AppError::Network(error.to_string())
        })?;

        let status = response.status();
        debug!(method = %method, path = %path, status = status.as_u16(), "api request completed");
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response body unavailable>".to_owned());
        warn!(method = %method, path = %path, status = status.as_u16(), "api request rejected");
        Err(AppError::http(status.as_u16(), &body))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<Option<T>> {
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_none_or(|value| value.to_ascii_lowercase().contains("json"));
        let bytes = response
            .bytes()
            .await
            .map_err(|error| AppError::Network(error.to_string()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        if !is_json {
            return Err(AppError::Decode(
                "expected a JSON response body".to_owned(),
            ));
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|error| AppError::Decode(error.to_string()))
    }

    async fn get_object<T: DeserializeOwned>(&self, url: Url) -> AppResult<T> {
        let response = self.send(Method::GET, url, None).await?;
        Self::read_json(response)
            .await?
            .ok_or_else(|| AppError::Decode("expected a JSON object, got an empty body".to_owned()))
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        url: Url,
        decoding: ListDecoding,
    ) -> AppResult<Vec<T>> {
        let path = url.path().to_owned();
        let response = self.send(Method::GET, url, None).await?;
        match Self::read_json(response).await {
            Ok(items) => Ok(items.unwrap_or_default()),
            Err(AppError::Decode(reason)) if decoding == ListDecoding::Lenient => {
                debug!(path = %path, reason = %reason, "non-JSON list body treated as empty");
                Ok(Vec::new())
            }
            Err(error) => Err(error),
        }
    }

    async fn get_page<T: DeserializeOwned>(&self, url: Url) -> AppResult<CollectionPage<T>> {
        let envelope: PageEnvelope<T> = self.get_object(url).await?;
        Ok(envelope.into())
    }

    async fn send_for_object<T, B>(&self, method: Method, url: Url, body: &B) -> AppResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = to_json(body)?;
        let response = self.send(method, url, Some(&body)).await?;
        Self::read_json(response)
            .await?
            .ok_or_else(|| AppError::Decode("expected a JSON object, got an empty body".to_owned()))
    }

    async fn send_without_result(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> AppResult<()> {
        self.send(method, url, body).await.map(|_| ())
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> AppResult<Value> {
    serde_json::to_value(body)
        .map_err(|error| AppError::Internal(format!("failed to encode request body: {error}")))
}
