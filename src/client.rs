use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::credentials::SessionContext;
use crate::error::{Error, GENERIC_MESSAGE, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUEST_RETRIES, CLIENT_REQUESTS,
    CLIENT_RETRY_BACKOFF, CLIENT_UNAUTHORIZED,
};
use crate::retry::RetryPolicy;

/// Side effect run after a 401 has wiped the credential.
///
/// Front ends use this to send the user back to a login prompt.
pub trait UnauthorizedHandler: Send + Sync {
    /// Called once per rejected request, after the credential is cleared.
    fn on_unauthorized(&self);
}

/// An encoded request body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    /// `application/json`.
    Json(Bytes),
    /// `application/x-www-form-urlencoded`.
    Form(Bytes),
}

impl RequestBody {
    /// Encode `value` as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(RequestBody::Json(Bytes::from(serde_json::to_vec(value)?)))
    }

    /// Encode `pairs` as a URL-encoded form.
    pub fn form<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> Self {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in pairs {
            serializer.append_pair(key.as_ref(), value.as_ref());
        }
        RequestBody::Form(Bytes::from(serializer.finish()))
    }

    fn content_type(&self) -> HeaderValue {
        match self {
            RequestBody::Json(_) => HeaderValue::from_static("application/json"),
            RequestBody::Form(_) => HeaderValue::from_static("application/x-www-form-urlencoded"),
        }
    }

    fn into_bytes(self) -> Bytes {
        match self {
            RequestBody::Json(bytes) | RequestBody::Form(bytes) => bytes,
        }
    }
}

/// Per-call extras: query parameters and header overrides.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Query parameters, appended in order.
    pub query: Vec<(String, String)>,
    /// Headers that override the defaults.
    pub headers: HeaderMap,
}

impl RequestOptions {
    /// No query and no extra headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Set a header, replacing any default of the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// One logical request and the number of times it has been re-sent.
///
/// Lives exactly as long as the call that created it.
#[derive(Debug)]
struct RetryableRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    retry_count: u32,
}

/// Client for the study service's REST API.
///
/// Every call gets the bearer credential from the shared [`SessionContext`],
/// a fixed deadline, and exponential-backoff retries on transient statuses.
#[derive(Clone)]
pub struct ApiClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    retry: RetryPolicy,
    session: SessionContext,
    unauthorized: Option<Arc<dyn UnauthorizedHandler>>,
}

impl ApiClient {
    /// Create a client for the origin in `config`, sharing `session`.
    pub fn new(config: &ClientConfig, session: SessionContext) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url: config.api_base()?,
            timeout: config.timeout,
            retry: config.retry,
            session,
            unauthorized: None,
        })
    }

    /// Register the side effect run after a 401.
    pub fn with_unauthorized_handler(mut self, handler: Arc<dyn UnauthorizedHandler>) -> Self {
        self.unauthorized = Some(handler);
        self
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The credential holder this client reads from.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// The URL every path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Issue a request and return the successful response.
    ///
    /// `path` is relative to `/api`; each `/`-separated segment is
    /// percent-encoded on its own.  A 401 clears the credential and fails
    /// without retrying.  Retryable statuses are re-sent unchanged until the
    /// retry budget runs out, after which the last error is returned.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<Response> {
        let url = self.endpoint(path, &options.query)?;
        let headers = self.headers(body.as_ref(), options.headers)?;
        let mut pending = RetryableRequest {
            method,
            url,
            headers,
            body: body.map(RequestBody::into_bytes),
            retry_count: 0,
        };

        loop {
            let err = match self.attempt(&pending).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if err.is_unauthorized() {
                self.invalidate_session();
                CLIENT_REQUEST_ERRORS.click();
                return Err(err);
            }

            if err.is_retryable() && self.retry.has_budget(pending.retry_count) {
                pending.retry_count += 1;
                let delay = self.retry.delay_for_attempt(pending.retry_count);
                tracing::info!(
                    attempt = pending.retry_count,
                    max_retries = self.retry.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    status = err.status_code(),
                    url = %pending.url,
                    "retrying request"
                );
                CLIENT_REQUEST_RETRIES.click();
                CLIENT_RETRY_BACKOFF.add(delay.as_secs_f64());
                tokio::time::sleep(delay).await;
                continue;
            }

            tracing::debug!(
                method = %pending.method,
                url = %pending.url,
                retries = pending.retry_count,
                error = %err,
                "request failed"
            );
            CLIENT_REQUEST_ERRORS.click();
            return Err(err);
        }
    }

    /// GET `path` and decode the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        let response = self.request(Method::GET, path, None, options).await?;
        Self::parse(response).await
    }

    /// POST a JSON body to `path` and decode the JSON response.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T> {
        let body = RequestBody::json(body)?;
        let response = self.request(Method::POST, path, Some(body), options).await?;
        Self::parse(response).await
    }

    /// POST with no body, e.g. when everything travels in the query string.
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let response = self.request(Method::POST, path, None, options).await?;
        Self::parse(response).await
    }

    /// PUT a JSON body to `path` and decode the JSON response.
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T> {
        let body = RequestBody::json(body)?;
        let response = self.request(Method::PUT, path, Some(body), options).await?;
        Self::parse(response).await
    }

    /// POST a URL-encoded form to `path` and decode the JSON response.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        pairs: &[(&str, &str)],
        options: RequestOptions,
    ) -> Result<T> {
        let body = RequestBody::form(pairs);
        let response = self.request(Method::POST, path, Some(body), options).await?;
        Self::parse(response).await
    }

    /// DELETE `path`, discarding any response body.
    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<()> {
        self.request(Method::DELETE, path, None, options).await?;
        Ok(())
    }

    fn endpoint(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::url(format!("{} cannot be a base URL", self.base_url), None))?;
            segments.pop_if_empty();
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn headers(&self, body: Option<&RequestBody>, overrides: HeaderMap) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            body.map(RequestBody::content_type)
                .unwrap_or_else(|| HeaderValue::from_static("application/json")),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = self.session.get() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                Error::validation(
                    format!("bearer token is not a valid header value: {e}"),
                    Some("token".to_string()),
                )
            })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        for (name, value) in overrides.iter() {
            headers.insert(name.clone(), value.clone());
        }
        Ok(headers)
    }

    async fn attempt(&self, pending: &RetryableRequest) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let mut builder = self
            .client
            .request(pending.method.clone(), pending.url.clone())
            .headers(pending.headers.clone());
        if let Some(body) = &pending.body {
            builder = builder.body(body.clone());
        }
        let result = builder.send().await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = result.map_err(|e| self.transport_error(e))?;
        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() || e.is_request() {
            Error::network(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    fn invalidate_session(&self) {
        CLIENT_UNAUTHORIZED.click();
        self.session.clear();
        tracing::warn!("credential rejected; session cleared");
        if let Some(handler) = &self.unauthorized {
            handler.on_unauthorized();
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        // The service reports failures as `{"detail": ...}`; validation
        // failures carry a structured detail that is not fit for display.
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| value.get("detail").cloned())
            .and_then(|detail| match detail {
                Value::Null => None,
                Value::String(detail) => Some(detail),
                _ => Some(GENERIC_MESSAGE.to_string()),
            });
        Error::from_status(status_code, detail)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("session", &self.session)
            .field("unauthorized_handler", &self.unauthorized.is_some())
            .finish()
    }
}
