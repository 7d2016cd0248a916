//! Schema-validating transport client over reqwest.
//!
//! Every outbound request flows through [`ApiClient::request`]: default
//! headers are merged with per-call headers, JSON bodies are serialized,
//! and the response is either deserialized into the caller's expected type
//! or classified into an [`ApiError`]. Failures are pushed to the
//! notification sink before being returned — classification is a side
//! effect that never swallows the error.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use tally_application::classify;
use tally_application::ports::Notifier;
use tally_domain::{ApiError, ApiResult, FieldIssue, status_label};

/// Request body variants accepted by the transport.
///
/// Binary and multipart bodies pass through untouched; JSON values are
/// serialized with a `Content-Type: application/json` header.
pub enum Payload {
    /// No body.
    Empty,
    /// JSON body.
    Json(Value),
    /// Multipart form, passed through as-is.
    Multipart(reqwest::multipart::Form),
    /// Raw bytes with an explicit content type, passed through as-is.
    Bytes {
        /// Value for the `Content-Type` header.
        content_type: String,
        /// Body bytes.
        data: Vec<u8>,
    },
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Multipart(_) => f.write_str("Multipart(..)"),
            Self::Bytes { content_type, data } => f
                .debug_struct("Bytes")
                .field("content_type", content_type)
                .field("len", &data.len())
                .finish(),
        }
    }
}

/// One outbound request: method, path relative to the base URL, body, and
/// per-call headers. `context` names the operation and is used only to
/// disambiguate error messages.
#[derive(Debug)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    payload: Payload,
    headers: Vec<(String, String)>,
    context: Option<&'static str>,
}

impl RequestDescriptor {
    /// Creates a descriptor for the given method and relative path.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            payload: Payload::Empty,
            headers: Vec::new(),
            context: None,
        }
    }

    /// GET request descriptor.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST request descriptor.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT request descriptor.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// DELETE request descriptor.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attaches a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if the value cannot be represented as
    /// JSON.
    pub fn with_json<T: Serialize>(mut self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Parse(e.to_string()))?;
        self.payload = Payload::Json(value);
        Ok(self)
    }

    /// Attaches a pre-built payload (multipart, raw bytes).
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Adds a per-call header. Per-call headers override defaults.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Names the operation for error messages.
    #[must_use]
    pub fn with_context(mut self, context: &'static str) -> Self {
        self.context = Some(context);
        self
    }
}

/// Transport client with a process-wide default-header map.
///
/// The default headers are mutated only through [`Self::set_default_header`]
/// and [`Self::remove_default_header`]; in practice the session controller
/// is the single writer, installing and removing the bearer header.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    default_headers: RwLock<HashMap<String, String>>,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    /// Creates a client for the given API base URL.
    pub fn new(mut base_url: Url, notifier: Arc<dyn Notifier>) -> Self {
        // Url::join treats a base without a trailing slash as a file and
        // would replace its last segment.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        Self {
            http: reqwest::Client::builder()
                .user_agent(concat!("Tally/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url,
            default_headers: RwLock::new(HashMap::new()),
            notifier,
        }
    }

    /// Sets a default header applied to every subsequent request.
    pub async fn set_default_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.default_headers
            .write()
            .await
            .insert(name.into(), value.into());
    }

    /// Removes a default header entirely.
    pub async fn remove_default_header(&self, name: &str) {
        self.default_headers.write().await.remove(name);
    }

    /// Executes a request and validates the response against `T`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] after pushing it to the
    /// notification sink.
    pub async fn request<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> ApiResult<T> {
        match self.try_request(descriptor).await {
            Ok(value) => Ok(value),
            Err(error) => Err(self.notify_failure(error)),
        }
    }

    /// GET convenience wrapper.
    ///
    /// # Errors
    ///
    /// See [`Self::request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(RequestDescriptor::get(path)).await
    }

    /// POST convenience wrapper with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::request`].
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        match RequestDescriptor::post(path).with_json(body) {
            Ok(descriptor) => self.request(descriptor).await,
            Err(error) => Err(self.notify_failure(error)),
        }
    }

    /// PUT convenience wrapper with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::request`].
    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        match RequestDescriptor::put(path).with_json(body) {
            Ok(descriptor) => self.request(descriptor).await,
            Err(error) => Err(self.notify_failure(error)),
        }
    }

    /// DELETE convenience wrapper.
    ///
    /// # Errors
    ///
    /// See [`Self::request`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(RequestDescriptor::delete(path)).await
    }

    /// Fetches a raw byte body, bypassing schema validation.
    ///
    /// # Errors
    ///
    /// See [`Self::request`]; status classification still applies.
    pub async fn download(&self, descriptor: RequestDescriptor) -> ApiResult<Vec<u8>> {
        match self.try_download(descriptor).await {
            Ok(bytes) => Ok(bytes),
            Err(error) => Err(self.notify_failure(error)),
        }
    }

    /// Classifies and notifies, then hands the error back for the caller
    /// to return. Never swallows.
    fn notify_failure(&self, error: ApiError) -> ApiError {
        self.notifier.notify(&classify(&error));
        error
    }

    async fn try_request<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> ApiResult<T> {
        let context = descriptor.context;
        let response = self.send(descriptor).await?;
        if !response.status().is_success() {
            return Err(Self::status_failure(response).await);
        }
        Self::validate(response, context).await
    }

    async fn try_download(&self, descriptor: RequestDescriptor) -> ApiResult<Vec<u8>> {
        let response = self.send(descriptor).await?;
        if !response.status().is_success() {
            return Err(Self::status_failure(response).await);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn send(&self, descriptor: RequestDescriptor) -> ApiResult<reqwest::Response> {
        let url = self
            .base_url
            .join(&descriptor.path)
            .map_err(|e| ApiError::Network(format!("invalid request url: {e}")))?;

        let mut headers = self.default_headers.read().await.clone();
        headers.extend(descriptor.headers);

        let mut builder = self.http.request(descriptor.method, url);
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        builder = match descriptor.payload {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(&value),
            Payload::Multipart(form) => builder.multipart(form),
            Payload::Bytes { content_type, data } => {
                builder.header(CONTENT_TYPE, content_type).body(data)
            }
        };

        builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    /// Builds a `Status` error: fixed label for the code plus a best-effort
    /// structured detail from the body.
    async fn status_failure(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let label = status_label(status);
        let body = response.text().await.unwrap_or_default();
        ApiError::Status {
            status,
            label,
            detail: extract_detail(&body, label),
        }
    }

    /// Validates a success response body against `T`.
    async fn validate<T: DeserializeOwned>(
        response: reqwest::Response,
        context: Option<&'static str>,
    ) -> ApiResult<T> {
        let status = response.status().as_u16();
        let length = response.content_length();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        // 204s and length-less non-JSON responses carry no payload worth
        // parsing; validate an empty-object substitute instead, with the
        // raw text as a fallback for plain-string expectations.
        let no_content = status == 204 || length == Some(0) || (!is_json && length.is_none());
        if no_content {
            return serde_json::from_str::<T>("{}").or_else(|error| {
                from_text(&body).map_err(|_| validation_failure(context, &error))
            });
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => serde_json::from_value::<T>(value).or_else(|error| {
                from_text(&body).map_err(|_| validation_failure(context, &error))
            }),
            Err(parse_error) => {
                from_text(&body).map_err(|_| ApiError::Parse(parse_error.to_string()))
            }
        }
    }
}

/// Validates the raw response text itself, supporting plain-string
/// expected types.
fn from_text<T: DeserializeOwned>(body: &str) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::String(body.to_string()))
}

fn validation_failure(context: Option<&'static str>, error: &serde_json::Error) -> ApiError {
    ApiError::Validation {
        issues: vec![FieldIssue::new(
            context.unwrap_or("response"),
            error.to_string(),
        )],
    }
}

/// Pulls a human-readable detail out of an error body.
///
/// The server shape is a JSON object optionally carrying one of `detail`,
/// `error`, or `message`; the first match wins, and only when it says more
/// than the status label already does.
fn extract_detail(body: &str, label: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .filter(|text| *text != label)
        .map(str::to_string)
}
