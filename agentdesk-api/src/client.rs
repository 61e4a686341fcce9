//! Shared HTTP plumbing for the API clients
//!
//! Builds the `reqwest` client, resolves endpoint paths against the configured
//! base URL and classifies non-success responses into `DeskError`s.

use crate::credentials::CredentialJar;
use agentdesk_core::{ApiSettings, DeskError, DeskResult, ErrorContext};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Configuration for API clients
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the API, e.g. `http://localhost:5000/api`
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Additional headers
    pub headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        ApiSettings::default().into()
    }
}

impl From<ApiSettings> for ApiClientConfig {
    fn from(settings: ApiSettings) -> Self {
        Self {
            base_url: settings.base_url,
            timeout_seconds: settings.timeout_seconds,
            user_agent: settings.user_agent,
            headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set additional header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Join an endpoint path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Helper function to create HTTP client with common configuration
pub(crate) fn create_http_client(
    config: &ApiClientConfig,
    credentials: &CredentialJar,
) -> DeskResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            DeskError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );

    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            DeskError::Config {
                message: format!("Invalid header name '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?;

        let header_value =
            reqwest::header::HeaderValue::from_str(value).map_err(|e| DeskError::Config {
                message: format!("Invalid header value for '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })?;

        headers.insert(header_name, header_value);
    }

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .cookie_provider(credentials.jar())
        .build()
        .map_err(|e| DeskError::Config {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })
}

/// Error body shape used by the server: `{ "message": "..." }`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Turn a non-success response into a classified error.
///
/// 4xx answers are the server rejecting the request and become
/// `Authentication` errors carrying the server's `message`; 5xx answers are
/// treated like a transport failure.
pub(crate) async fn classify_response_error(
    response: reqwest::Response,
    operation: &str,
) -> DeskError {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();

    let server_message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());

    debug!(
        operation = operation,
        status = status.as_u16(),
        url = %url,
        "Request rejected by server"
    );

    let fallback = status.canonical_reason().unwrap_or("Unknown error").to_string();

    if status.is_client_error() {
        DeskError::Authentication {
            message: server_message.unwrap_or(fallback),
            status: Some(status.as_u16()),
            context: ErrorContext::new("api_client")
                .with_operation(operation)
                .with_metadata("url", url.as_str())
                .with_suggestion(match status.as_u16() {
                    401 => "Check your email and password",
                    409 => "An account with this email may already exist",
                    _ => "Check the submitted values",
                }),
        }
    } else {
        DeskError::Network {
            message: format!(
                "HTTP {} from {}: {}",
                status.as_u16(),
                url,
                server_message.unwrap_or(fallback)
            ),
            status: Some(status.as_u16()),
            source: None,
            context: ErrorContext::new("api_client")
                .with_operation(operation)
                .with_suggestion("Check network connectivity and API status"),
        }
    }
}

pub(crate) fn transport_error(error: reqwest::Error, operation: &str) -> DeskError {
    DeskError::Network {
        message: format!("Request failed: {}", error),
        status: error.status().map(|s| s.as_u16()),
        source: Some(Box::new(error)),
        context: ErrorContext::new("api_client")
            .with_operation(operation)
            .with_suggestion("Check that the API server is reachable"),
    }
}

/// Shared HTTP transport: one cookie-carrying client per process
#[derive(Debug, Clone)]
pub struct ApiTransport {
    client: reqwest::Client,
    config: ApiClientConfig,
    credentials: CredentialJar,
}

impl ApiTransport {
    pub fn new(config: ApiClientConfig, credentials: CredentialJar) -> DeskResult<Self> {
        let client = create_http_client(&config, &credentials)?;
        debug!("Created API transport for {}", config.base_url);
        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialJar {
        &self.credentials
    }

    /// Send a request and return the response when the status is 2xx
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> DeskResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, operation))?;

        self.credentials.record_response(&response);

        if !response.status().is_success() {
            return Err(classify_response_error(response, operation).await);
        }

        Ok(response)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        operation: &str,
    ) -> DeskResult<T> {
        let url = self.config.endpoint(path);
        debug!(operation = operation, "GET {}", url);
        let response = self.send(self.client.get(&url), operation).await?;
        decode_json(response, operation).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B, operation: &str) -> DeskResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        debug!(operation = operation, "POST {}", url);
        let response = self.send(self.client.post(&url).json(body), operation).await?;
        decode_json(response, operation).await
    }

    pub(crate) async fn post_empty(&self, path: &str, operation: &str) -> DeskResult<()> {
        let url = self.config.endpoint(path);
        debug!(operation = operation, "POST {}", url);
        self.send(self.client.post(&url), operation).await?;
        Ok(())
    }
}

async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> DeskResult<T> {
    response.json::<T>().await.map_err(|e| DeskError::Network {
        message: format!("Failed to parse response: {}", e),
        status: None,
        source: Some(Box::new(e)),
        context: ErrorContext::new("api_client")
            .with_operation(operation)
            .with_suggestion("The server answered with an unexpected body"),
    })
}
