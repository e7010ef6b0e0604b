use std::fmt;
use std::time::Duration;
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, header};
use serde::Deserialize;

use crate::errors::ProviderError;
use crate::providers::{Provider, RawReply, TranslateRequest};

/// Endpoint of the free API tier
pub const FREE_API_ENDPOINT: &str = "https://api-free.deepl.com/v2";

/// Endpoint of the paid API tier
pub const PRO_API_ENDPOINT: &str = "https://api.deepl.com/v2";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// DeepL client for interacting with the translation API
pub struct DeepL {
    /// HTTP client for API requests
    client: Client,
    /// Authentication key
    api_key: String,
    /// Base URL, without trailing slash
    endpoint: String,
}

/// Body of the usage endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct UsageResponse {
    /// Characters translated in the current billing period
    pub character_count: u64,
    /// Maximum characters for the period
    pub character_limit: u64,
}

impl DeepL {
    /// Create a new client with the default timeout
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new_with_config(api_key, endpoint, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a new client with an explicit request timeout
    pub fn new_with_config(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let api_key = api_key.into();
        let endpoint = endpoint.into();
        let endpoint = if endpoint.trim().is_empty() {
            Self::default_endpoint(&api_key).to_string()
        } else {
            endpoint.trim_end_matches('/').to_string()
        };

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key,
            endpoint,
        }
    }

    /// Free-tier keys carry the `:fx` suffix
    pub fn default_endpoint(api_key: &str) -> &'static str {
        if api_key.trim().ends_with(":fx") {
            FREE_API_ENDPOINT
        } else {
            PRO_API_ENDPOINT
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.api_key)
    }

    /// Turn an HTTP response into a raw reply, reading the whole body
    async fn into_reply(response: reqwest::Response) -> Result<RawReply, ProviderError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read response body: {}", e)))?;
        Ok(RawReply { status, body })
    }
}

impl fmt::Debug for DeepL {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepL")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"***")
            .finish()
    }
}

/// Map transport failures; unreachable hosts are told apart from slow ones
fn map_send_error(error: reqwest::Error) -> ProviderError {
    if error.is_connect() {
        ProviderError::ConnectionError(error.to_string())
    } else if error.is_timeout() {
        ProviderError::RequestFailed(format!("Request timed out: {}", error))
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

#[async_trait]
impl Provider for DeepL {
    async fn translate(&self, request: &TranslateRequest) -> Result<RawReply, ProviderError> {
        let url = format!("{}/translate", self.endpoint);
        debug!("POST {} ({} chars, target {})", url, request.text.chars().count(), request.target_lang);

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, self.auth_header())
            .form(request)
            .send()
            .await
            .map_err(map_send_error)?;

        Self::into_reply(response).await
    }

    async fn usage(&self) -> Result<RawReply, ProviderError> {
        let url = format!("{}/usage", self.endpoint);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(map_send_error)?;

        Self::into_reply(response).await
    }
}
