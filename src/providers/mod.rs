/*!
 * Provider implementations for the remote translation service.
 *
 * A provider only moves bytes: it sends one request and hands back the raw
 * status and body. Interpreting statuses (retry, hard-stop, soft failure) is
 * the job of `translation::client`.
 * - `deepl`: DeepL-compatible HTTP API over reqwest
 * - `mock`: scripted provider for tests and benchmarks
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Form fields of one translation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslateRequest {
    /// Text to translate
    pub text: String,

    /// Fixed descriptive context sent with every text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Target language code, API spelling
    pub target_lang: String,

    /// Source language code, omitted for auto-detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_lang: Option<String>,
}

/// Status and body of an HTTP exchange
#[derive(Debug, Clone, PartialEq)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

impl RawReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

/// Body of a successful translation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translations: Vec<TranslationItem>,
}

/// One translated text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationItem {
    #[serde(default)]
    pub detected_source_language: String,
    pub text: String,
}

/// Common trait for translation service providers
///
/// Transport failures are reported as `ProviderError`; any HTTP answer, error
/// statuses included, is an `Ok(RawReply)`.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Send one translation request
    async fn translate(&self, request: &TranslateRequest) -> Result<RawReply, ProviderError>;

    /// Query the account's character usage
    async fn usage(&self) -> Result<RawReply, ProviderError>;
}

pub mod deepl;
pub mod mock;
