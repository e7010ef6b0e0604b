/*!
 * Rate-limited translation client.
 *
 * Wraps a `Provider` with the policies the remote service requires:
 * - an admission gate bounding outstanding requests
 * - linear backoff on throttling answers (429)
 * - hard-stop statuses that raise the run's cancellation signal
 * - soft failures that only drop the current text
 *
 * Every suspension point (admission, network call, backoff) races against
 * the cancellation signal.
 */

use log::{debug, error, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::app_config::Config;
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::deepl::UsageResponse;
use crate::providers::{Provider, TranslateRequest, TranslateResponse};
use super::cancel::{CancelReason, CancelSignal};

/// Requests admitted at once
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 5;

/// Upper bound for widening the admission gate
pub const DEFAULT_BURST_CAPACITY: usize = 10;

/// Retries on throttling before giving up on a text
pub const DEFAULT_RETRY_COUNT: u32 = 5;

/// Base backoff in milliseconds, multiplied by the attempt number
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;

/// Context sent with every text
pub const DEFAULT_CONTEXT: &str =
    "Labels, parameter values and notes from an architectural building model.";

/// Client tuning knobs
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub max_concurrent_requests: usize,
    pub burst_capacity: usize,
    pub retry_count: u32,
    pub retry_backoff: Duration,
    /// Target language, API spelling
    pub target_lang: String,
    /// Source language, `None` for auto-detection
    pub source_lang: Option<String>,
    pub context: Option<String>,
}

impl ClientOptions {
    pub fn new(target_lang: impl Into<String>) -> Self {
        Self {
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            burst_capacity: DEFAULT_BURST_CAPACITY,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            target_lang: target_lang.into(),
            source_lang: None,
            context: Some(DEFAULT_CONTEXT.to_string()),
        }
    }

    /// Build options from the application configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let context = config.api.context.trim();
        Ok(Self {
            max_concurrent_requests: config.dispatch.max_concurrent_requests.max(1),
            burst_capacity: config.dispatch.burst_capacity,
            retry_count: config.dispatch.retry_count,
            retry_backoff: Duration::from_millis(config.dispatch.retry_backoff_ms),
            target_lang: config.api_target_language()?,
            source_lang: config.api_source_language()?,
            context: (!context.is_empty()).then(|| context.to_string()),
        })
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.max_concurrent_requests = size.max(1);
        self.burst_capacity = self.burst_capacity.max(self.max_concurrent_requests);
        self
    }

    pub fn with_retry(mut self, retry_count: u32, backoff: Duration) -> Self {
        self.retry_count = retry_count;
        self.retry_backoff = backoff;
        self
    }
}

/// Bounded-concurrency gate in front of the provider
#[derive(Debug)]
pub struct AdmissionGate {
    semaphore: Semaphore,
    size: AtomicUsize,
    burst: usize,
}

impl AdmissionGate {
    pub fn new(size: usize, burst: usize) -> Self {
        let size = size.max(1);
        Self {
            semaphore: Semaphore::new(size),
            size: AtomicUsize::new(size),
            burst: burst.max(size),
        }
    }

    /// Wait for a slot, giving up as soon as `cancel` is raised
    pub async fn admit(&self, cancel: &CancelSignal) -> Option<SemaphorePermit<'_>> {
        if cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = self.semaphore.acquire() => permit.ok(),
        }
    }

    /// Grow the gate to `size`, clamped to the burst capacity. Returns the new size.
    pub fn widen(&self, size: usize) -> usize {
        let target = size.min(self.burst);
        let previous = self.size.fetch_max(target, Ordering::SeqCst);
        if target > previous {
            self.semaphore.add_permits(target - previous);
            debug!("Admission gate widened from {} to {}", previous, target);
        }
        previous.max(target)
    }

    pub fn size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    pub fn burst_capacity(&self) -> usize {
        self.burst
    }

    /// Free slots right now
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// How the client reacts to a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    /// Retry after a backoff
    Throttled,
    /// Stop the whole run
    HardStop,
    /// Drop this text only
    SoftFailure,
}

pub fn classify_status(status: u16) -> ResponseClass {
    match status {
        200..=299 => ResponseClass::Success,
        429 => ResponseClass::Throttled,
        400 | 403 | 404 | 456 => ResponseClass::HardStop,
        _ => ResponseClass::SoftFailure,
    }
}

/// Message shown to the user when a hard-stop status cancels the run
pub fn hard_stop_message(status: u16) -> String {
    match status {
        403 => "Authorization failed (403). Please check the API key.".to_string(),
        456 => "Quota exceeded (456). The character limit of the account has been reached.".to_string(),
        400 => "Bad request (400). The translation request was rejected.".to_string(),
        404 => "Translation endpoint not found (404). Please check the endpoint URL.".to_string(),
        other => format!("Translation stopped after status {}", other),
    }
}

/// Result of a successful translation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated(String),
    /// The text is already in the target language
    Unchanged,
}

impl TranslationOutcome {
    /// Text to store on the unit
    pub fn resolve(self, original: &str) -> String {
        match self {
            TranslationOutcome::Translated(text) => text,
            TranslationOutcome::Unchanged => original.to_string(),
        }
    }
}

/// Character usage of the account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub character_count: u64,
    pub character_limit: u64,
}

impl Usage {
    pub fn is_exhausted(&self) -> bool {
        self.character_limit > 0 && self.character_count >= self.character_limit
    }

    pub fn remaining(&self) -> u64 {
        self.character_limit.saturating_sub(self.character_count)
    }
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.character_limit == 0 {
            return write!(f, "{} characters used (no limit)", self.character_count);
        }
        let percent = self.character_count as f64 * 100.0 / self.character_limit as f64;
        write!(
            f,
            "{} of {} characters used ({:.1}%)",
            self.character_count, self.character_limit, percent
        )
    }
}

/// Shorten a text for log lines
fn preview(text: &str) -> String {
    const MAX: usize = 40;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    }
}

/// Translation client enforcing admission, retry and hard-stop rules
#[derive(Debug)]
pub struct RateLimitedClient {
    provider: Arc<dyn Provider>,
    gate: AdmissionGate,
    options: ClientOptions,
}

impl RateLimitedClient {
    pub fn new(provider: Arc<dyn Provider>, options: ClientOptions) -> Self {
        let gate = AdmissionGate::new(options.max_concurrent_requests, options.burst_capacity);
        Self { provider, gate, options }
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.options.retry_backoff * attempt
    }

    fn request_for(&self, text: &str) -> TranslateRequest {
        TranslateRequest {
            text: text.to_string(),
            context: self.options.context.clone(),
            target_lang: self.options.target_lang.clone(),
            source_lang: self.options.source_lang.clone(),
        }
    }

    /// Raise the run's cancellation; only the first hard-stop is logged
    fn raise_hard_stop(&self, cancel: &CancelSignal, message: String) {
        if cancel.cancel(CancelReason::HardStop(message.clone())) {
            error!("{}", message);
        }
    }

    /// Translate one text
    ///
    /// Returns `None` on soft failure, exhausted retries, hard-stop or
    /// cancellation. The admission slot is held for the whole retry loop.
    pub async fn translate(&self, text: &str, cancel: &CancelSignal) -> Option<TranslationOutcome> {
        if text.trim().is_empty() {
            debug!("Skipping blank text");
            return None;
        }

        let _permit = self.gate.admit(cancel).await?;
        let request = self.request_for(text);
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return None;
            }

            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                reply = self.provider.translate(&request) => reply,
            };

            let reply = match reply {
                Ok(reply) => reply,
                Err(ProviderError::ConnectionError(message)) => {
                    self.raise_hard_stop(cancel, format!("Translation service unreachable: {}", message));
                    return None;
                }
                Err(e) => {
                    warn!("Translation of '{}' failed: {}", preview(text), e);
                    return None;
                }
            };

            match classify_status(reply.status) {
                ResponseClass::Success => return self.parse_translation(text, &reply.body),
                ResponseClass::Throttled => {
                    attempt += 1;
                    if attempt > self.options.retry_count {
                        warn!(
                            "Giving up on '{}' after {} throttled retries",
                            preview(text),
                            self.options.retry_count
                        );
                        return None;
                    }
                    let delay = self.backoff_delay(attempt);
                    debug!("Throttled, retry {} for '{}' in {:?}", attempt, preview(text), delay);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return None,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                ResponseClass::HardStop => {
                    self.raise_hard_stop(cancel, hard_stop_message(reply.status));
                    return None;
                }
                ResponseClass::SoftFailure => {
                    warn!(
                        "Translation of '{}' failed: {}",
                        preview(text),
                        ProviderError::from_status(reply.status, reply.body)
                    );
                    return None;
                }
            }
        }
    }

    /// Interpret a success body
    fn parse_translation(&self, original: &str, body: &str) -> Option<TranslationOutcome> {
        let response: TranslateResponse = match serde_json::from_str(body) {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to parse translation of '{}': {}", preview(original), e);
                return None;
            }
        };

        let Some(item) = response.translations.into_iter().next() else {
            warn!("Empty translation list for '{}'", preview(original));
            return None;
        };

        if language_utils::language_codes_match(&item.detected_source_language, &self.options.target_lang)
            || item.text == original
        {
            return Some(TranslationOutcome::Unchanged);
        }
        if item.text.trim().is_empty() {
            warn!("Empty translation returned for '{}'", preview(original));
            return None;
        }
        Some(TranslationOutcome::Translated(item.text))
    }

    /// Query the account usage; not subject to the admission gate
    pub async fn check_usage(&self) -> Result<Usage, ProviderError> {
        let reply = self.provider.usage().await?;
        if classify_status(reply.status) != ResponseClass::Success {
            return Err(ProviderError::from_status(reply.status, reply.body));
        }
        let usage: UsageResponse = serde_json::from_str(&reply.body)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(Usage {
            character_count: usage.character_count,
            character_limit: usage.character_limit,
        })
    }
}
