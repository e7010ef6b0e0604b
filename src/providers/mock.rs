/*!
 * Mock provider implementation for testing.
 *
 * The mock speaks the same wire format as the real API, so the client's
 * status handling and reply parsing are exercised unchanged:
 * - `MockProvider::working()` - Always succeeds with a recognisable translation
 * - `MockProvider::echo()` - Returns the text unchanged
 * - `MockProvider::status(code)` - Always answers with the given HTTP status
 * - `MockProvider::unreachable()` - Fails before reaching the server
 *
 * Scripted statuses, per-text statuses, latency and jitter can be layered on
 * top of any behavior. `MockStats` records call counts and peak concurrency.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{Provider, RawReply, TranslateRequest};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Succeeds, returning the input text as is
    Echo,
    /// Succeeds, reporting the target language as the detected source
    AlreadyTarget,
    /// Succeeds with an empty translations list
    Empty,
    /// Always answers with this HTTP status
    Status(u16),
    /// The endpoint cannot be reached
    Unreachable,
    /// Every request times out
    Timeout,
}

/// Call counters shared by all clones of one mock
#[derive(Debug, Default)]
pub struct MockStats {
    calls: AtomicUsize,
    usage_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl MockStats {
    /// Number of translate requests received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of usage requests received
    pub fn usage_calls(&self) -> usize {
        self.usage_calls.load(Ordering::SeqCst)
    }

    /// Translate requests currently inside the mock
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of translate requests seen at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Texts received, in arrival order
    pub fn requested_texts(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

/// Decrements the in-flight counter when a request leaves the mock
struct InFlightGuard<'a>(&'a MockStats);

impl<'a> InFlightGuard<'a> {
    fn enter(stats: &'a MockStats) -> Self {
        let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(stats)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Statuses returned, in order, before the behavior applies
    scripted: Arc<Mutex<VecDeque<u16>>>,
    /// Statuses returned every time a given text is requested
    text_statuses: Arc<Mutex<HashMap<String, u16>>>,
    /// Custom translation generator (optional)
    custom_response: Option<fn(&str) -> String>,
    /// Fixed latency added to each request
    delay: Duration,
    /// Extra random latency range in milliseconds
    jitter_ms: Option<(u64, u64)>,
    /// Characters billed so far, grows with every successful translation
    character_count: Arc<AtomicU64>,
    character_limit: Arc<AtomicU64>,
    /// Status returned by the usage endpoint instead of a body
    usage_status: Option<u16>,
    stats: Arc<MockStats>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            text_statuses: Arc::new(Mutex::new(HashMap::new())),
            custom_response: None,
            delay: Duration::ZERO,
            jitter_ms: None,
            character_count: Arc::new(AtomicU64::new(0)),
            character_limit: Arc::new(AtomicU64::new(500_000)),
            usage_status: None,
            stats: Arc::new(MockStats::default()),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock returning every text unchanged
    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// Create a mock that always answers with `code`
    pub fn status(code: u16) -> Self {
        Self::new(MockBehavior::Status(code))
    }

    /// Create a mock whose endpoint cannot be reached
    pub fn unreachable() -> Self {
        Self::new(MockBehavior::Unreachable)
    }

    /// Answer the next requests with these statuses, then fall back to the behavior
    pub fn with_script(self, statuses: &[u16]) -> Self {
        self.scripted.lock().extend(statuses.iter().copied());
        self
    }

    /// Always answer requests for `text` with `code`
    pub fn with_text_status(self, text: impl Into<String>, code: u16) -> Self {
        self.text_statuses.lock().insert(text.into(), code);
        self
    }

    /// Set a custom translation generator
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Add a random latency between `min_ms` and `max_ms` to each request
    pub fn with_jitter(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.jitter_ms = Some((min_ms, max_ms.max(min_ms)));
        self
    }

    /// Set the usage counters reported by the usage endpoint
    pub fn with_usage(self, count: u64, limit: u64) -> Self {
        self.character_count.store(count, Ordering::SeqCst);
        self.character_limit.store(limit, Ordering::SeqCst);
        self
    }

    /// Make the usage endpoint answer with `code`
    pub fn with_usage_status(mut self, code: u16) -> Self {
        self.usage_status = Some(code);
        self
    }

    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }

    /// Translation produced by the `Working` behavior
    pub fn default_translation(text: &str, target_lang: &str) -> String {
        format!("{} ({})", text, target_lang)
    }

    fn next_status(&self, text: &str) -> Option<u16> {
        if let Some(code) = self.scripted.lock().pop_front() {
            return Some(code);
        }
        if let Some(code) = self.text_statuses.lock().get(text) {
            return Some(*code);
        }
        match self.behavior {
            MockBehavior::Status(code) => Some(code),
            _ => None,
        }
    }

    fn latency(&self) -> Duration {
        let jitter = match self.jitter_ms {
            // Thread-local rng, never held across an await
            Some((min, max)) => Duration::from_millis(rand::rng().random_range(min..=max)),
            None => Duration::ZERO,
        };
        self.delay + jitter
    }

    fn success_body(&self, request: &TranslateRequest) -> String {
        let (detected, text) = match self.behavior {
            MockBehavior::Echo => ("EN".to_string(), request.text.clone()),
            MockBehavior::AlreadyTarget => (request.target_lang.clone(), request.text.clone()),
            MockBehavior::Empty => return json!({ "translations": [] }).to_string(),
            _ => {
                let text = match self.custom_response {
                    Some(generator) => generator(&request.text),
                    None => Self::default_translation(&request.text, &request.target_lang),
                };
                ("EN".to_string(), text)
            }
        };
        json!({
            "translations": [{ "detected_source_language": detected, "text": text }]
        })
        .to_string()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn translate(&self, request: &TranslateRequest) -> Result<RawReply, ProviderError> {
        self.stats.calls.fetch_add(1, Ordering::SeqCst);
        self.stats.requested.lock().push(request.text.clone());
        let _guard = InFlightGuard::enter(&self.stats);

        let latency = self.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match self.behavior {
            MockBehavior::Unreachable => {
                return Err(ProviderError::ConnectionError("Simulated unreachable endpoint".to_string()));
            }
            MockBehavior::Timeout => {
                return Err(ProviderError::RequestFailed("Simulated request timeout".to_string()));
            }
            _ => {}
        }

        if let Some(code) = self.next_status(&request.text) {
            if !(200..300).contains(&code) {
                return Ok(RawReply::new(code, format!("{{\"message\":\"Simulated status {}\"}}", code)));
            }
        }

        self.character_count
            .fetch_add(request.text.chars().count() as u64, Ordering::SeqCst);
        Ok(RawReply::new(200, self.success_body(request)))
    }

    async fn usage(&self) -> Result<RawReply, ProviderError> {
        self.stats.usage_calls.fetch_add(1, Ordering::SeqCst);

        if self.behavior == MockBehavior::Unreachable {
            return Err(ProviderError::ConnectionError("Simulated unreachable endpoint".to_string()));
        }
        if let Some(code) = self.usage_status {
            return Ok(RawReply::new(code, "{\"message\":\"Simulated usage failure\"}"));
        }

        let body = json!({
            "character_count": self.character_count.load(Ordering::SeqCst),
            "character_limit": self.character_limit.load(Ordering::SeqCst),
        });
        Ok(RawReply::new(200, body.to_string()))
    }
}
