/*!
 * Tests for the rate-limited translation client
 */

use std::sync::Arc;
use std::time::Duration;

use bimtrans::providers::mock::{MockBehavior, MockProvider};
use bimtrans::translation::client::{ClientOptions, RateLimitedClient, TranslationOutcome};
use bimtrans::translation::{CancelReason, CancelSignal};

use crate::common::{client_for, fast_options};

#[tokio::test]
async fn test_translate_withSuccess_shouldReturnTranslation() {
    let provider = MockProvider::working();
    let client = client_for(&provider, 5);
    let cancel = CancelSignal::new();

    let outcome = client.translate("Exterior wall", &cancel).await;

    assert_eq!(outcome, Some(TranslationOutcome::Translated("Exterior wall (FR)".to_string())));
    assert!(!cancel.is_cancelled());
}

#[tokio::test]
async fn test_translate_withEchoedText_shouldReturnUnchanged() {
    let provider = MockProvider::echo();
    let client = client_for(&provider, 5);

    let outcome = client.translate("Kitchen", &CancelSignal::new()).await;
    assert_eq!(outcome, Some(TranslationOutcome::Unchanged));
}

#[tokio::test]
async fn test_translate_withTargetDetected_shouldReturnUnchanged() {
    let provider = MockProvider::new(MockBehavior::AlreadyTarget);
    let client = client_for(&provider, 5);

    let outcome = client.translate("Cuisine", &CancelSignal::new()).await;
    assert_eq!(outcome, Some(TranslationOutcome::Unchanged));
}

#[tokio::test]
async fn test_translate_withEmptyTranslationList_shouldSoftFail() {
    let provider = MockProvider::new(MockBehavior::Empty);
    let client = client_for(&provider, 5);
    let cancel = CancelSignal::new();

    assert_eq!(client.translate("Kitchen", &cancel).await, None);
    assert!(!cancel.is_cancelled());
}

#[tokio::test]
async fn test_translate_withBlankText_shouldNotCallProvider() {
    let provider = MockProvider::working();
    let client = client_for(&provider, 5);

    assert_eq!(client.translate("   ", &CancelSignal::new()).await, None);
    assert_eq!(provider.stats().calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_translate_withThrottling_shouldRetryWithLinearBackoff() {
    let provider = MockProvider::working().with_script(&[429, 429, 429]);
    let options = ClientOptions::new("FR").with_retry(5, Duration::from_millis(100));
    let client = RateLimitedClient::new(Arc::new(provider.clone()), options);

    let started = tokio::time::Instant::now();
    let outcome = client.translate("Level 1", &CancelSignal::new()).await;
    let elapsed = started.elapsed();

    assert!(matches!(outcome, Some(TranslationOutcome::Translated(_))));
    assert_eq!(provider.stats().calls(), 4);
    // 100 + 200 + 300 ms
    assert!(elapsed >= Duration::from_millis(600), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(700), "elapsed {:?}", elapsed);
}

#[test]
fn test_backoffDelay_shouldStrictlyIncrease() {
    let client = RateLimitedClient::new(Arc::new(MockProvider::working()), ClientOptions::new("FR"));
    let delays: Vec<Duration> = (1..=5).map(|attempt| client.backoff_delay(attempt)).collect();

    assert_eq!(delays[0], Duration::from_millis(1000));
    assert!(delays.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test(start_paused = true)]
async fn test_translate_withPersistentThrottling_shouldGiveUpAfterCeiling() {
    let provider = MockProvider::status(429);
    let client = client_for(&provider, 5);
    let cancel = CancelSignal::new();

    let outcome = client.translate("Level 1", &cancel).await;

    assert_eq!(outcome, None);
    // First attempt plus five retries
    assert_eq!(provider.stats().calls(), 6);
    assert!(!cancel.is_cancelled());
}

#[tokio::test]
async fn test_translate_withHardStopStatus_shouldCancel() {
    for code in [400, 403, 404, 456] {
        let provider = MockProvider::status(code);
        let client = client_for(&provider, 5);
        let cancel = CancelSignal::new();

        assert_eq!(client.translate("Door", &cancel).await, None);
        assert!(cancel.is_cancelled(), "status {}", code);
        match cancel.reason() {
            Some(CancelReason::HardStop(message)) => assert!(message.contains(&code.to_string())),
            other => panic!("unexpected reason {:?}", other),
        }
        assert_eq!(provider.stats().calls(), 1);
    }
}

#[tokio::test]
async fn test_translate_withSoftFailureStatus_shouldNotCancelOrRetry() {
    for code in [413, 414, 500, 503] {
        let provider = MockProvider::status(code);
        let client = client_for(&provider, 5);
        let cancel = CancelSignal::new();

        assert_eq!(client.translate("Door", &cancel).await, None);
        assert!(!cancel.is_cancelled(), "status {}", code);
        assert_eq!(provider.stats().calls(), 1);
    }
}

#[tokio::test]
async fn test_translate_withUnreachableEndpoint_shouldCancel() {
    let provider = MockProvider::unreachable();
    let client = client_for(&provider, 5);
    let cancel = CancelSignal::new();

    assert_eq!(client.translate("Door", &cancel).await, None);
    assert!(matches!(cancel.reason(), Some(CancelReason::HardStop(_))));
}

#[tokio::test]
async fn test_translate_withTimeout_shouldSoftFail() {
    let provider = MockProvider::new(MockBehavior::Timeout);
    let client = client_for(&provider, 5);
    let cancel = CancelSignal::new();

    assert_eq!(client.translate("Door", &cancel).await, None);
    assert!(!cancel.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn test_translate_withCancelDuringBackoff_shouldReturnImmediately() {
    let provider = MockProvider::status(429);
    let options = ClientOptions::new("FR").with_retry(5, Duration::from_secs(60));
    let client = Arc::new(RateLimitedClient::new(Arc::new(provider.clone()), options));
    let cancel = CancelSignal::new();

    let task = {
        let client = Arc::clone(&client);
        let cancel = cancel.clone();
        tokio::spawn(async move { client.translate("Door", &cancel).await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel(CancelReason::User);

    let started = tokio::time::Instant::now();
    assert_eq!(task.await.unwrap(), None);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(provider.stats().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_translate_withManyCallers_shouldRespectPoolSize() {
    let provider = MockProvider::working().with_delay(Duration::from_millis(20));
    let client = client_for(&provider, 3);
    let cancel = CancelSignal::new();

    let mut handles = Vec::new();
    for i in 0..12 {
        let client = Arc::clone(&client);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move { client.translate(&format!("Room {}", i), &cancel).await }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_some());
    }

    assert_eq!(provider.stats().calls(), 12);
    assert_eq!(provider.stats().max_in_flight(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_gateWiden_shouldAdmitMoreCallers() {
    let provider = MockProvider::working().with_delay(Duration::from_millis(20));
    let client = client_for(&provider, 2);
    assert_eq!(client.gate().widen(50), fast_options(2).burst_capacity);

    let cancel = CancelSignal::new();
    let mut handles = Vec::new();
    for i in 0..20 {
        let client = Arc::clone(&client);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move { client.translate(&format!("Room {}", i), &cancel).await }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(provider.stats().max_in_flight() > 2);
    assert!(provider.stats().max_in_flight() <= client.gate().burst_capacity());
}

#[tokio::test]
async fn test_checkUsage_shouldParseCounters() {
    let provider = MockProvider::working().with_usage(1200, 500_000);
    let client = client_for(&provider, 5);

    let usage = client.check_usage().await.unwrap();
    assert_eq!(usage.character_count, 1200);
    assert_eq!(usage.character_limit, 500_000);
    assert!(!usage.is_exhausted());
}

#[tokio::test]
async fn test_checkUsage_withErrorStatus_shouldFailWithoutCancelling() {
    let provider = MockProvider::working().with_usage_status(403);
    let client = client_for(&provider, 5);

    assert!(client.check_usage().await.is_err());

    // Translation still works afterwards
    let cancel = CancelSignal::new();
    assert!(client.translate("Door", &cancel).await.is_some());
}
