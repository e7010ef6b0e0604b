/*!
 * End-to-end tests of the translation pipeline against the JSON host
 */

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use bimtrans::host::{ExtractionCollector, JsonModel};
use bimtrans::providers::mock::MockProvider;
use bimtrans::translation::{
    CancelReason, ModelUpdater, NoopObserver, PipelineConfig, PipelineRun, TranslationGroup, TranslationPipeline,
};

use crate::common::models::{names_model, tower};
use crate::common::observers::RecordingObserver;
use crate::common::{client_for, init_test_logging, numbered_texts};

fn pipeline(provider: &MockProvider, pool_size: usize, config: PipelineConfig) -> TranslationPipeline {
    TranslationPipeline::new(client_for(provider, pool_size), ModelUpdater::new(), config)
}

fn collect(model: &JsonModel) -> Vec<TranslationGroup> {
    ExtractionCollector::new().collect(model).unwrap()
}

fn numbered_model(prefix: &str, count: usize) -> JsonModel {
    let texts = numbered_texts(prefix, count);
    let names: Vec<&str> = texts.iter().map(|t| t.as_str()).collect();
    names_model(&names)
}

fn translated_names(model: &JsonModel) -> usize {
    model
        .project()
        .content()
        .elements
        .iter()
        .filter(|e| e.name.ends_with("(FR)"))
        .count()
}

#[tokio::test]
async fn test_run_withWorkingProvider_shouldTranslateWholeModel() {
    init_test_logging();
    let provider = MockProvider::working();
    let pipeline = pipeline(&provider, 5, PipelineConfig::offline());
    let mut model = tower();
    let mut groups = collect(&model);
    let total: usize = groups.iter().map(|g| g.len()).sum();
    let run = PipelineRun::new();
    let observer = RecordingObserver::accepting();

    let result = pipeline.run(&mut model, &mut groups, &run, &observer).await;

    assert!(!result.was_cancelled());
    assert_eq!(result.run_id, run.id);
    assert_eq!(result.dispatch.translated, total);
    assert_eq!(result.progress.units_completed, total);
    assert_eq!(provider.stats().calls(), total);
    assert_eq!(provider.stats().usage_calls(), 0);

    let apply = result.apply.as_ref().expect("results should be applied");
    assert_eq!(apply.groups_committed, 2);
    assert_eq!(apply.units_written, total);
    assert_eq!(apply.families_reloaded, 1);

    assert_eq!(observer.extracted.load(Ordering::SeqCst), total);
    assert_eq!(observer.completed.load(Ordering::SeqCst), total);
    assert_eq!(*observer.finished.lock(), Some((false, None)));
    assert_eq!(observer.questions_asked(), 0);

    let project = model.project().content();
    assert_eq!(project.element("2").unwrap().name, "Level 1 (FR)");
    assert_eq!(project.schedule("s1").unwrap().cells[1][0], "Bedroom (FR)");
    assert_eq!(
        model.loaded_family("Door").unwrap().element("d1").unwrap().name,
        "Single door (FR)"
    );
    assert!(result.summary().contains(&format!("{} of {} units", total, total)));
}

#[tokio::test]
async fn test_run_withPreflightCheck_shouldReportUsage() {
    let provider = MockProvider::working().with_usage(1000, 500_000);
    let pipeline = pipeline(&provider, 5, PipelineConfig::default());
    let mut model = names_model(&["Wall", "Roof"]);
    let mut groups = collect(&model);
    let run = PipelineRun::new();

    let result = pipeline.run(&mut model, &mut groups, &run, &NoopObserver).await;

    let usage = result.usage_before.expect("usage should be known");
    assert_eq!(usage.character_count, 1000);
    assert!(!result.was_cancelled());
    assert_eq!(provider.stats().usage_calls(), 1);
}

#[tokio::test]
async fn test_run_withExhaustedQuota_shouldNotTranslate() {
    let provider = MockProvider::working().with_usage(100, 100);
    let pipeline = pipeline(&provider, 5, PipelineConfig::default());
    let mut model = tower();
    let before = model.to_json().unwrap();
    let mut groups = collect(&model);
    let run = PipelineRun::new();
    let observer = RecordingObserver::accepting();

    let result = pipeline.run(&mut model, &mut groups, &run, &observer).await;

    assert_eq!(result.cancel_reason, Some(CancelReason::QuotaReached { used: 100, limit: 100 }));
    assert_eq!(provider.stats().calls(), 0);
    assert_eq!(result.dispatch.translated, 0);
    assert_eq!(result.dispatch.skipped, result.dispatch.total);
    assert!(result.apply.is_none());
    assert_eq!(observer.questions_asked(), 0);
    assert_eq!(model.to_json().unwrap(), before);
}

#[tokio::test]
async fn test_run_withFailingUsageEndpoint_shouldStillTranslate() {
    let provider = MockProvider::working().with_usage_status(500);
    let pipeline = pipeline(&provider, 5, PipelineConfig::default());
    let mut model = names_model(&["Wall", "Roof"]);
    let mut groups = collect(&model);

    let result = pipeline.run(&mut model, &mut groups, &PipelineRun::new(), &NoopObserver).await;

    assert!(result.usage_before.is_none());
    assert_eq!(result.dispatch.translated, 2);
    assert_eq!(translated_names(&model), 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_whenQuotaRunsOut_shouldStopAndApplyPartialResults() {
    init_test_logging();
    // Every text is 10 or 11 characters long; the quota allows about three
    let provider = MockProvider::working()
        .with_delay(Duration::from_millis(100))
        .with_usage(0, 30);
    let config = PipelineConfig {
        preflight_usage_check: true,
        usage_poll_interval: Some(Duration::from_millis(250)),
    };
    let pipeline = pipeline(&provider, 1, config);
    let mut model = numbered_model("Corridor", 20);
    let mut groups = collect(&model);
    let run = PipelineRun::new();
    let observer = RecordingObserver::accepting();

    let result = pipeline.run(&mut model, &mut groups, &run, &observer).await;

    assert!(matches!(result.cancel_reason, Some(CancelReason::QuotaReached { limit: 30, .. })));
    assert!(result.dispatch.translated >= 3, "translated {}", result.dispatch.translated);
    assert!(result.dispatch.translated < 20);
    assert!(provider.stats().calls() < 20);
    assert_eq!(observer.questions_asked(), 1);

    let apply = result.apply.expect("partial results should be applied");
    assert_eq!(apply.units_written, result.dispatch.translated);
    assert_eq!(translated_names(&model), result.dispatch.translated);
}

#[tokio::test]
async fn test_run_withHardStopAndDeclinedApply_shouldLeaveModelUnchanged() {
    let provider = MockProvider::working().with_script(&[200, 200, 403]);
    let pipeline = pipeline(&provider, 1, PipelineConfig::offline());
    let mut model = numbered_model("Wall", 10);
    let before = model.to_json().unwrap();
    let mut groups = collect(&model);
    let run = PipelineRun::new();
    let observer = RecordingObserver::declining();

    let result = pipeline.run(&mut model, &mut groups, &run, &observer).await;

    assert!(matches!(result.cancel_reason, Some(CancelReason::HardStop(_))));
    assert_eq!(result.dispatch.translated, 2);
    assert_eq!(observer.questions_asked(), 1);
    assert!(result.discarded);
    assert!(result.apply.is_none());
    assert_eq!(model.to_json().unwrap(), before);
    assert!(result.summary().contains("discarded"));
}

#[tokio::test]
async fn test_run_withHardStopAndAcceptedApply_shouldWriteCompletedUnits() {
    let provider = MockProvider::working().with_script(&[200, 200, 403]);
    let pipeline = pipeline(&provider, 1, PipelineConfig::offline());
    let mut model = numbered_model("Wall", 10);
    let mut groups = collect(&model);
    let run = PipelineRun::new();
    let observer = RecordingObserver::accepting();

    let result = pipeline.run(&mut model, &mut groups, &run, &observer).await;

    assert!(!result.discarded);
    assert_eq!(result.apply.as_ref().unwrap().units_written, 2);
    assert_eq!(translated_names(&model), 2);
    assert_eq!(provider.stats().calls(), 3);
    let finished = observer.finished.lock().clone();
    assert!(matches!(finished, Some((true, Some(CancelReason::HardStop(_))))));
}

#[tokio::test]
async fn test_run_withAbortedWriteBack_shouldSkipAllGroups() {
    let provider = MockProvider::working();
    let pipeline = pipeline(&provider, 5, PipelineConfig::offline());
    let mut model = tower();
    let before = model.to_json().unwrap();
    let mut groups = collect(&model);
    let run = PipelineRun::new();
    run.apply_abort.cancel(CancelReason::User);

    let result = pipeline.run(&mut model, &mut groups, &run, &NoopObserver).await;

    let apply = result.apply.expect("apply phase should run");
    assert_eq!(apply.groups_skipped, 2);
    assert_eq!(model.to_json().unwrap(), before);
}

#[tokio::test(start_paused = true)]
async fn test_run_withUserCancel_shouldOfferPartialApply() {
    let provider = MockProvider::working().with_delay(Duration::from_millis(50));
    let pipeline = pipeline(&provider, 2, PipelineConfig::offline());
    let mut model = numbered_model("Slab", 12);
    let mut groups = collect(&model);
    let run = Arc::new(PipelineRun::new());
    let observer = RecordingObserver::accepting();

    let canceller = {
        let run = Arc::clone(&run);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            run.cancel.cancel(CancelReason::User);
        })
    };

    let result = pipeline.run(&mut model, &mut groups, &run, &observer).await;
    canceller.await.unwrap();

    assert_eq!(result.cancel_reason, Some(CancelReason::User));
    assert_eq!(result.dispatch.translated, 4);
    assert_eq!(observer.questions_asked(), 1);
    assert_eq!(translated_names(&model), 4);
}
