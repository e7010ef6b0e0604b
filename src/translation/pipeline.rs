/*!
 * Pipeline orchestrator for a model translation run.
 *
 * The orchestrator chains the phases of one run:
 * 1. Usage check: refuse to start when the monthly quota is used up
 * 2. Translation: dispatch every unit, with a usage watcher alongside
 * 3. Decision: after a cancellation, ask whether partial results are kept
 * 4. Write-back: apply the groups transactionally
 */

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::app_config::DispatchConfig;
use crate::host::HostModel;
use super::cancel::CancelReason;
use super::client::{RateLimitedClient, Usage};
use super::dispatcher::{DispatchSummary, Dispatcher};
use super::model::TranslationGroup;
use super::observer::PipelineObserver;
use super::progress::{PipelineRun, ProgressSnapshot};
use super::updater::{ApplySummary, ModelUpdater};

/// Configuration for the translation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Query usage once before dispatching
    pub preflight_usage_check: bool,

    /// Poll usage at this interval while dispatching
    pub usage_poll_interval: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preflight_usage_check: true,
            usage_poll_interval: Some(Duration::from_secs(30)),
        }
    }
}

impl PipelineConfig {
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            preflight_usage_check: config.check_usage_before_run,
            usage_poll_interval: (config.usage_poll_secs > 0).then(|| Duration::from_secs(config.usage_poll_secs)),
        }
    }

    /// No usage queries at all
    pub fn offline() -> Self {
        Self {
            preflight_usage_check: false,
            usage_poll_interval: None,
        }
    }

    pub fn with_usage_poll(mut self, interval: Duration) -> Self {
        self.usage_poll_interval = Some(interval);
        self
    }
}

/// Result of the complete pipeline execution.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub run_id: uuid::Uuid,

    pub dispatch: DispatchSummary,

    /// Write-back summary, `None` when nothing was applied
    pub apply: Option<ApplySummary>,

    /// Counters at the end of the translation phase
    pub progress: ProgressSnapshot,

    /// Total duration of pipeline execution
    pub duration: Duration,

    /// Account usage before the run, when known
    pub usage_before: Option<Usage>,

    pub cancel_reason: Option<CancelReason>,

    /// Partial results were declined after a cancellation
    pub discarded: bool,
}

impl PipelineResult {
    pub fn was_cancelled(&self) -> bool {
        self.cancel_reason.is_some()
    }

    /// Get a summary of the pipeline result.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        parts.push(format!("Duration: {:.2}s", self.duration.as_secs_f32()));
        parts.push(format!(
            "Translation: {} of {} units, {} characters",
            self.dispatch.translated, self.dispatch.total, self.progress.characters_translated
        ));

        if let Some(ref apply) = self.apply {
            parts.push(format!(
                "Write-back: {} units in {} documents",
                apply.units_written, apply.groups_committed
            ));
            if apply.units_rejected > 0 {
                parts.push(format!("Rejected: {}", apply.units_rejected));
            }
            if apply.groups_rolled_back > 0 {
                parts.push(format!("Rolled back: {} documents", apply.groups_rolled_back));
            }
        } else if self.discarded {
            parts.push("Write-back: discarded".to_string());
        }

        if let Some(ref reason) = self.cancel_reason {
            parts.push(format!("Cancelled: {}", reason));
        }

        parts.join(" | ")
    }
}

/// The main translation pipeline orchestrator.
#[derive(Debug)]
pub struct TranslationPipeline {
    client: Arc<RateLimitedClient>,
    dispatcher: Dispatcher,
    updater: ModelUpdater,
    config: PipelineConfig,
}

impl TranslationPipeline {
    pub fn new(client: Arc<RateLimitedClient>, updater: ModelUpdater, config: PipelineConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&client)),
            client,
            updater,
            config,
        }
    }

    pub fn client(&self) -> &Arc<RateLimitedClient> {
        &self.client
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Translate `groups` and write them back into `model`
    pub async fn run(
        &self,
        model: &mut dyn HostModel,
        groups: &mut [TranslationGroup],
        run: &PipelineRun,
        observer: &dyn PipelineObserver,
    ) -> PipelineResult {
        let total: usize = groups.iter().map(|g| g.len()).sum();
        info!("[{}] Starting translation of {} units in {} documents", run.id, total, groups.len());
        observer.on_extraction_finished(total);

        let usage_before = if self.config.preflight_usage_check {
            self.preflight_usage(run).await
        } else {
            None
        };

        // Translation phase, with the usage watcher running alongside
        let done = CancellationToken::new();
        let dispatch = async {
            let units = groups.iter_mut().flat_map(|g| g.units.iter_mut());
            let summary = self.dispatcher.dispatch(units, run, observer).await;
            done.cancel();
            summary
        };
        let (dispatch, ()) = tokio::join!(dispatch, self.watch_usage(run, done.clone()));

        let progress = run.progress.snapshot();
        let cancel_reason = run.cancel.reason().cloned();
        observer.on_translation_finished(cancel_reason.is_some(), cancel_reason.as_ref());

        let mut result = PipelineResult {
            run_id: run.id,
            dispatch,
            apply: None,
            progress,
            duration: Duration::ZERO,
            usage_before,
            cancel_reason,
            discarded: false,
        };

        if let Some(reason) = result.cancel_reason.clone() {
            if result.dispatch.translated == 0 {
                info!("Nothing was translated before the run stopped: {}", reason);
                result.duration = run.elapsed();
                return result;
            }
            if !observer.confirm_partial_apply(&reason) {
                info!("Partial translations discarded");
                result.discarded = true;
                result.duration = run.elapsed();
                return result;
            }
        }

        let apply = self.updater.apply(model, groups, &run.apply_abort, observer);
        result.apply = Some(apply);
        result.duration = run.elapsed();
        info!("[{}] {}", run.id, result.summary());
        result
    }

    /// Check usage once; an exhausted quota cancels the run before any request
    async fn preflight_usage(&self, run: &PipelineRun) -> Option<Usage> {
        match self.client.check_usage().await {
            Ok(usage) => {
                info!("Account usage: {}", usage);
                if usage.is_exhausted() {
                    run.cancel.cancel(CancelReason::QuotaReached {
                        used: usage.character_count,
                        limit: usage.character_limit,
                    });
                    warn!("Monthly character limit reached, nothing will be translated");
                }
                Some(usage)
            }
            Err(e) => {
                warn!("Could not determine account usage: {}", e);
                None
            }
        }
    }

    /// Poll usage until `done` or the run is cancelled
    async fn watch_usage(&self, run: &PipelineRun, done: CancellationToken) {
        let Some(interval) = self.config.usage_poll_interval else {
            return;
        };

        loop {
            tokio::select! {
                _ = done.cancelled() => return,
                _ = run.cancel.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }

            match self.client.check_usage().await {
                Ok(usage) if usage.is_exhausted() => {
                    let reason = CancelReason::QuotaReached {
                        used: usage.character_count,
                        limit: usage.character_limit,
                    };
                    if run.cancel.cancel(reason.clone()) {
                        warn!("{}", reason);
                    }
                    return;
                }
                Ok(usage) => debug!("Usage during run: {}", usage),
                Err(e) => debug!("Usage poll failed: {}", e),
            }
        }
    }
}
