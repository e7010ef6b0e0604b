/*!
 * Concurrent translation dispatcher.
 *
 * Fans a batch of units out to the rate-limited client and writes each
 * result back into its unit. Concurrency is bounded by the client's
 * admission gate only; the dispatcher launches one future per unit and
 * drains all of them before returning.
 */

use futures::stream::{self, StreamExt};
use log::{debug, info};
use std::sync::Arc;

use super::cancel::CancelReason;
use super::client::RateLimitedClient;
use super::model::TranslationUnit;
use super::observer::PipelineObserver;
use super::progress::PipelineRun;

/// Counters of one dispatch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchSummary {
    pub total: usize,
    pub translated: usize,
    pub failed: usize,
    /// Units left without a result because the run was cancelled
    pub skipped: usize,
    pub cancel_reason: Option<CancelReason>,
}

impl DispatchSummary {
    pub fn was_cancelled(&self) -> bool {
        self.cancel_reason.is_some()
    }
}

/// Per-unit result
enum UnitResult {
    Translated,
    Failed,
    Skipped,
}

/// Dispatcher driving the client over a batch of units
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Arc<RateLimitedClient>,
}

impl Dispatcher {
    pub fn new(client: Arc<RateLimitedClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<RateLimitedClient> {
        &self.client
    }

    /// Translate every unit in place
    pub async fn dispatch<'a, I>(&self, units: I, run: &PipelineRun, observer: &dyn PipelineObserver) -> DispatchSummary
    where
        I: IntoIterator<Item = &'a mut TranslationUnit>,
    {
        let units: Vec<&'a mut TranslationUnit> = units.into_iter().collect();
        let total = units.len();
        debug!("[{}] Dispatching {} units", run.id, total);

        let results: Vec<UnitResult> = stream::iter(units)
            .map(|unit| self.translate_unit(unit, run, observer))
            // The admission gate is the only backpressure
            .buffer_unordered(total.max(1))
            .collect()
            .await;

        let mut summary = DispatchSummary { total, ..Default::default() };
        for result in results {
            match result {
                UnitResult::Translated => summary.translated += 1,
                UnitResult::Failed => summary.failed += 1,
                UnitResult::Skipped => summary.skipped += 1,
            }
        }
        summary.cancel_reason = run.cancel.reason().cloned();

        info!(
            "Translated {} of {} units ({} failed, {} skipped)",
            summary.translated, summary.total, summary.failed, summary.skipped
        );
        summary
    }

    async fn translate_unit(
        &self,
        unit: &mut TranslationUnit,
        run: &PipelineRun,
        observer: &dyn PipelineObserver,
    ) -> UnitResult {
        if run.cancel.is_cancelled() {
            return UnitResult::Skipped;
        }

        match self.client.translate(&unit.original_text, &run.cancel).await {
            Some(outcome) => {
                let text = outcome.resolve(&unit.original_text);
                let translated_chars = text.chars().count();
                let billed_chars = unit.original_text.chars().count();
                unit.set_translation(text);
                run.progress.record_completed(translated_chars as u64, billed_chars as u64);
                observer.on_unit_completed(translated_chars);
                UnitResult::Translated
            }
            None if run.cancel.is_cancelled() => UnitResult::Skipped,
            None => UnitResult::Failed,
        }
    }
}
