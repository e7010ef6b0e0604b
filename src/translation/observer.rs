/*!
 * Presentation boundary of the pipeline.
 *
 * The pipeline never prints or prompts by itself; it reports through a
 * `PipelineObserver`. Every method has a no-op default so observers only
 * implement what they display.
 */

use super::cancel::CancelReason;
use super::updater::ApplyReport;

pub trait PipelineObserver: Send + Sync {
    /// Extraction produced `units` translatable units
    fn on_extraction_finished(&self, _units: usize) {}

    /// One unit was translated; `characters` is the length of the translation
    fn on_unit_completed(&self, _characters: usize) {}

    /// The translation phase is over
    fn on_translation_finished(&self, _cancelled: bool, _reason: Option<&CancelReason>) {}

    /// Units of one document were rejected by validation
    fn on_apply_report(&self, _report: &ApplyReport) {}

    /// Whether to write back what was translated before a cancellation
    fn confirm_partial_apply(&self, _reason: &CancelReason) -> bool {
        true
    }
}

/// Observer ignoring every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}
