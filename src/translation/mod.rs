/*!
 * Translation of extracted model text.
 *
 * This module contains the core of a translation run. It is split into
 * several submodules:
 *
 * - `model`: Translation units and groups
 * - `cancel`: Cooperative cancellation signal
 * - `progress`: Progress counters and per-run state
 * - `client`: Rate-limited client for the translation API
 * - `dispatcher`: Concurrent fan-out of units to the client
 * - `updater`: Transactional write-back into the model
 * - `observer`: Presentation callbacks
 * - `pipeline`: Orchestration of a complete run
 */

// Re-export main types for easier usage
pub use self::cancel::{CancelReason, CancelSignal};
pub use self::client::{ClientOptions, RateLimitedClient, TranslationOutcome, Usage};
pub use self::dispatcher::{DispatchSummary, Dispatcher};
pub use self::model::{DocumentRef, Owner, TranslationGroup, TranslationUnit, UnitKind};
pub use self::observer::{NoopObserver, PipelineObserver};
pub use self::pipeline::{PipelineConfig, PipelineResult, TranslationPipeline};
pub use self::progress::{PipelineRun, ProgressAggregator, ProgressSnapshot};
pub use self::updater::{ApplyReport, ApplySummary, ModelUpdater};

// Submodules
pub mod cancel;
pub mod client;
pub mod dispatcher;
pub mod model;
pub mod observer;
pub mod pipeline;
pub mod progress;
pub mod updater;
