/*!
 * # bimtrans - Building model text translation
 *
 * A Rust library for translating the texts of a building model through a
 * rate-limited remote translation API.
 *
 * ## Features
 *
 * - Extract element names, parameter values, project information, schedule
 *   headings and cells, text notes and dimension overrides
 * - Translate them concurrently behind an admission gate, with backoff on
 *   throttling and a run-wide stop on fatal API answers
 * - Cooperative cancellation with the choice to keep partial results
 * - Transactional write-back per document, with validation of name fields
 *   and rollback on failure
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: Translation run:
 *   - `translation::model`: Translation units and groups
 *   - `translation::client`: Rate-limited API client
 *   - `translation::dispatcher`: Concurrent dispatch of units
 *   - `translation::updater`: Transactional write-back
 *   - `translation::pipeline`: Orchestration of a run
 * - `host`: Document graph boundary and the JSON reference model
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for the translation API:
 *   - `providers::deepl`: DeepL API client
 *   - `providers::mock`: Scripted provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod host;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, HostError, ProviderError, WriteBackError};
pub use host::{ExtractionCollector, HostModel, JsonModel};
pub use language_utils::{get_language_name, language_codes_match, to_api_language_code};
pub use translation::{
    CancelReason, CancelSignal, PipelineObserver, PipelineRun, RateLimitedClient, TranslationGroup,
    TranslationPipeline, TranslationUnit,
};
