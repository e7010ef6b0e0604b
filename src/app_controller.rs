use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::host::{ExtractionCollector, JsonModel};
use crate::providers::Provider;
use crate::providers::deepl::DeepL;
use crate::translation::{
    ApplyReport, CancelReason, ClientOptions, ModelUpdater, PipelineConfig, PipelineObserver,
    PipelineResult, PipelineRun, RateLimitedClient, TranslationPipeline, Usage,
};

/// Interval at which the progress bar reads the counters
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Main application controller for model translation
pub struct Controller {
    config: Config,
}

/// Observer rendering pipeline events on the terminal
struct ConsoleObserver {
    bar: ProgressBar,
    assume_yes: bool,
}

impl PipelineObserver for ConsoleObserver {
    fn on_extraction_finished(&self, units: usize) {
        self.bar.set_length(units as u64);
        info!("Found {} texts to translate", units);
    }

    fn on_translation_finished(&self, cancelled: bool, reason: Option<&CancelReason>) {
        self.bar.finish_and_clear();
        if cancelled {
            match reason {
                Some(reason) => warn!("Translation stopped: {}", reason),
                None => warn!("Translation stopped"),
            }
        }
    }

    fn on_apply_report(&self, report: &ApplyReport) {
        warn!("{}", report);
    }

    fn confirm_partial_apply(&self, reason: &CancelReason) -> bool {
        if self.assume_yes {
            return true;
        }
        off_runtime(|| {
            self.bar.suspend(|| {
                print!("Translation was interrupted ({}). Apply the texts translated so far? [y/N] ", reason);
                let _ = std::io::stdout().flush();
                read_answer(std::io::stdin().lock())
            })
        })
    }
}

/// Run blocking terminal I/O without stalling the other tasks of a
/// multi-threaded runtime
fn off_runtime<T>(f: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(tokio::runtime::RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}

/// Read a y/N answer, anything but yes declines
fn read_answer(mut input: impl BufRead) -> bool {
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

impl Controller {
    /// Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// HTTP provider built from the configuration
    pub fn build_provider(&self) -> Arc<dyn Provider> {
        Arc::new(DeepL::new_with_config(
            self.config.api.api_key.clone(),
            self.config.resolved_endpoint(),
            self.config.api.timeout_secs,
        ))
    }

    fn build_pipeline(&self, provider: Arc<dyn Provider>) -> Result<TranslationPipeline> {
        let options = ClientOptions::from_config(&self.config)?;
        let client = Arc::new(RateLimitedClient::new(provider, options));
        let updater = ModelUpdater::from_config(&self.config.write_back);
        Ok(TranslationPipeline::new(
            client,
            updater,
            PipelineConfig::from_config(&self.config.dispatch),
        ))
    }

    /// Default output file: `<stem>.<target>.json` next to the input
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "model".to_string());
        let file_name = format!("{}.{}.json", stem, self.config.target_language.to_lowercase());
        input.with_file_name(file_name)
    }

    /// Translate a model file with the configured API
    pub async fn run(&self, input: &Path, output: Option<PathBuf>, assume_yes: bool) -> Result<PipelineResult> {
        self.run_with_provider(self.build_provider(), input, output, assume_yes).await
    }

    /// Translate a model file through `provider`
    pub async fn run_with_provider(
        &self,
        provider: Arc<dyn Provider>,
        input: &Path,
        output: Option<PathBuf>,
        assume_yes: bool,
    ) -> Result<PipelineResult> {
        if !input.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input));
        }

        let mut model = JsonModel::load(input)?;
        let mut groups = ExtractionCollector::new().collect(&model)?;
        let pipeline = self.build_pipeline(provider)?;

        let run = Arc::new(PipelineRun::new());
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} texts ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("█▓▒░"));

        let ticker = {
            let run = Arc::clone(&run);
            let bar = bar.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(PROGRESS_POLL_INTERVAL);
                while !bar.is_finished() {
                    interval.tick().await;
                    let snapshot = run.progress.snapshot();
                    bar.set_position(snapshot.units_completed as u64);
                    bar.set_message(format!("{} chars", snapshot.characters_translated));
                }
            })
        };

        // First Ctrl-C stops translating, a second one stops writing back
        let interrupt = {
            let run = Arc::clone(&run);
            tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if !run.cancel.is_cancelled() {
                        run.cancel.cancel(CancelReason::User);
                    } else {
                        run.apply_abort.cancel(CancelReason::User);
                        break;
                    }
                }
            })
        };

        let observer = ConsoleObserver { bar: bar.clone(), assume_yes };
        let result = pipeline.run(&mut model, &mut groups, &run, &observer).await;

        interrupt.abort();
        ticker.abort();
        bar.finish_and_clear();

        if let Some(ref apply) = result.apply {
            for failure in &apply.failures {
                warn!("{} was left unchanged: {}", failure.document, failure.error);
            }
            if apply.groups_committed > 0 {
                let output = output.unwrap_or_else(|| self.output_path_for(input));
                model.save(&output)?;
                info!("Success: {:?}", output);
            }
        }

        info!("{}", result.summary());
        Ok(result)
    }

    /// Query the account usage with the configured API
    pub async fn usage(&self) -> Result<Usage> {
        self.usage_with_provider(self.build_provider()).await
    }

    pub async fn usage_with_provider(&self, provider: Arc<dyn Provider>) -> Result<Usage> {
        let client = RateLimitedClient::new(provider, ClientOptions::from_config(&self.config)?);
        let usage = client.check_usage().await.context("Failed to query account usage")?;
        Ok(usage)
    }
}
