/*!
 * Common test utilities for the bimtrans test suite
 */

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use bimtrans::providers::mock::MockProvider;
use bimtrans::translation::{ClientOptions, DocumentRef, Owner, RateLimitedClient, TranslationUnit, UnitKind};

pub mod models;

/// Route library logs to the test output, once per process
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    std::fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Client options targeting French with a short backoff
pub fn fast_options(pool_size: usize) -> ClientOptions {
    ClientOptions::new("FR")
        .with_pool_size(pool_size)
        .with_retry(5, Duration::from_millis(10))
}

/// Client over `provider` with `pool_size` admission slots
pub fn client_for(provider: &MockProvider, pool_size: usize) -> Arc<RateLimitedClient> {
    Arc::new(RateLimitedClient::new(Arc::new(provider.clone()), fast_options(pool_size)))
}

/// Name units of the project document "Tower"
pub fn name_units(texts: &[&str]) -> Vec<TranslationUnit> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            TranslationUnit::new(
                *text,
                Owner::Element { id: format!("{}", i + 1) },
                UnitKind::ElementName,
                DocumentRef::project("Tower"),
            )
            .expect("test texts are not empty")
        })
        .collect()
}

/// `count` distinct texts
pub fn numbered_texts(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{} {}", prefix, i + 1)).collect()
}
