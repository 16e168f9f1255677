//! Test utilities and helper functions for the crawlstate test suite

use anyhow::Result;
use kodegen_tools_crawlstate::{CrawlRequest, RequestFingerprinter};
use tempfile::TempDir;

/// Creates a temporary directory for a job's storage
#[allow(dead_code)]
pub fn create_test_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Routes library logs to the test harness; safe to call repeatedly
#[allow(dead_code)]
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fingerprints a request as its URL verbatim, so scenarios can spell out
/// the exact fingerprints they expect to find in the dedup log.
#[allow(dead_code)]
pub struct UrlFingerprinter;

impl RequestFingerprinter for UrlFingerprinter {
    fn fingerprint(&self, request: &CrawlRequest) -> String {
        request.url.clone()
    }
}

/// A GET request for `url`
#[allow(dead_code)]
pub fn req(url: &str) -> CrawlRequest {
    CrawlRequest::get(url)
}
