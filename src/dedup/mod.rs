//! Request deduplication with a durable fingerprint log
//!
//! [`DedupFilter`] keeps the set of every request fingerprint the job has
//! processed. With a persister configured, each new fingerprint is appended
//! to the `requests.seen` log before `seen` returns, and a fresh filter
//! rebuilds the set from that log, so a resumed job never revisits URLs
//! from earlier runs.

// Sub-modules
pub mod fingerprint;

// Re-exports for public API
pub use fingerprint::{RequestFingerprinter, Xxh3Fingerprinter, canonical_url};

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;

use crate::config::JobConfig;
use crate::persist::{PersistError, PersistResult, Persister};
use crate::request::CrawlRequest;
use crate::stats::{MemoryStats, StatsSink};

/// Durable key holding the newline-separated dedup log.
pub const SEEN_LOG_KEY: &str = "requests.seen";

/// Counter incremented for every suppressed duplicate.
pub const FILTERED_COUNTER: &str = "dupefilter/filtered";

/// Request-fingerprint duplicates filter.
pub struct DedupFilter {
    fingerprints: HashSet<String>,
    persister: Option<Box<dyn Persister>>,
    fingerprinter: Box<dyn RequestFingerprinter>,
    stats: Arc<dyn StatsSink>,
    debug: bool,
    log_dupes: bool,
}

impl std::fmt::Debug for DedupFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupFilter")
            .field("fingerprints", &self.fingerprints.len())
            .field("persister", &self.persister.is_some())
            .field("debug", &self.debug)
            .field("log_dupes", &self.log_dupes)
            .finish_non_exhaustive()
    }
}

impl DedupFilter {
    /// Builds a filter, rebuilding prior dedup state from `persister` when
    /// one is supplied.
    ///
    /// The stored log is decoded as UTF-8 and split on newlines; empty
    /// lines (the empty-fallback case included) are filtered out so they
    /// can never match a real fingerprint.
    pub fn new(persister: Option<Box<dyn Persister>>, debug: bool) -> PersistResult<Self> {
        let mut fingerprints = HashSet::new();
        if let Some(persister) = &persister {
            let raw = persister.get(SEEN_LOG_KEY, b"")?;
            let text = String::from_utf8(raw).map_err(|_| PersistError::Utf8 {
                key: SEEN_LOG_KEY.to_owned(),
            })?;
            fingerprints.extend(
                text.split('\n')
                    .filter(|line| !line.is_empty())
                    .map(str::to_owned),
            );
            debug!(
                "Loaded {} fingerprints from previous runs",
                fingerprints.len()
            );
        }
        Ok(Self {
            fingerprints,
            persister,
            fingerprinter: Box::new(Xxh3Fingerprinter),
            stats: Arc::new(MemoryStats::new()),
            debug,
            log_dupes: true,
        })
    }

    /// Builds a filter from job configuration; a configured job directory
    /// yields a disk-backed filter, otherwise dedup state is ephemeral.
    pub fn from_config(config: &JobConfig) -> PersistResult<Self> {
        Self::new(config.build_persister()?, config.dedup_debug())
    }

    /// Replaces the fingerprinting collaborator.
    #[must_use]
    pub fn with_fingerprinter(mut self, fingerprinter: Box<dyn RequestFingerprinter>) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    /// Attaches a shared stats sink.
    #[must_use]
    pub fn with_stats(mut self, stats: Arc<dyn StatsSink>) -> Self {
        self.stats = stats;
        self
    }

    /// The stats sink duplicates are counted on.
    #[must_use]
    pub fn stats(&self) -> Arc<dyn StatsSink> {
        Arc::clone(&self.stats)
    }

    /// Number of distinct fingerprints recorded so far.
    #[must_use]
    pub fn fingerprint_count(&self) -> usize {
        self.fingerprints.len()
    }

    /// The fingerprint the configured collaborator assigns to `request`.
    #[must_use]
    pub fn request_fingerprint(&self, request: &CrawlRequest) -> String {
        self.fingerprinter.fingerprint(request)
    }

    /// Answers whether `request` was seen before, recording it if not.
    ///
    /// A new fingerprint is appended durably before this returns; an append
    /// failure propagates and the request does not count as recorded.
    pub fn seen(&mut self, request: &CrawlRequest) -> PersistResult<bool> {
        let fingerprint = self.fingerprinter.fingerprint(request);
        if self.fingerprints.contains(&fingerprint) {
            return Ok(true);
        }
        if let Some(persister) = self.persister.as_mut() {
            let mut line = fingerprint.clone().into_bytes();
            line.push(b'\n');
            persister.append(SEEN_LOG_KEY, &line)?;
        }
        self.fingerprints.insert(fingerprint);
        Ok(false)
    }

    /// Observability hook for a request `seen` already reported as a
    /// duplicate.
    ///
    /// In debug mode every duplicate is logged; otherwise only the first
    /// one per filter instance. The `dupefilter/filtered` counter is always
    /// incremented.
    pub fn log(&mut self, request: &CrawlRequest) {
        if self.debug {
            debug!("Filtered duplicate request: {}", request.url);
        } else if self.log_dupes {
            debug!(
                "Filtered duplicate request: {} - no more duplicates will be shown (enable dedup debug to show all)",
                request.url
            );
            self.log_dupes = false;
        }
        self.stats.inc_value(FILTERED_COUNTER);
    }

    /// Releases the dedup-log append handle, if a persister is configured.
    pub fn close(&mut self, reason: &str) -> PersistResult<()> {
        debug!("Closing dedup filter ({reason})");
        if let Some(persister) = self.persister.as_mut() {
            persister.close(SEEN_LOG_KEY)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryPersister;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Fingerprints a request as its URL, so tests control fingerprints
    /// directly.
    struct UrlFingerprinter;

    impl RequestFingerprinter for UrlFingerprinter {
        fn fingerprint(&self, request: &CrawlRequest) -> String {
            request.url.clone()
        }
    }

    /// Persister whose backing map outlives the filter that owns it.
    #[derive(Default, Clone)]
    struct SharedPersister {
        inner: Rc<RefCell<MemoryPersister>>,
    }

    impl Persister for SharedPersister {
        fn get(&self, key: &str, fallback: &[u8]) -> PersistResult<Vec<u8>> {
            self.inner.borrow().get(key, fallback)
        }
        fn set(&mut self, key: &str, value: &[u8]) -> PersistResult<()> {
            self.inner.borrow_mut().set(key, value)
        }
        fn exists(&self, key: &str) -> bool {
            self.inner.borrow().exists(key)
        }
        fn append(&mut self, key: &str, value: &[u8]) -> PersistResult<()> {
            self.inner.borrow_mut().append(key, value)
        }
        fn remove(&mut self, key: &str) -> PersistResult<()> {
            self.inner.borrow_mut().remove(key)
        }
        fn close(&mut self, key: &str) -> PersistResult<()> {
            self.inner.borrow_mut().close(key)
        }
    }

    fn url_filter(persister: Option<Box<dyn Persister>>) -> DedupFilter {
        DedupFilter::new(persister, false)
            .unwrap()
            .with_fingerprinter(Box::new(UrlFingerprinter))
    }

    #[test]
    fn second_sighting_is_a_duplicate() {
        let mut filter = url_filter(None);
        let request = CrawlRequest::get("https://example.com/a");

        assert!(!filter.seen(&request).unwrap());
        assert!(filter.seen(&request).unwrap());
        assert_eq!(filter.fingerprint_count(), 1);
    }

    #[test]
    fn empty_fingerprint_is_an_ordinary_value() {
        let mut filter = url_filter(None);
        let request = CrawlRequest::get("");

        assert!(!filter.seen(&request).unwrap());
        assert!(filter.seen(&request).unwrap());
    }

    #[test]
    fn new_fingerprints_are_appended_as_lines() {
        let shared = SharedPersister::default();
        let mut filter = url_filter(Some(Box::new(shared.clone())));

        filter.seen(&CrawlRequest::get("a")).unwrap();
        filter.seen(&CrawlRequest::get("b")).unwrap();
        filter.seen(&CrawlRequest::get("a")).unwrap();
        filter.close("finished").unwrap();

        let log = shared.get(SEEN_LOG_KEY, b"").unwrap();
        assert_eq!(log, b"a\nb\n".to_vec());
    }

    #[test]
    fn loading_filters_empty_log_lines() {
        let mut persister = MemoryPersister::new();
        persister.set(SEEN_LOG_KEY, b"a\n\nb\n").unwrap();

        let mut filter = url_filter(Some(Box::new(persister)));
        assert_eq!(filter.fingerprint_count(), 2);
        assert!(filter.seen(&CrawlRequest::get("a")).unwrap());
        assert!(!filter.seen(&CrawlRequest::get("")).unwrap());
    }

    #[test]
    fn undecodable_log_fails_loudly() {
        let mut persister = MemoryPersister::new();
        persister.set(SEEN_LOG_KEY, &[0xff, 0xfe, b'\n']).unwrap();

        let err = DedupFilter::new(Some(Box::new(persister)), false).unwrap_err();
        assert!(matches!(err, PersistError::Utf8 { .. }));
    }

    #[test]
    fn log_always_counts_filtered_duplicates() {
        let stats = Arc::new(MemoryStats::new());
        let mut filter = url_filter(None).with_stats(stats.clone());
        let request = CrawlRequest::get("https://example.com/a");

        filter.seen(&request).unwrap();
        for _ in 0..3 {
            assert!(filter.seen(&request).unwrap());
            filter.log(&request);
        }
        assert_eq!(stats.value(FILTERED_COUNTER), 3);
    }
}
