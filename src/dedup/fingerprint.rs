//! Request fingerprinting
//!
//! A fingerprint is a deterministic, collision-resistant string identifying
//! a request for deduplication. The dedup filter treats it as opaque text;
//! implementations decide which request parts contribute to identity.

use url::Url;
use xxhash_rust::xxh3::Xxh3;

use crate::request::CrawlRequest;

/// Maps a request to a stable string identifier.
pub trait RequestFingerprinter {
    fn fingerprint(&self, request: &CrawlRequest) -> String;
}

/// Default fingerprinter: xxh3-128 over method, canonical URL and body,
/// rendered as 32 hex characters.
///
/// Two requests that differ only in URL fragment, host case or an explicit
/// default port fingerprint identically; method and body differences always
/// produce distinct fingerprints.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3Fingerprinter;

impl RequestFingerprinter for Xxh3Fingerprinter {
    fn fingerprint(&self, request: &CrawlRequest) -> String {
        let mut hasher = Xxh3::new();
        hasher.update(request.method.as_bytes());
        hasher.update(b"\n");
        hasher.update(canonical_url(&request.url).as_bytes());
        hasher.update(b"\n");
        hasher.update(&request.body);
        format!("{:032x}", hasher.digest128())
    }
}

/// Canonical form of a URL for identity comparison.
///
/// `Url::parse` already lowercases scheme and host and drops explicit
/// default ports; on top of that the fragment is removed (never sent to the
/// server) and a trailing slash on a non-root path is trimmed. Unparseable
/// input falls back to trimmed, lowercased text.
pub fn canonical_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.trim().to_lowercase();
    };
    url.set_fragment(None);
    if !url.cannot_be_a_base() {
        let path = url.path();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/').to_owned();
            if trimmed.is_empty() {
                url.set_path("/");
            } else {
                url.set_path(&trimmed);
            }
        }
    }
    url.into()
}
