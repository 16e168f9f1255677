//! The request value carried through dedup and scheduling

use serde::{Deserialize, Serialize};

/// A scheduled crawl request.
///
/// This is the minimal shape the durability layer needs: enough for a
/// fingerprinter to identify the request and for a queue to serialize it.
/// Transport concerns (headers, cookies, retries) live with the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub url: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<u8>,
    /// Link depth from the start URL, 0 for seeds.
    #[serde(default)]
    pub depth: u8,
}

impl CrawlRequest {
    /// A GET request for `url` at depth 0.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_owned(),
            body: Vec::new(),
            depth: 0,
        }
    }

    /// A POST request for `url` carrying `body`.
    #[must_use]
    pub fn post(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            method: "POST".to_owned(),
            body: body.into(),
            depth: 0,
        }
    }

    #[must_use]
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }
}
