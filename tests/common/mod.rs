#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use site_mirror::{ByteFetcher, FetchError, FetchedPage, PageSource};
use url::Url;

/// Serves one fixed HTML page regardless of the requested URL.
pub struct FixturePage {
    pub url: Url,
    pub html: String,
}

impl FixturePage {
    pub fn new(url: &str, html: &str) -> Self {
        Self {
            url: Url::parse(url).unwrap(),
            html: html.to_string(),
        }
    }
}

#[async_trait]
impl PageSource for FixturePage {
    async fn fetch_page(&self, _url: &str) -> Result<FetchedPage, FetchError> {
        Ok(FetchedPage {
            url: self.url.clone(),
            status: 200,
            content_type: Some(mime::TEXT_HTML_UTF_8),
            html: self.html.clone(),
        })
    }
}

/// Entry page that can never be reached.
pub struct UnreachablePage;

#[async_trait]
impl PageSource for UnreachablePage {
    async fn fetch_page(&self, _url: &str) -> Result<FetchedPage, FetchError> {
        Err(FetchError::Timeout)
    }
}

/// In-memory asset server that counts requests per URL. Unknown URLs and
/// URLs marked as timing out fail.
#[derive(Default)]
pub struct FixtureFetcher {
    assets: HashMap<String, Vec<u8>>,
    timeouts: Vec<String>,
    panics: Vec<String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, url: &str, body: &[u8]) -> Self {
        self.assets.insert(url.to_string(), body.to_vec());
        self
    }

    pub fn with_timeout(mut self, url: &str) -> Self {
        self.timeouts.push(url.to_string());
        self
    }

    /// The fetch task for `url` panics instead of returning.
    pub fn with_panic(mut self, url: &str) -> Self {
        self.panics.push(url.to_string());
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl ByteFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
        tokio::task::yield_now().await;

        if self.panics.iter().any(|p| p == url) {
            panic!("fixture fetch for {} blew up", url);
        }
        if self.timeouts.iter().any(|t| t == url) {
            return Err(FetchError::Timeout);
        }
        self.assets
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::MalformedUrl(url.to_string()))
    }
}
