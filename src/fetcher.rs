use crate::error::ScrapeError;
use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

const USER_AGENTS: [&str; 2] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.0.0 Safari/537.36",
];

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Raw response of a page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests. Implementations should bound each request with a
/// timeout and report it as `ScrapeError::Network`.
pub trait PageFetcher {
    fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<Page, ScrapeError>;
}

impl<F: PageFetcher + ?Sized> PageFetcher for &F {
    fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<Page, ScrapeError> {
        (**self).fetch(url, headers)
    }
}

/// Browser-like request headers.
pub fn default_headers() -> Vec<(String, String)> {
    let user_agent = USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0]);

    vec![
        ("User-Agent".to_string(), user_agent.to_string()),
        ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
    ]
}

/// Fetches `url` with default headers and returns the body of a successful response.
pub fn fetch_body<F: PageFetcher + ?Sized>(fetcher: &F, url: &str) -> Result<String, ScrapeError> {
    debug!("Fetching {}", url);
    let page = fetcher.fetch(url, &default_headers())?;

    if !page.is_success() {
        return Err(ScrapeError::HttpStatus {
            url: url.to_string(),
            status: page.status,
        });
    }

    debug!("Fetched {} bytes from {}", page.body.len(), url);
    Ok(page.body)
}

pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, timeout })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<Page, ScrapeError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let network_error = |e: reqwest::Error| ScrapeError::Network {
            url: url.to_string(),
            message: if e.is_timeout() {
                format!("timed out after {}s", self.timeout.as_secs())
            } else {
                e.to_string()
            },
        };

        let response = request.send().map_err(network_error)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(network_error)?;

        Ok(Page { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct StaticFetcher(Page);

    impl PageFetcher for StaticFetcher {
        fn fetch(&self, _url: &str, headers: &[(String, String)]) -> Result<Page, ScrapeError> {
            assert!(headers.iter().any(|(name, _)| name == "User-Agent"));
            Ok(self.0.clone())
        }
    }

    #[test]
    fn returns_body_on_success() {
        let fetcher = StaticFetcher(Page::ok("<html></html>"));
        assert_eq!(fetch_body(&fetcher, "https://example.com").unwrap(), "<html></html>");
    }

    #[test]
    fn non_success_status_is_a_network_error() {
        let fetcher = StaticFetcher(Page { status: 403, body: "denied".to_string() });
        let err = fetch_body(&fetcher, "https://example.com").unwrap_err();
        assert_eq!(
            err,
            ScrapeError::HttpStatus { url: "https://example.com".to_string(), status: 403 }
        );
        assert!(err.is_network());
    }

    #[test]
    fn default_headers_set_language() {
        let headers = default_headers();
        assert!(headers.contains(&("Accept-Language".to_string(), "en-US,en;q=0.9".to_string())));
        assert!(headers.iter().any(|(name, value)| name == "User-Agent" && USER_AGENTS.contains(&value.as_str())));
    }
}
