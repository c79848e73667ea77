use crate::models::ResultSet;
use thiserror::Error;

/// Failure while fetching or decoding a single search page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("malformed page data: {0}")]
    DataFormat(String),

    #[error("collection cancelled")]
    Cancelled,
}

impl ScrapeError {
    /// Transport failures and non-success responses.
    pub fn is_network(&self) -> bool {
        matches!(self, ScrapeError::Network { .. } | ScrapeError::HttpStatus { .. })
    }

    pub fn is_data_format(&self) -> bool {
        matches!(self, ScrapeError::DataFormat(_))
    }
}

/// A collection run aborted on `page`. `partial` holds everything merged
/// from earlier pages, sorted by price.
#[derive(Debug, Error)]
#[error("collection aborted on page {page}: {source}")]
pub struct CollectError {
    pub page: u32,
    #[source]
    pub source: ScrapeError,
    pub partial: ResultSet,
}

/// One offer record that was dropped while extracting a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionAnomaly {
    pub index: usize,
    pub reason: String,
}

impl std::fmt::Display for ExtractionAnomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "offer #{}: {}", self.index, self.reason)
    }
}
