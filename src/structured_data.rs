use crate::error::ScrapeError;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

const JSON_LD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// Parses the first `application/ld+json` block of `body` that holds valid JSON.
pub fn extract_json_ld(body: &str) -> Result<Value, ScrapeError> {
    let document = Html::parse_document(body);
    let selector = Selector::parse(JSON_LD_SELECTOR)
        .map_err(|e| ScrapeError::DataFormat(format!("invalid selector: {:?}", e)))?;

    let mut last_error = None;
    for element in document.select(&selector) {
        let json_str = element.text().collect::<String>();
        match serde_json::from_str::<Value>(json_str.trim()) {
            Ok(value) => return Ok(value),
            Err(e) => {
                debug!("Skipping unparseable JSON-LD block: {}", e);
                last_error = Some(e);
            }
        }
    }

    Err(match last_error {
        Some(e) => ScrapeError::DataFormat(format!("failed to parse structured data: {}", e)),
        None => ScrapeError::DataFormat("structured data block not found".to_string()),
    })
}
