use crate::fetcher::{fetch_body, PageFetcher};
use anyhow::{anyhow, Context, Result};
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Attribute table of a single listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferDetails {
    pub url: String,
    pub attributes: BTreeMap<String, String>,
}

pub fn scrape_offer_details<F: PageFetcher + ?Sized>(fetcher: &F, url: &str) -> Result<OfferDetails> {
    let body = fetch_body(fetcher, url).with_context(|| format!("Failed to fetch offer page {}", url))?;
    let attributes = parse_attribute_table(&body)?;
    debug!("Found {} attributes on {}", attributes.len(), url);

    Ok(OfferDetails {
        url: url.to_string(),
        attributes,
    })
}

/// Reads every two-cell table row as `label -> value`. The label is the
/// `<strong>` text of the first cell when present. Later rows overwrite
/// earlier ones with the same label.
pub fn parse_attribute_table(html: &str) -> Result<BTreeMap<String, String>> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("tr").map_err(|e| anyhow!("Failed to parse row selector: {:?}", e))?;
    let cell_selector = Selector::parse("td").map_err(|e| anyhow!("Failed to parse cell selector: {:?}", e))?;
    let strong_selector =
        Selector::parse("strong").map_err(|e| anyhow!("Failed to parse strong selector: {:?}", e))?;

    let mut attributes = BTreeMap::new();

    for row in document.select(&row_selector) {
        let cells: Vec<_> = row.select(&cell_selector).collect();
        if cells.len() != 2 {
            continue;
        }

        let label = match cells[0].select(&strong_selector).next() {
            Some(strong) => clean_text(&strong.text().collect::<String>()),
            None => clean_text(&cells[0].text().collect::<String>()),
        };
        if label.is_empty() {
            continue;
        }

        let value = clean_text(&cells[1].text().collect::<String>());
        attributes.insert(label, value);
    }

    Ok(attributes)
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
