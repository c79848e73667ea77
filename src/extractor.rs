use crate::error::{ExtractionAnomaly, ScrapeError};
use crate::models::{Offer, ResultSet};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

const OFFER_TYPE: &str = "Offer";
const IN_STOCK: &str = "InStock";

/// Lenient view of one schema.org offer entry.
#[derive(Debug, Deserialize)]
struct RawOffer {
    #[serde(rename = "@type")]
    kind: Option<String>,
    availability: Option<String>,
    price: Option<Value>,
    name: Option<String>,
    url: Option<String>,
    image: Option<Value>,
}

/// Offers of one page plus the records that had to be dropped.
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub offers: ResultSet,
    /// Malformed records that were skipped.
    pub anomalies: Vec<ExtractionAnomaly>,
    /// Well-formed records filtered out for type, availability or missing price.
    pub discarded: usize,
}

/// Converts a page's structured data into offers tagged with `page`,
/// sorted by price. Malformed records are logged and skipped.
pub fn extract_offers(data: &Value, page: u32) -> Result<ResultSet, ScrapeError> {
    let extraction = extract_page(data, page)?;
    for anomaly in &extraction.anomalies {
        warn!("Page {}: skipped {}", page, anomaly);
    }
    Ok(extraction.offers)
}

pub fn extract_page(data: &Value, page: u32) -> Result<PageExtraction, ScrapeError> {
    let entries = find_offer_collection(data)
        .ok_or_else(|| ScrapeError::DataFormat("no offer collection in structured data".to_string()))?;

    let mut extraction = PageExtraction::default();

    for (index, entry) in entries.iter().enumerate() {
        let raw = match RawOffer::deserialize(entry) {
            Ok(raw) => raw,
            Err(e) => {
                extraction.anomalies.push(ExtractionAnomaly { index, reason: e.to_string() });
                continue;
            }
        };

        match convert_offer(raw, page) {
            Ok(Some(offer)) => {
                if !extraction.offers.insert(offer) {
                    debug!("Page {}: duplicate offer #{} dropped", page, index);
                }
            }
            Ok(None) => extraction.discarded += 1,
            Err(reason) => extraction.anomalies.push(ExtractionAnomaly { index, reason }),
        }
    }

    debug!(
        "Page {}: {} offers kept, {} discarded, {} malformed",
        page,
        extraction.offers.len(),
        extraction.discarded,
        extraction.anomalies.len()
    );

    extraction.offers.sort_by_price();
    Ok(extraction)
}

/// Locates the offer list: a top-level `offers` array, or the first `@graph`
/// node that carries one. `offers` may also be an `AggregateOffer` wrapping
/// the list.
pub fn find_offer_collection(data: &Value) -> Option<&Vec<Value>> {
    match data {
        Value::Array(documents) => documents.iter().find_map(find_offer_collection),
        Value::Object(_) => offers_of(data).or_else(|| {
            data.get("@graph")?
                .as_array()?
                .iter()
                .find_map(offers_of)
        }),
        _ => None,
    }
}

fn offers_of(node: &Value) -> Option<&Vec<Value>> {
    match node.get("offers")? {
        Value::Array(offers) => Some(offers),
        Value::Object(aggregate) => aggregate.get("offers").and_then(Value::as_array),
        _ => None,
    }
}

/// `Ok(None)` for records that are valid but not wanted.
fn convert_offer(raw: RawOffer, page: u32) -> Result<Option<Offer>, String> {
    if raw.kind.as_deref() != Some(OFFER_TYPE) {
        return Ok(None);
    }

    let availability = raw
        .availability
        .as_deref()
        .and_then(|a| a.rsplit('/').next())
        .unwrap_or_default();
    if availability != IN_STOCK {
        return Ok(None);
    }

    let price = match raw.price {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => coerce_price(&value)?,
    };

    let url = raw
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| "missing url".to_string())?;
    let name = raw.name.ok_or_else(|| "missing name".to_string())?;

    Ok(Some(Offer {
        url,
        name,
        price,
        image: flatten_image(raw.image.as_ref()),
        page,
    }))
}

fn coerce_price(value: &Value) -> Result<u64, String> {
    match value {
        Value::Number(number) => {
            if let Some(price) = number.as_u64() {
                return Ok(price);
            }
            match number.as_f64() {
                Some(price) if price.is_finite() && price >= 0.0 => Ok(price.trunc() as u64),
                _ => Err(format!("invalid price {}", number)),
            }
        }
        Value::String(text) => {
            let cleaned: String = text
                .chars()
                .filter(|c| !c.is_whitespace() && *c != ',')
                .collect();
            cleaned
                .parse::<u64>()
                .ok()
                .or_else(|| {
                    cleaned
                        .parse::<f64>()
                        .ok()
                        .filter(|p| p.is_finite() && *p >= 0.0)
                        .map(|p| p.trunc() as u64)
                })
                .ok_or_else(|| format!("invalid price '{}'", text))
        }
        other => Err(format!("invalid price {}", other)),
    }
}

fn flatten_image(image: Option<&Value>) -> String {
    match image {
        Some(Value::String(url)) => url.clone(),
        Some(Value::Object(object)) => object
            .get("contentUrl")
            .or_else(|| object.get("url"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some(Value::Array(images)) => flatten_image(images.first()),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn offer_entry(url: &str, price: Value) -> Value {
        json!({
            "@type": "Offer",
            "availability": "https://schema.org/InStock",
            "price": price,
            "priceCurrency": "BRL",
            "name": format!("Rolex Submariner {}", url),
            "url": url,
            "image": { "@type": "ImageObject", "contentUrl": format!("https://img.example/{}.jpg", url) }
        })
    }

    fn document(offers: Vec<Value>) -> Value {
        json!({
            "@context": "https://schema.org",
            "@graph": [
                { "@type": "WebSite", "name": "Chrono24" },
                { "@type": "Product", "name": "Rolex Submariner", "offers": {
                    "@type": "AggregateOffer",
                    "offers": offers
                }}
            ]
        })
    }

    #[test]
    fn extracts_and_sorts_in_stock_offers() {
        let data = document(vec![
            offer_entry("a", json!(900)),
            offer_entry("b", json!("500")),
            offer_entry("c", json!(700.9)),
        ]);

        let offers = extract_offers(&data, 2).unwrap();
        let prices: Vec<u64> = offers.iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![500, 700, 900]);
        assert!(offers.iter().all(|o| o.page == 2));
        assert_eq!(offers.offers()[0].image, "https://img.example/b.jpg");
    }

    #[test]
    fn discards_wrong_type_availability_and_missing_price() {
        let mut sold = offer_entry("sold", json!(100));
        sold["availability"] = json!("https://schema.org/SoldOut");
        let mut aggregate = offer_entry("agg", json!(100));
        aggregate["@type"] = json!("AggregateOffer");
        let mut no_price = offer_entry("free", json!(null));
        no_price.as_object_mut().unwrap().remove("price");
        let null_price = offer_entry("null", Value::Null);

        let data = document(vec![sold, aggregate, no_price, null_price, offer_entry("ok", json!(10))]);
        let extraction = extract_page(&data, 1).unwrap();

        assert_eq!(extraction.offers.len(), 1);
        assert_eq!(extraction.offers.offers()[0].url, "ok");
        assert_eq!(extraction.discarded, 4);
        assert!(extraction.anomalies.is_empty());
    }

    #[test]
    fn malformed_records_are_anomalies_not_errors() {
        let mut no_url = offer_entry("x", json!(10));
        no_url.as_object_mut().unwrap().remove("url");
        let bad_price = offer_entry("y", json!("call us"));
        let mut numeric_name = offer_entry("z", json!(10));
        numeric_name["name"] = json!(42);

        let data = document(vec![no_url, bad_price, json!("garbage"), numeric_name, offer_entry("ok", json!(10))]);
        let extraction = extract_page(&data, 1).unwrap();

        assert_eq!(extraction.offers.len(), 1);
        let indexes: Vec<usize> = extraction.anomalies.iter().map(|a| a.index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn missing_image_becomes_empty_string() {
        let mut entry = offer_entry("a", json!(10));
        entry.as_object_mut().unwrap().remove("image");
        let mut plain = offer_entry("b", json!(20));
        plain["image"] = json!("https://img.example/plain.jpg");

        let offers = extract_offers(&document(vec![entry, plain]), 1).unwrap();
        assert_eq!(offers.offers()[0].image, "");
        assert_eq!(offers.offers()[1].image, "https://img.example/plain.jpg");
    }

    #[test]
    fn duplicate_urls_within_a_page_keep_first() {
        let data = document(vec![offer_entry("a", json!(900)), offer_entry("a", json!(100))]);
        let offers = extract_offers(&data, 1).unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers.offers()[0].price, 900);
    }

    #[test]
    fn coerces_price_strings() {
        assert_eq!(coerce_price(&json!("12,500")), Ok(12500));
        assert_eq!(coerce_price(&json!(" 4500.99 ")), Ok(4500));
        assert!(coerce_price(&json!(-5)).is_err());
        assert!(coerce_price(&json!(true)).is_err());
    }

    #[test]
    fn finds_top_level_offer_list() {
        let data = json!({ "offers": [offer_entry("a", json!(1))] });
        assert_eq!(find_offer_collection(&data).map(Vec::len), Some(1));
    }

    #[test]
    fn empty_offer_list_is_not_an_error() {
        let offers = extract_offers(&document(vec![]), 1).unwrap();
        assert!(offers.is_empty());
    }

    #[test]
    fn missing_offer_collection_is_a_format_error() {
        let data = json!({ "@graph": [{ "@type": "WebSite" }] });
        let err = extract_offers(&data, 4).unwrap_err();
        assert!(err.is_data_format());
    }
}
