use crate::models::SearchQuery;

const BASE_URL: &str = "https://www.chrono24.com.br";
const PAGE_SIZE: u32 = 120;

/// Builds the search url for `query`.
///
/// Pure and deterministic: equal queries always give byte-identical urls.
/// Parameters appear in a fixed order and optional ones are only emitted
/// when set.
pub fn build_url(query: &SearchQuery) -> String {
    let brand_segment: String = query.brand.split_whitespace().collect();

    let mut params: Vec<String> = Vec::new();

    if let Some(range) = query.size_range {
        params.extend(range.diameters().map(|size| format!("caseDiameter={}", size)));
    }

    if let Some(code) = query.material.code() {
        params.push(format!("caseMaterials={}", code));
    }

    params.push("dosearch=true".to_string());
    params.push(format!("pageSize={}", PAGE_SIZE));
    params.push(format!("query={}", query_token(&query.brand, &query.model)));
    params.push(format!("showpage={}", query.page));

    if let Some(condition) = query.condition.as_param() {
        params.push(format!("usedOrNew={}", condition));
    }

    if let Some(max_price) = query.max_price {
        params.push(format!("priceTo={}", max_price));
    }

    format!(
        "{}/{}/index.htm?{}",
        BASE_URL,
        urlencoding::encode(&brand_segment),
        params.join("&")
    )
}

/// Brand and model words, each percent-encoded, joined with `+`.
fn query_token(brand: &str, model: &str) -> String {
    brand
        .split_whitespace()
        .chain(model.split_whitespace())
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}
