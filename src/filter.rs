use crate::models::{Offer, ResultSet};
use crate::normalize::normalize;

/// Keeps offers whose normalized name contains the normalized `target_model`
/// and whose price is within `max_price` (no limit when `None`).
/// Input order is preserved; the input set is left untouched.
pub fn filter(results: &ResultSet, target_model: &str, max_price: Option<u64>) -> ResultSet {
    let target = normalize(target_model);
    results
        .iter()
        .filter(|offer| matches_offer(offer, &target, max_price))
        .cloned()
        .collect()
}

fn matches_offer(offer: &Offer, normalized_target: &str, max_price: Option<u64>) -> bool {
    let within_budget = max_price.map_or(true, |max| offer.price <= max);
    within_budget && normalize(&offer.name).contains(normalized_target)
}
