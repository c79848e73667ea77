use anyhow::{anyhow, bail, Context, Result};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Material {
    #[default]
    Unspecified,
    Gold,
    Steel,
}

impl Material {
    /// Numeric `caseMaterials` code used by the search page.
    pub fn code(&self) -> Option<u8> {
        match self {
            Material::Unspecified => None,
            Material::Gold => Some(3),
            Material::Steel => Some(4),
        }
    }
}

impl FromStr for Material {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "any" => Ok(Material::Unspecified),
            "gold" => Ok(Material::Gold),
            "steel" => Ok(Material::Steel),
            other => Err(anyhow!("Unknown material '{}' (expected gold or steel)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Condition {
    #[default]
    Unspecified,
    Used,
    New,
}

impl Condition {
    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            Condition::Unspecified => None,
            Condition::Used => Some("used"),
            Condition::New => Some("new"),
        }
    }
}

impl FromStr for Condition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "any" => Ok(Condition::Unspecified),
            "used" => Ok(Condition::Used),
            "new" => Ok(Condition::New),
            other => Err(anyhow!("Unknown condition '{}' (expected used or new)", other)),
        }
    }
}

/// Inclusive range of case diameters in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    pub min: u32,
    pub max: u32,
}

impl SizeRange {
    pub fn new(min: u32, max: u32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn single(size: u32) -> Self {
        Self { min: size, max: size }
    }

    /// Builds a range from a list of bounds. One value means min = max,
    /// an empty list means no size restriction.
    pub fn from_bounds(bounds: &[u32]) -> Option<Self> {
        match bounds {
            [] => None,
            [size] => Some(Self::single(*size)),
            [min, max, ..] => Some(Self::new(*min, *max)),
        }
    }

    pub fn diameters(&self) -> RangeInclusive<u32> {
        self.min..=self.max
    }
}

impl FromStr for SizeRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let bounds = s
            .split('-')
            .map(|part| {
                part.trim()
                    .parse::<u32>()
                    .with_context(|| format!("Invalid case diameter '{}'", part.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if bounds.len() > 2 {
            bail!("Size range '{}' must be a single size or min-max", s);
        }
        Self::from_bounds(&bounds).ok_or_else(|| anyhow!("Empty size range"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub brand: String,
    pub model: String,
    pub size_range: Option<SizeRange>,
    pub material: Material,
    pub max_price: Option<u64>,
    pub condition: Condition,
    /// 1-based page number the search starts on.
    pub page: u32,
}

impl SearchQuery {
    pub fn new(brand: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            size_range: None,
            material: Material::Unspecified,
            max_price: None,
            condition: Condition::Unspecified,
            page: 1,
        }
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self { page, ..self.clone() }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.brand.trim(), self.model.trim())
    }
}

/// Parses `brand=Rolex,model=Submariner,size=38-41,material=steel,condition=used,max_price=5000,page=1`.
impl FromStr for SearchQuery {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut query = SearchQuery::new("", "");

        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("Expected key=value, got '{}'", pair))?;
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "brand" => query.brand = value.to_string(),
                "model" => query.model = value.to_string(),
                "size" | "sizes" => query.size_range = Some(value.parse()?),
                "material" => query.material = value.parse()?,
                "condition" => query.condition = value.parse()?,
                "max_price" | "maxprice" | "price" => {
                    let price = value
                        .parse::<u64>()
                        .with_context(|| format!("Invalid max price '{}'", value))?;
                    if price == 0 {
                        bail!("Max price must be positive");
                    }
                    query.max_price = Some(price);
                }
                "page" => {
                    query.page = value
                        .parse::<u32>()
                        .ok()
                        .filter(|p| *p > 0)
                        .with_context(|| format!("Invalid page number '{}'", value))?;
                }
                other => bail!("Unknown query field '{}'", other),
            }
        }

        if query.brand.trim().is_empty() {
            bail!("Query '{}' has no brand", s);
        }
        if query.model.trim().is_empty() {
            bail!("Query '{}' has no model", s);
        }
        Ok(query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub url: String,
    pub name: String,
    pub price: u64,
    pub image: String,
    /// Page the offer was first seen on.
    pub page: u32,
}

/// Offers unique by url, in insertion order until sorted.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    offers: Vec<Offer>,
    urls: HashSet<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Offer> {
        self.offers.iter()
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Adds the offer unless its url is already present. Returns whether it was added.
    pub fn insert(&mut self, offer: Offer) -> bool {
        if self.urls.contains(&offer.url) {
            return false;
        }
        self.urls.insert(offer.url.clone());
        self.offers.push(offer);
        true
    }

    /// Merges `other` keeping first occurrences. Returns the number of new offers.
    pub fn merge(&mut self, other: ResultSet) -> usize {
        other
            .offers
            .into_iter()
            .map(|offer| self.insert(offer))
            .filter(|added| *added)
            .count()
    }

    /// Stable sort, so equal prices keep their insertion order.
    pub fn sort_by_price(&mut self) {
        self.offers.sort_by_key(|offer| offer.price);
    }

    pub fn sorted_by_price(mut self) -> Self {
        self.sort_by_price();
        self
    }

    pub fn is_sorted_by_price(&self) -> bool {
        self.offers.windows(2).all(|pair| pair[0].price <= pair[1].price)
    }

    /// First `max_results` offers as a new set.
    pub fn truncated(&self, max_results: usize) -> ResultSet {
        self.offers.iter().take(max_results).cloned().collect()
    }

    pub fn into_vec(self) -> Vec<Offer> {
        self.offers
    }
}

impl PartialEq for ResultSet {
    fn eq(&self, other: &Self) -> bool {
        self.offers == other.offers
    }
}

impl FromIterator<Offer> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Offer>>(iter: I) -> Self {
        let mut set = ResultSet::new();
        for offer in iter {
            set.insert(offer);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Offer;
    type IntoIter = std::slice::Iter<'a, Offer>;

    fn into_iter(self) -> Self::IntoIter {
        self.offers.iter()
    }
}

// Serialized as a plain list of offers; the url index is rebuilt on load
impl Serialize for ResultSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.offers.len()))?;
        for offer in &self.offers {
            seq.serialize_element(offer)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for ResultSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let offers = Vec::<Offer>::deserialize(deserializer)?;
        Ok(offers.into_iter().collect())
    }
}
