pub mod collector;
pub mod debug;
pub mod detail;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod filter;
pub mod gallery;
pub mod models;
pub mod normalize;
pub mod output;
pub mod query;
pub mod structured_data;
pub mod tui;

pub use collector::{CollectOptions, Collector};
pub use error::{CollectError, ScrapeError};
pub use models::{Condition, Material, Offer, ResultSet, SearchQuery, SizeRange};
