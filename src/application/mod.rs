pub mod merger;
pub mod scraper;

pub use merger::{
    MergeError, MergerConfig, ResultMerger, DEFAULT_MAX_CONCURRENT_LOOKUPS, DEFAULT_PAGE_SIZE,
};
pub use scraper::{explain, publish, PumpScraper, ScrapeError};
