//! Domain Layer - Core types and logic for the pump.fun scraper
//!
//! Pure types with no I/O. External interactions happen through the ports layer.
//!
//! - `condition`: predicate engine over dynamically-named record fields
//! - `token`: pump.fun listings, pool pricing and the merged scrape record
//! - `filters`: compiles run arguments into a listing query and a predicate

pub mod condition;
pub mod filters;
pub mod token;

pub use condition::{Conjunction, ConditionError, Operator, Predicate, QueryFragment, Record, Value};
pub use filters::{
    build_filters, build_listing_query, compile, CompiledInput, FilterArgs, FilterError,
    ListingQuery, SortOrder,
};
pub use token::{PumpToken, ScrapedToken, TokenPool, SCRAPED_TOKEN_FIELDS};
