//! Filter Arguments
//!
//! Compiles the flat key/value input of a scrape run into two things: the
//! upstream listing query, and a predicate over `ScrapedToken` applied after
//! the merge.
//!
//! Keys are routed through a fixed table:
//! - listing keys (`filter`, `offset`, `limit`, `sort`, `order_by`, `is_nsfw`)
//!   become query parameters
//! - control keys (`is_mkt_cap_usd`, `with_pool_data`) steer the run
//! - everything else becomes a condition: `min_X` → `>=`, `max_X` → `<=`,
//!   `has_X` → `IS NOT NULL`, `is_X` → boolean `==`, arrays → `IN`,
//!   anything else → `==`
//!
//! A `null` value or the `"both"` sentinel disables a filter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::condition::{ConditionError, Operator, Predicate, Value};
use super::token::{ScrapedToken, SCRAPED_TOKEN_FIELDS};

/// Raw input arguments, as supplied by the invocation harness
pub type FilterArgs = serde_json::Map<String, serde_json::Value>;

/// Value that switches a filter off
pub const BOTH_SENTINEL: &str = "both";

/// Default page request size for the listing API
pub const DEFAULT_LISTING_LIMIT: u64 = 50;

const LISTING_KEYS: &[&str] = &["filter", "offset", "limit", "sort", "order_by", "is_nsfw"];
const CONTROL_KEYS: &[&str] = &["is_mkt_cap_usd", "with_pool_data"];
const PREFIXES: &[&str] = &["min_", "max_", "has_", "is_"];

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Unknown filter field '{field}' (from argument '{key}')")]
    UnknownField { key: String, field: String },

    #[error("Boolean value expected for '{key}', got {value}")]
    InvalidBoolean { key: String, value: String },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error(transparent)]
    Condition(#[from] ConditionError),
}

/// Listing sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Parameters sent to the token listing API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingQuery {
    /// Search term; switches the listing to the search endpoint
    pub term: Option<String>,
    pub offset: u64,
    /// Total number of records requested across all pages
    pub limit: u64,
    pub sort: String,
    pub order: SortOrder,
    pub include_nsfw: bool,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            term: None,
            offset: 0,
            limit: DEFAULT_LISTING_LIMIT,
            sort: "created_timestamp".to_string(),
            order: SortOrder::Desc,
            include_nsfw: false,
        }
    }
}

impl ListingQuery {
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }
}

/// Everything a scrape run derives from its input arguments
#[derive(Debug, Clone)]
pub struct CompiledInput {
    pub query: ListingQuery,
    pub filter: Predicate<ScrapedToken>,
    /// Per-run override for pool enrichment
    pub enrich_pools: Option<bool>,
}

/// Compile the full input
pub fn compile(args: &FilterArgs) -> Result<CompiledInput, FilterError> {
    let enrich_pools = match args.get("with_pool_data") {
        Some(raw) if !is_disabled(raw) => Some(coerce_bool("with_pool_data", raw)?),
        _ => None,
    };

    Ok(CompiledInput {
        query: build_listing_query(args)?,
        filter: build_filters(args)?,
        enrich_pools,
    })
}

/// Map listing keys onto upstream query parameters
pub fn build_listing_query(args: &FilterArgs) -> Result<ListingQuery, FilterError> {
    let mut query = ListingQuery::default();

    for (key, raw) in args {
        if raw.is_null() {
            continue;
        }
        match key.as_str() {
            "filter" => {
                let term = raw.as_str().map(str::trim).unwrap_or_default();
                if !term.is_empty() {
                    query.term = Some(term.to_string());
                }
            }
            "offset" => query.offset = coerce_u64(key, raw)?,
            "limit" => query.limit = coerce_u64(key, raw)?,
            "sort" => {
                query.sort = raw
                    .as_str()
                    .ok_or_else(|| invalid(key, "expected a string"))?
                    .to_string();
            }
            "order_by" => {
                let order = raw.as_str().ok_or_else(|| invalid(key, "expected ASC or DESC"))?;
                query.order = match order.to_ascii_uppercase().as_str() {
                    "ASC" => SortOrder::Asc,
                    "DESC" => SortOrder::Desc,
                    other => return Err(invalid(key, &format!("expected ASC or DESC, got {}", other))),
                };
            }
            "is_nsfw" if !is_disabled(raw) => query.include_nsfw = coerce_bool(key, raw)?,
            _ => {}
        }
    }

    Ok(query)
}

/// Fold every filter key into one predicate, seeded with `true`
pub fn build_filters(args: &FilterArgs) -> Result<Predicate<ScrapedToken>, FilterError> {
    let market_cap_usd = match args.get("is_mkt_cap_usd") {
        Some(raw) if !is_disabled(raw) => coerce_bool("is_mkt_cap_usd", raw)?,
        _ => false,
    };

    let mut filter = Predicate::constant(true);
    for (key, raw) in args {
        if LISTING_KEYS.contains(&key.as_str()) || CONTROL_KEYS.contains(&key.as_str()) {
            continue;
        }
        if is_disabled(raw) {
            tracing::debug!("Filter '{}' disabled", key);
            continue;
        }
        filter = filter & build_condition(key, raw, market_cap_usd)?;
    }

    Ok(filter)
}

fn build_condition(
    key: &str,
    raw: &serde_json::Value,
    market_cap_usd: bool,
) -> Result<Predicate<ScrapedToken>, FilterError> {
    let field = resolve_field(key, market_cap_usd)?;

    let condition = if key.starts_with("min_") {
        Predicate::condition(field, Operator::Gte, Some(Value::from(raw)))?
    } else if key.starts_with("max_") {
        Predicate::condition(field, Operator::Lte, Some(Value::from(raw)))?
    } else if key.starts_with("has_") {
        let operator = if coerce_bool(key, raw)? {
            Operator::IsNotNull
        } else {
            Operator::IsNull
        };
        Predicate::condition(field, operator, None)?
    } else if key.starts_with("is_") {
        Predicate::condition(field, Operator::Eq, Some(Value::Bool(coerce_bool(key, raw)?)))?
    } else if raw.is_array() {
        Predicate::condition(field, Operator::In, Some(Value::from(raw)))?
    } else {
        Predicate::condition(field, Operator::Eq, Some(Value::from(raw)))?
    };

    Ok(condition)
}

/// Alias table first, then the key itself, then the key without its prefix
fn resolve_field(key: &str, market_cap_usd: bool) -> Result<String, FilterError> {
    let market_cap = if market_cap_usd { "usd_market_cap" } else { "market_cap" };

    let alias = match key {
        "is_graduated" => Some("complete"),
        "has_king_of_the_hill" => Some("king_of_the_hill_timestamp"),
        "min_mkt_cap" | "max_mkt_cap" => Some(market_cap),
        "min_created_date" | "max_created_date" => Some("created_timestamp"),
        _ => None,
    };
    if let Some(field) = alias {
        return Ok(field.to_string());
    }

    if SCRAPED_TOKEN_FIELDS.contains(key) {
        return Ok(key.to_string());
    }

    let stripped = PREFIXES
        .iter()
        .find_map(|prefix| key.strip_prefix(prefix))
        .unwrap_or(key);

    if SCRAPED_TOKEN_FIELDS.contains(stripped) {
        Ok(stripped.to_string())
    } else {
        Err(FilterError::UnknownField {
            key: key.to_string(),
            field: stripped.to_string(),
        })
    }
}

fn is_disabled(raw: &serde_json::Value) -> bool {
    match raw {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.eq_ignore_ascii_case(BOTH_SENTINEL),
        _ => false,
    }
}

/// Accepts booleans, 0/1 and the usual yes/no spellings
pub fn coerce_bool(key: &str, raw: &serde_json::Value) -> Result<bool, FilterError> {
    let parsed = match raw {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "t" | "y" | "1" => Some(true),
            "no" | "false" | "f" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };

    parsed.ok_or_else(|| FilterError::InvalidBoolean {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn coerce_u64(key: &str, raw: &serde_json::Value) -> Result<u64, FilterError> {
    match raw {
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| invalid(key, "expected a non-negative integer")),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| invalid(key, "expected a non-negative integer")),
        _ => Err(invalid(key, "expected a non-negative integer")),
    }
}

fn invalid(key: &str, reason: &str) -> FilterError {
    FilterError::InvalidParameter {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
