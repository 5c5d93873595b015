//! Condition Engine
//!
//! Builds boolean predicates over records with dynamically-named fields and
//! typed comparison operators, evaluates them, and renders them as
//! parameterized query fragments.
//!
//! # Example
//!
//! ```rust,ignore
//! use pump_scraper::domain::condition::{Operator, Predicate, Value};
//!
//! let filter = Predicate::condition("usd_market_cap", Operator::Gte, Some(Value::Float(50_000.0)))?
//!     & Predicate::condition("complete", Operator::Eq, Some(Value::Bool(true)))?;
//!
//! let kept = filter.filter(tokens)?;
//! let fragment = filter.render_query()?;
//! assert_eq!(fragment.template, "(usd_market_cap >= ?) AND (complete = ?)");
//! ```

mod operator;
mod predicate;
mod record;
mod value;

pub use operator::{Conjunction, Operator};
pub use predicate::{AccessorFn, Condition, ConditionError, FieldRef, Predicate, QueryFragment};
pub use record::{FieldAccessor, FieldTable, Record};
pub use value::Value;
