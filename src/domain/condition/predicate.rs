//! Predicate Trees
//!
//! Composable boolean tests over records: constant leaves, comparison
//! conditions on a named (or computed) field, and AND/OR groups. The same
//! tree can be evaluated against records or rendered as a parameterized
//! query fragment.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::operator::{Conjunction, Operator};
use super::record::Record;
use super::value::Value;

/// Errors raised while building, evaluating or rendering predicates
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConditionError {
    #[error("Invalid condition on '{field}' ({operator}): {reason}")]
    InvalidCondition {
        field: String,
        operator: Operator,
        reason: String,
    },

    #[error("Unknown field: {0}")]
    FieldResolution(String),

    #[error("Type mismatch on '{field}': cannot compare {found} {operator} {operand}")]
    TypeMismatch {
        field: String,
        operator: Operator,
        found: &'static str,
        operand: &'static str,
    },

    #[error("Field accessor has no name and cannot be rendered as a query")]
    UnsupportedField,
}

/// Computed accessor over a record
pub type AccessorFn<R> = dyn Fn(&R) -> Value + Send + Sync;

/// How a condition reaches its field value
pub enum FieldRef<R> {
    /// Resolved by name through `Record::field`
    Name(String),
    /// Computed directly from the record
    Accessor(Arc<AccessorFn<R>>),
}

impl<R> FieldRef<R> {
    pub fn name(name: impl Into<String>) -> Self {
        FieldRef::Name(name.into())
    }

    pub fn accessor<F>(f: F) -> Self
    where
        F: Fn(&R) -> Value + Send + Sync + 'static,
    {
        FieldRef::Accessor(Arc::new(f))
    }

    /// Label used in errors and display output
    pub fn label(&self) -> &str {
        match self {
            FieldRef::Name(name) => name,
            FieldRef::Accessor(_) => "<accessor>",
        }
    }
}

impl<R> Clone for FieldRef<R> {
    fn clone(&self) -> Self {
        match self {
            FieldRef::Name(name) => FieldRef::Name(name.clone()),
            FieldRef::Accessor(f) => FieldRef::Accessor(Arc::clone(f)),
        }
    }
}

impl<R> fmt::Debug for FieldRef<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Name(name) => f.debug_tuple("Name").field(name).finish(),
            FieldRef::Accessor(_) => f.write_str("Accessor(..)"),
        }
    }
}

impl<R> From<&str> for FieldRef<R> {
    fn from(name: &str) -> Self {
        FieldRef::name(name)
    }
}

impl<R> From<String> for FieldRef<R> {
    fn from(name: String) -> Self {
        FieldRef::Name(name)
    }
}

/// Leaf comparison: field, operator and operand
#[derive(Debug)]
pub struct Condition<R> {
    field: FieldRef<R>,
    operator: Operator,
    /// `Value::Null` for value-free operators
    operand: Value,
}

impl<R> Clone for Condition<R> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            operator: self.operator,
            operand: self.operand.clone(),
        }
    }
}

impl<R> Condition<R> {
    /// Validate operand arity against the operator
    pub fn new(
        field: FieldRef<R>,
        operator: Operator,
        operand: Option<Value>,
    ) -> Result<Self, ConditionError> {
        let operand = operand.unwrap_or(Value::Null);

        if operator.requires_value() && operand.is_null() {
            return Err(ConditionError::InvalidCondition {
                field: field.label().to_string(),
                operator,
                reason: "operator requires a value".into(),
            });
        }

        if !operator.requires_value() && !operand.is_null() {
            return Err(ConditionError::InvalidCondition {
                field: field.label().to_string(),
                operator,
                reason: format!("operator takes no value, got {}", operand),
            });
        }

        Ok(Self { field, operator, operand })
    }

    pub fn field(&self) -> &FieldRef<R> {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operand(&self) -> &Value {
        &self.operand
    }

    fn resolve(&self, record: &R) -> Result<Value, ConditionError>
    where
        R: Record,
    {
        match &self.field {
            FieldRef::Name(name) => record
                .field(name)
                .ok_or_else(|| ConditionError::FieldResolution(name.clone())),
            FieldRef::Accessor(f) => Ok(f(record)),
        }
    }

    pub fn evaluate(&self, record: &R) -> Result<bool, ConditionError>
    where
        R: Record,
    {
        let value = self.resolve(record)?;
        let operand = &self.operand;

        match self.operator {
            Operator::Eq => Ok(value == *operand),
            Operator::Neq => Ok(value != *operand),
            Operator::Gt | Operator::Lt | Operator::Gte | Operator::Lte => {
                let ordering = value.compare(operand).ok_or_else(|| ConditionError::TypeMismatch {
                    field: self.field.label().to_string(),
                    operator: self.operator,
                    found: value.type_name(),
                    operand: operand.type_name(),
                })?;
                Ok(match self.operator {
                    Operator::Gt => ordering == Ordering::Greater,
                    Operator::Lt => ordering == Ordering::Less,
                    Operator::Gte => ordering != Ordering::Less,
                    _ => ordering != Ordering::Greater,
                })
            }
            // Scalar operands contain nothing, so the value is never a member
            Operator::In => Ok(operand.contains(&value)),
            Operator::NotIn => Ok(!operand.contains(&value)),
            Operator::IsNull => Ok(value.is_null()),
            Operator::IsNotNull => Ok(!value.is_null()),
        }
    }

    pub fn render_query(&self) -> Result<QueryFragment, ConditionError> {
        let name = match &self.field {
            FieldRef::Name(name) => name,
            FieldRef::Accessor(_) => return Err(ConditionError::UnsupportedField),
        };
        let token = self.operator.query_token();

        if !self.operator.requires_value() {
            return Ok(QueryFragment::new(format!("{} {}", name, token), Vec::new()));
        }

        if matches!(self.operator, Operator::In | Operator::NotIn) {
            // A scalar or empty operand has no members, same as `evaluate`
            return Ok(match self.operand.elements() {
                Some(items) if !items.is_empty() => {
                    let placeholders = vec!["?"; items.len()].join(", ");
                    QueryFragment::new(
                        format!("{} {} ({})", name, token, placeholders),
                        items.to_vec(),
                    )
                }
                _ => QueryFragment::constant(self.operator == Operator::NotIn),
            });
        }

        Ok(QueryFragment::new(
            format!("{} {} ?", name, token),
            vec![self.operand.clone()],
        ))
    }
}

/// Parameterized query fragment with positional bindings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFragment {
    pub template: String,
    pub bindings: Vec<Value>,
}

impl QueryFragment {
    pub fn new(template: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            template: template.into(),
            bindings,
        }
    }

    /// Always-true / always-false fragment
    pub fn constant(is_true: bool) -> Self {
        Self::new(if is_true { "1=1" } else { "1=0" }, Vec::new())
    }
}

/// Composable boolean test over records of type `R`
#[derive(Debug)]
pub enum Predicate<R> {
    Constant(bool),
    Condition(Condition<R>),
    Group {
        left: Box<Predicate<R>>,
        conjunction: Conjunction,
        right: Option<Box<Predicate<R>>>,
    },
}

impl<R> Clone for Predicate<R> {
    fn clone(&self) -> Self {
        match self {
            Predicate::Constant(b) => Predicate::Constant(*b),
            Predicate::Condition(c) => Predicate::Condition(c.clone()),
            Predicate::Group { left, conjunction, right } => Predicate::Group {
                left: left.clone(),
                conjunction: *conjunction,
                right: right.clone(),
            },
        }
    }
}

impl<R> Predicate<R> {
    pub fn constant(is_true: bool) -> Self {
        Predicate::Constant(is_true)
    }

    pub fn condition(
        field: impl Into<FieldRef<R>>,
        operator: Operator,
        operand: Option<Value>,
    ) -> Result<Self, ConditionError> {
        Condition::new(field.into(), operator, operand).map(Predicate::Condition)
    }

    pub fn group(left: Self, conjunction: Conjunction, right: Option<Self>) -> Self {
        Predicate::Group {
            left: Box::new(left),
            conjunction,
            right: right.map(Box::new),
        }
    }

    pub fn and(left: Self, right: Self) -> Self {
        Self::group(left, Conjunction::And, Some(right))
    }

    pub fn or(left: Self, right: Self) -> Self {
        Self::group(left, Conjunction::Or, Some(right))
    }

    /// Number of leaf conditions in the tree (constants excluded)
    pub fn condition_count(&self) -> usize {
        match self {
            Predicate::Constant(_) => 0,
            Predicate::Condition(_) => 1,
            Predicate::Group { left, right, .. } => {
                left.condition_count() + right.as_ref().map_or(0, |r| r.condition_count())
            }
        }
    }

    pub fn evaluate(&self, record: &R) -> Result<bool, ConditionError>
    where
        R: Record,
    {
        match self {
            Predicate::Constant(is_true) => Ok(*is_true),
            Predicate::Condition(condition) => condition.evaluate(record),
            Predicate::Group { left, conjunction, right } => {
                let left = left.evaluate(record)?;
                let right = match right {
                    Some(right) => right.evaluate(record)?,
                    None => conjunction.identity(),
                };
                Ok(match conjunction {
                    Conjunction::And => left && right,
                    Conjunction::Or => left || right,
                })
            }
        }
    }

    /// Keep the records this predicate accepts, stopping at the first error
    pub fn filter<I>(&self, records: I) -> Result<Vec<R>, ConditionError>
    where
        R: Record,
        I: IntoIterator<Item = R>,
    {
        let mut kept = Vec::new();
        for record in records {
            if self.evaluate(&record)? {
                kept.push(record);
            }
        }
        Ok(kept)
    }

    pub fn render_query(&self) -> Result<QueryFragment, ConditionError> {
        match self {
            Predicate::Constant(is_true) => Ok(QueryFragment::constant(*is_true)),
            Predicate::Condition(condition) => condition.render_query(),
            Predicate::Group { left, conjunction, right } => {
                let left = left.render_query()?;
                let right = match right {
                    Some(right) => right.render_query()?,
                    None => QueryFragment::constant(conjunction.identity()),
                };
                let mut bindings = left.bindings;
                bindings.extend(right.bindings);
                Ok(QueryFragment::new(
                    format!("({}) {} ({})", left.template, conjunction, right.template),
                    bindings,
                ))
            }
        }
    }
}

impl<R> fmt::Display for Predicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Constant(is_true) => write!(f, "{}", is_true),
            Predicate::Condition(c) if c.operator.requires_value() => {
                write!(f, "{} {} {}", c.field.label(), c.operator, c.operand)
            }
            Predicate::Condition(c) => write!(f, "{} {}", c.field.label(), c.operator),
            Predicate::Group { left, conjunction, right: Some(right) } => {
                write!(f, "({}) {} ({})", left, conjunction, right)
            }
            Predicate::Group { left, .. } => write!(f, "{}", left),
        }
    }
}

impl<R> BitAnd for Predicate<R> {
    type Output = Predicate<R>;

    fn bitand(self, rhs: Self) -> Self::Output {
        Predicate::and(self, rhs)
    }
}

impl<R> BitOr for Predicate<R> {
    type Output = Predicate<R>;

    fn bitor(self, rhs: Self) -> Self::Output {
        Predicate::or(self, rhs)
    }
}
