use serde::{Deserialize, Serialize};

use crate::ast::{Operator, Value};
use crate::error::{KiwiError, KiwiResult};

/// A WHERE clause before compilation.
///
/// Precedence is explicit: `And` and `Or` nodes nest to any depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// `column OP ?`
    Compare {
        column: String,
        op: Operator,
        value: Value,
    },
    /// `column IS NULL`
    IsNull(String),
    /// Every child must hold
    And(Vec<Condition>),
    /// At least one child must hold
    Or(Vec<Condition>),
}

impl Default for Condition {
    fn default() -> Self {
        Condition::none()
    }
}

impl Condition {
    /// The empty condition, compiles to an empty fragment.
    pub fn none() -> Self {
        Condition::And(Vec::new())
    }

    pub fn compare(column: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Condition::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Ne, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Gt, value)
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Gte, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Lt, value)
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Lte, value)
    }

    /// `column LIKE pattern`
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::compare(column, Operator::Like, Value::Text(pattern.into()))
    }

    /// `column NOT LIKE pattern`
    pub fn not_like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::compare(column, Operator::NotLike, Value::Text(pattern.into()))
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Condition::IsNull(column.into())
    }

    pub fn and(children: impl IntoIterator<Item = Condition>) -> Self {
        Condition::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Or(children.into_iter().collect())
    }

    /// Conjoin another condition, flattening into an existing `And`.
    pub fn and_also(self, other: Condition) -> Self {
        match self {
            Condition::And(mut children) => {
                children.push(other);
                Condition::And(children)
            }
            first => Condition::And(vec![first, other]),
        }
    }

    /// True when the tree holds no comparison at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Compare { .. } | Condition::IsNull(_) => false,
            Condition::And(children) | Condition::Or(children) => {
                children.iter().all(Condition::is_empty)
            }
        }
    }

    /// Build a tree from the nested map/list shape.
    ///
    /// An object is an AND of its entries, an array is an OR of nested
    /// trees. Entry values are a scalar (compared with `=`), `null`
    /// (`IS NULL`) or `[operator, value]`.
    ///
    /// ```
    /// use kiwi::ast::Condition;
    /// use serde_json::json;
    ///
    /// let cond = Condition::from_json(&json!([
    ///     {"a": ["<=", 10], "b": ["!%", "aaaa"]},
    ///     {"c": null},
    /// ])).unwrap();
    /// assert!(matches!(cond, Condition::Or(ref groups) if groups.len() == 2));
    /// ```
    pub fn from_json(json: &serde_json::Value) -> KiwiResult<Self> {
        match json {
            serde_json::Value::Object(entries) => entries
                .iter()
                .map(|(column, entry)| Self::entry_from_json(column, entry))
                .collect::<KiwiResult<Vec<_>>>()
                .map(Condition::And),
            serde_json::Value::Array(groups) => groups
                .iter()
                .map(|group| match group {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        Self::from_json(group)
                    }
                    other => Err(KiwiError::invalid(format!(
                        "condition group must be an object or array, got {}",
                        other
                    ))),
                })
                .collect::<KiwiResult<Vec<_>>>()
                .map(Condition::Or),
            other => Err(KiwiError::invalid(format!(
                "conditions must be an object or array, got {}",
                other
            ))),
        }
    }

    fn entry_from_json(column: &str, entry: &serde_json::Value) -> KiwiResult<Self> {
        match entry {
            serde_json::Value::Null => Ok(Condition::is_null(column)),
            serde_json::Value::Array(pair) if pair.len() == 2 => {
                let op = match &pair[0] {
                    serde_json::Value::String(token) => Operator::parse(token)?,
                    other => {
                        return Err(KiwiError::invalid(format!(
                            "operator for '{}' must be a string, got {}",
                            column, other
                        )));
                    }
                };
                if pair[1].is_null() {
                    return Ok(Condition::is_null(column));
                }
                Ok(Condition::compare(column, op, Value::from_json(&pair[1])?))
            }
            scalar => Ok(Condition::eq(column, Value::from_json(scalar)?)),
        }
    }
}
