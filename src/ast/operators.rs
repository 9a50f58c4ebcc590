use serde::{Deserialize, Serialize};

use crate::error::{KiwiError, KiwiResult};

/// Comparison operator of a condition.
///
/// Only these operators can ever reach the SQL text; caller-supplied
/// tokens go through [`Operator::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Operator {
    /// `=`
    #[default]
    Eq,
    /// `!=`
    Ne,
    /// `<>`
    LtGt,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
    /// `%` → `LIKE`
    Like,
    /// `!%` → `NOT LIKE`
    NotLike,
}

impl Operator {
    /// Parse a caller-supplied operator token against the allow-list.
    ///
    /// A single blank is accepted as the default `=`.
    pub fn parse(token: &str) -> KiwiResult<Self> {
        match token {
            " " | "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<>" => Ok(Operator::LtGt),
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            ">=" => Ok(Operator::Gte),
            "<=" => Ok(Operator::Lte),
            "%" => Ok(Operator::Like),
            "!%" => Ok(Operator::NotLike),
            other => Err(KiwiError::invalid(format!("operator '{}' is not allowed", other))),
        }
    }

    /// SQL text of the operator.
    pub fn sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::LtGt => "<>",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
        }
    }

    /// Short token accepted by [`Operator::parse`].
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Like => "%",
            Operator::NotLike => "!%",
            other => other.sql(),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql())
    }
}
