//! SQL compilation for field maps and condition trees.
//!
//! Everything here is pure: input trees in, SQL text plus an ordered
//! parameter list out. Identifiers are checked before they are
//! concatenated; values only ever travel as bound parameters.

pub mod conditions;
pub mod data;
pub mod dml;

#[cfg(test)]
mod tests;

use crate::ast::Param;
use crate::ast::values::format_of;

pub use conditions::compile_conditions;
pub use data::{InsertData, compile_insert_data, compile_update_data};
pub use dml::{delete_sql, insert_sql, select_one_sql, select_sql, update_sql};

/// A compiled piece of SQL (a WHERE body or a SET list) with its parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Fragment {
    /// Bind format string, one code per parameter.
    pub fn format(&self) -> String {
        format_of(&self.params)
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Statement category, decides how the executor treats the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    Select,
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementKind::Insert => write!(f, "INSERT"),
            StatementKind::Update => write!(f, "UPDATE"),
            StatementKind::Delete => write!(f, "DELETE"),
            StatementKind::Select => write!(f, "SELECT"),
        }
    }
}

/// A complete statement ready to be prepared and bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: String,
    pub params: Vec<Param>,
}

impl Statement {
    pub fn format(&self) -> String {
        format_of(&self.params)
    }

    /// Number of `?` placeholders in the SQL text.
    ///
    /// Exact because identifiers and raw literals are word characters only.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql)
    }
}
