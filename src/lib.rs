//! # Kiwi: injection-safe queries
//!
//! > **Structured data in, bound parameters out.**
//!
//! Kiwi turns field maps and nested AND/OR condition trees into
//! parameterized INSERT, UPDATE, DELETE and SELECT statements and runs
//! them on a single owned connection. Identifiers are whitelisted before
//! they touch SQL text; values only ever travel as bound parameters.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use kiwi::prelude::*;
//!
//! let mut db = Database::new()?;
//! db.connect("localhost", "root", "secret", "kiwi")?;
//!
//! let id = db.insert("accounts", &FieldMap::new().with("login", "bob123"))?;
//! let rows = db.select("accounts", &["login"], &Condition::eq("login", "bob123"))?;
//! ```
//!
//! ## Operators
//!
//! | Token | SQL        |
//! |-------|------------|
//! | `=`   | `=`        |
//! | `!=`  | `!=`       |
//! | `<>`  | `<>`       |
//! | `<` `>` `<=` `>=` | as written |
//! | `%`   | `LIKE`     |
//! | `!%`  | `NOT LIKE` |

pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod parser;
pub mod transpiler;
pub mod validator;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::Config;
    pub use crate::engine::{ConnectOptions, Database, Row};
    pub use crate::error::*;
    pub use crate::parser::{parse_conditions, parse_fields};
    pub use crate::transpiler::{
        compile_conditions, compile_insert_data, compile_update_data, delete_sql, insert_sql,
        select_one_sql, select_sql, update_sql,
    };
}

/// Compile a textual condition expression to its WHERE fragment.
///
/// # Example
///
/// ```
/// let fragment = kiwi::compile("login = 'bob123' & banned IS NULL").unwrap();
/// assert_eq!(fragment.sql, "login = ? AND banned IS NULL");
/// assert_eq!(fragment.format(), "s");
/// ```
pub fn compile(expression: &str) -> Result<transpiler::Fragment, error::KiwiError> {
    let condition = parser::parse_conditions(expression)?;
    transpiler::compile_conditions(&condition)
}
