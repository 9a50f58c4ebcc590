//! Transpiler test modules.
//!
//! - `conditions`: WHERE compilation, nesting and operator handling
//! - `data`: INSERT/UPDATE payload compilation
//! - `dml`: complete statements

mod dml;
