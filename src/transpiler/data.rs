use std::collections::HashSet;

use crate::ast::{FieldMap, Param, Value};
use crate::ast::values::format_of;
use crate::error::{KiwiError, KiwiResult};
use crate::transpiler::Fragment;
use crate::validator::{ensure_identifier, is_identifier_safe};

/// Compiled INSERT payload: `col1, col2` and `?, ?`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertData {
    pub columns: String,
    pub placeholders: String,
    pub params: Vec<Param>,
}

impl InsertData {
    pub fn format(&self) -> String {
        format_of(&self.params)
    }
}

/// Compile fields for `INSERT INTO t (columns) VALUES (placeholders)`.
pub fn compile_insert_data(fields: &FieldMap) -> KiwiResult<InsertData> {
    validate_fields(fields)?;

    let mut columns = Vec::with_capacity(fields.len());
    let mut placeholders = Vec::with_capacity(fields.len());
    let mut params = Vec::with_capacity(fields.len());

    for (column, value) in fields.iter() {
        columns.push(column);
        match value {
            Value::Raw(sql) => placeholders.push(sql.as_str()),
            other => {
                placeholders.push("?");
                params.extend(other.to_param());
            }
        }
    }

    Ok(InsertData {
        columns: columns.join(", "),
        placeholders: placeholders.join(", "),
        params,
    })
}

/// Compile fields for `UPDATE t SET col1=?, col2=?`.
pub fn compile_update_data(fields: &FieldMap) -> KiwiResult<Fragment> {
    validate_fields(fields)?;

    let mut assignments = Vec::with_capacity(fields.len());
    let mut params = Vec::with_capacity(fields.len());

    for (column, value) in fields.iter() {
        match value {
            Value::Raw(sql) => assignments.push(format!("{}={}", column, sql)),
            other => {
                assignments.push(format!("{}=?", column));
                params.extend(other.to_param());
            }
        }
    }

    Ok(Fragment {
        sql: assignments.join(", "),
        params,
    })
}

fn validate_fields(fields: &FieldMap) -> KiwiResult<()> {
    if fields.is_empty() {
        return Err(KiwiError::invalid("field map is empty"));
    }

    let mut seen = HashSet::with_capacity(fields.len());
    for (column, value) in fields.iter() {
        ensure_identifier("column", column)?;
        if !seen.insert(column) {
            return Err(KiwiError::invalid(format!("duplicate column '{}'", column)));
        }
        if let Value::Raw(sql) = value {
            if !is_identifier_safe(sql) {
                return Err(KiwiError::invalid(format!(
                    "raw SQL '{}' for column '{}' is not a bare keyword",
                    sql, column
                )));
            }
        }
    }
    Ok(())
}
