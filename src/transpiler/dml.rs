//! Full statements for the four DML operations.

use crate::ast::{Condition, FieldMap};
use crate::error::{KiwiError, KiwiResult};
use crate::transpiler::{
    Statement, StatementKind, compile_conditions, compile_insert_data, compile_update_data,
};
use crate::validator::{ensure_columns, ensure_identifier};

/// `INSERT INTO table (cols) VALUES (placeholders)`
pub fn insert_sql(table: &str, fields: &FieldMap) -> KiwiResult<Statement> {
    ensure_identifier("table", table)?;
    let data = compile_insert_data(fields)?;

    Ok(Statement {
        kind: StatementKind::Insert,
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table, data.columns, data.placeholders
        ),
        params: data.params,
    })
}

/// `UPDATE table SET assignments WHERE conditions`
///
/// Parameters are the field values followed by the condition values.
pub fn update_sql(table: &str, fields: &FieldMap, conditions: &Condition) -> KiwiResult<Statement> {
    ensure_identifier("table", table)?;
    let data = compile_update_data(fields)?;
    let filter = compile_conditions(conditions)?;
    if filter.is_empty() {
        return Err(KiwiError::invalid("UPDATE requires at least one condition"));
    }

    let mut params = data.params;
    params.extend(filter.params);

    Ok(Statement {
        kind: StatementKind::Update,
        sql: format!("UPDATE {} SET {} WHERE {}", table, data.sql, filter.sql),
        params,
    })
}

/// `DELETE FROM table WHERE conditions`
pub fn delete_sql(table: &str, conditions: &Condition) -> KiwiResult<Statement> {
    ensure_identifier("table", table)?;
    let filter = compile_conditions(conditions)?;
    if filter.is_empty() {
        return Err(KiwiError::invalid("DELETE requires at least one condition"));
    }

    Ok(Statement {
        kind: StatementKind::Delete,
        sql: format!("DELETE FROM {} WHERE {}", table, filter.sql),
        params: filter.params,
    })
}

/// `SELECT cols FROM table [WHERE conditions]`
///
/// An empty condition tree selects every row.
pub fn select_sql<S: AsRef<str>>(
    table: &str,
    columns: &[S],
    conditions: &Condition,
) -> KiwiResult<Statement> {
    ensure_identifier("table", table)?;
    ensure_columns(columns)?;
    let filter = compile_conditions(conditions)?;

    let cols: Vec<&str> = columns.iter().map(AsRef::as_ref).collect();
    let mut sql = format!("SELECT {} FROM {}", cols.join(", "), table);
    if !filter.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&filter.sql);
    }

    Ok(Statement {
        kind: StatementKind::Select,
        sql,
        params: filter.params,
    })
}

/// [`select_sql`] limited to a single record.
pub fn select_one_sql<S: AsRef<str>>(
    table: &str,
    columns: &[S],
    conditions: &Condition,
) -> KiwiResult<Statement> {
    let mut stmt = select_sql(table, columns, conditions)?;
    stmt.sql.push_str(" LIMIT 1");
    Ok(stmt)
}
