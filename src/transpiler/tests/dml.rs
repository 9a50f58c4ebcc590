//! Statement builder tests (INSERT, UPDATE, DELETE, SELECT).

use pretty_assertions::assert_eq;

use crate::ast::{Condition, FieldMap, Param, Value};
use crate::error::KiwiError;
use crate::transpiler::{
    StatementKind, delete_sql, insert_sql, select_one_sql, select_sql, update_sql,
};

#[test]
fn test_insert() {
    let fields = FieldMap::new().with("login", "bob123").with("email", "b@x.com");
    let stmt = insert_sql("accounts", &fields).unwrap();

    assert_eq!(stmt.kind, StatementKind::Insert);
    assert_eq!(stmt.sql, "INSERT INTO accounts (login, email) VALUES (?, ?)");
    assert_eq!(stmt.format(), "ss");
    assert_eq!(stmt.placeholder_count(), 2);
}

#[test]
fn test_update_binds_data_before_conditions() {
    let fields = FieldMap::new()
        .with("email", "new@x.com")
        .with("last_activity", Value::raw("CURRENT_TIMESTAMP"));
    let cond = Condition::and([Condition::eq("account_id", 9), Condition::is_null("banned")]);
    let stmt = update_sql("accounts", &fields, &cond).unwrap();

    assert_eq!(
        stmt.sql,
        "UPDATE accounts SET email=?, last_activity=CURRENT_TIMESTAMP WHERE account_id = ? AND banned IS NULL"
    );
    assert_eq!(
        stmt.params,
        vec![Param::Text("new@x.com".into()), Param::Int(9)]
    );
    assert_eq!(stmt.format(), "si");
}

#[test]
fn test_update_requires_conditions() {
    let fields = FieldMap::new().with("email", "x");
    let err = update_sql("accounts", &fields, &Condition::none()).unwrap_err();
    assert!(matches!(err, KiwiError::InvalidInput(_)));
}

#[test]
fn test_delete() {
    let stmt = delete_sql("sessions", &Condition::eq("session_id", 4)).unwrap();
    assert_eq!(stmt.kind, StatementKind::Delete);
    assert_eq!(stmt.sql, "DELETE FROM sessions WHERE session_id = ?");
    assert_eq!(stmt.format(), "i");
}

#[test]
fn test_delete_requires_conditions() {
    let err = delete_sql("sessions", &Condition::or([])).unwrap_err();
    assert!(matches!(err, KiwiError::InvalidInput(_)));
}

#[test]
fn test_select() {
    let stmt = select_sql(
        "accounts",
        &["account_id", "login"],
        &Condition::eq("login", "bob123"),
    )
    .unwrap();
    assert_eq!(stmt.kind, StatementKind::Select);
    assert_eq!(
        stmt.sql,
        "SELECT account_id, login FROM accounts WHERE login = ?"
    );
    assert_eq!(stmt.format(), "s");
}

#[test]
fn test_select_without_conditions() {
    let stmt = select_sql("languages", &["name"], &Condition::none()).unwrap();
    assert_eq!(stmt.sql, "SELECT name FROM languages");
    assert!(stmt.params.is_empty());
}

#[test]
fn test_select_one() {
    let cols = vec!["session_id".to_string()];
    let stmt = select_one_sql("sessions", &cols, &Condition::eq("account_id", 1)).unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT session_id FROM sessions WHERE account_id = ? LIMIT 1"
    );
}

#[test]
fn test_select_columns_validated() {
    let err = select_sql("accounts", &["login", "password FROM x --"], &Condition::none())
        .unwrap_err();
    assert!(matches!(err, KiwiError::InvalidInput(_)));

    let empty: [&str; 0] = [];
    let err = select_sql("accounts", &empty, &Condition::none()).unwrap_err();
    assert!(matches!(err, KiwiError::InvalidInput(_)));
}

#[test]
fn test_unsafe_table_rejected_everywhere() {
    let table = "users; DROP TABLE x";
    let fields = FieldMap::new().with("a", 1);
    let cond = Condition::eq("a", 1);

    for err in [
        insert_sql(table, &fields).unwrap_err(),
        update_sql(table, &fields, &cond).unwrap_err(),
        delete_sql(table, &cond).unwrap_err(),
        select_sql(table, &["a"], &cond).unwrap_err(),
    ] {
        assert!(matches!(err, KiwiError::InvalidInput(_)));
        assert!(err.to_string().contains("unsafe table name"));
    }
}

#[test]
fn test_values_never_reach_sql_text() {
    let hostile = "'; DROP TABLE accounts; --";
    let fields = FieldMap::new().with("login", hostile);
    let cond = Condition::eq("login", hostile);

    for stmt in [
        insert_sql("accounts", &fields).unwrap(),
        update_sql("accounts", &fields, &cond).unwrap(),
        delete_sql("accounts", &cond).unwrap(),
        select_sql("accounts", &["login"], &cond).unwrap(),
    ] {
        assert!(!stmt.sql.contains("DROP"));
        assert_eq!(stmt.placeholder_count(), stmt.params.len());
    }
}
