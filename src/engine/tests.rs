//! Executor tests against a scripted in-process driver.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::ast::{Operator, Param, Value};
use crate::transpiler::StatementKind;

#[derive(Default)]
struct State {
    opens: usize,
    closes: usize,
    refuse_open: bool,
    alive: bool,
    executed: Vec<Statement>,
    raw: Vec<String>,
    executions: VecDeque<Result<Execution, DriverError>>,
    result_sets: VecDeque<Result<ResultSet, DriverError>>,
}

#[derive(Clone, Default)]
struct ScriptedDriver {
    state: Rc<RefCell<State>>,
}

struct ScriptedConnection {
    state: Rc<RefCell<State>>,
}

impl Driver for ScriptedDriver {
    type Connection = ScriptedConnection;

    fn open(&self, _options: &ConnectOptions) -> Result<ScriptedConnection, DriverError> {
        let mut state = self.state.borrow_mut();
        if state.refuse_open {
            return Err(DriverError::Connection("connection refused".into()));
        }
        state.opens += 1;
        state.alive = true;
        Ok(ScriptedConnection {
            state: Rc::clone(&self.state),
        })
    }
}

impl Connection for ScriptedConnection {
    fn ping(&mut self) -> bool {
        self.state.borrow().alive
    }

    fn close(self) -> Result<(), DriverError> {
        self.state.borrow_mut().closes += 1;
        Ok(())
    }

    fn execute(&mut self, statement: &Statement) -> Result<Execution, DriverError> {
        let mut state = self.state.borrow_mut();
        state.executed.push(statement.clone());
        state.executions.pop_front().unwrap_or(Ok(Execution {
            rows_affected: 1,
            last_insert_id: Some(1),
        }))
    }

    fn fetch_all(&mut self, statement: &Statement) -> Result<ResultSet, DriverError> {
        let mut state = self.state.borrow_mut();
        state.executed.push(statement.clone());
        state
            .result_sets
            .pop_front()
            .unwrap_or_else(|| Ok(ResultSet::default()))
    }

    fn execute_raw(&mut self, sql: &str) -> Result<Execution, DriverError> {
        self.state.borrow_mut().raw.push(sql.to_string());
        Ok(Execution::default())
    }
}

fn disconnected() -> (Database<ScriptedDriver>, Rc<RefCell<State>>) {
    let driver = ScriptedDriver::default();
    let state = Rc::clone(&driver.state);
    (Database::with_driver(driver), state)
}

fn connected() -> (Database<ScriptedDriver>, Rc<RefCell<State>>) {
    let (mut db, state) = disconnected();
    db.connect("localhost", "root", "", "kiwi").unwrap();
    (db, state)
}

fn login_row(login: &str) -> Row {
    Row::from([("login".to_string(), json!(login))])
}

#[test]
fn test_connect_is_idempotent() {
    let (mut db, state) = connected();
    db.connect("localhost", "root", "", "kiwi").unwrap();
    assert!(db.is_connected());
    assert_eq!(state.borrow().opens, 1);
}

#[test]
fn test_connect_rejects_bad_options() {
    let (mut db, state) = disconnected();
    let err = db.connect("", "root", "", "kiwi").unwrap_err();
    assert!(matches!(err, KiwiError::InvalidInput(_)));
    assert_eq!(state.borrow().opens, 0);
}

#[test]
fn test_connect_failure() {
    let (mut db, state) = disconnected();
    state.borrow_mut().refuse_open = true;
    let err = db.connect("localhost", "root", "", "kiwi").unwrap_err();
    assert!(matches!(err, KiwiError::ConnectionFailed(_)));
    assert!(!db.is_connected());
}

#[test]
fn test_statement_without_connection() {
    let (mut db, _state) = disconnected();
    let err = db.delete("accounts", &Condition::eq("login", "bob")).unwrap_err();
    assert!(matches!(err, KiwiError::NotConnected(_)));
}

#[test]
fn test_invalid_input_before_io() {
    let (mut db, state) = disconnected();
    let err = db
        .insert("users; DROP TABLE x", &FieldMap::new().with("a", 1))
        .unwrap_err();
    // rejected before the missing connection is even noticed
    assert!(matches!(err, KiwiError::InvalidInput(_)));

    assert_eq!(state.borrow().opens, 0);

    let (mut db, state) = connected();
    let raw_in_where = Condition::compare("login", Operator::Eq, Value::raw("NOW"));
    let err = db.select("accounts", &["login"], &raw_in_where).unwrap_err();
    assert!(matches!(err, KiwiError::InvalidInput(_)));
    assert!(state.borrow().executed.is_empty());
}

#[test]
fn test_insert_returns_row_id() {
    let (mut db, state) = connected();
    state.borrow_mut().executions.push_back(Ok(Execution {
        rows_affected: 1,
        last_insert_id: Some(42),
    }));

    let fields = FieldMap::new().with("login", "bob123").with("email", "b@x.com");
    assert_eq!(db.insert("accounts", &fields).unwrap(), Some(42));

    let state = state.borrow();
    let stmt = &state.executed[0];
    assert_eq!(stmt.kind, StatementKind::Insert);
    assert_eq!(stmt.sql, "INSERT INTO accounts (login, email) VALUES (?, ?)");
    assert_eq!(stmt.format(), "ss");
}

#[test]
fn test_duplicate_insert_is_not_an_error() {
    let (mut db, state) = connected();
    {
        let mut state = state.borrow_mut();
        state.executions.push_back(Ok(Execution {
            rows_affected: 1,
            last_insert_id: Some(7),
        }));
        state
            .executions
            .push_back(Err(DriverError::DuplicateKey("Duplicate entry 'bob'".into())));
    }

    let fields = FieldMap::new().with("login", "bob");
    assert_eq!(db.insert("accounts", &fields).unwrap(), Some(7));
    assert_eq!(db.insert("accounts", &fields).unwrap(), None);
}

#[test]
fn test_insert_zero_rows_is_none() {
    let (mut db, state) = connected();
    state.borrow_mut().executions.push_back(Ok(Execution {
        rows_affected: 0,
        last_insert_id: None,
    }));
    assert_eq!(db.insert("rooms", &FieldMap::new().with("number", "1A")).unwrap(), None);
}

#[test]
fn test_insert_without_reported_id() {
    let (mut db, state) = connected();
    state.borrow_mut().executions.push_back(Ok(Execution {
        rows_affected: 1,
        last_insert_id: None,
    }));
    let err = db.insert("rooms", &FieldMap::new().with("number", "1A")).unwrap_err();
    assert!(matches!(err, KiwiError::QueryResultInvalid(_)));
}

#[test]
fn test_insert_hard_failure() {
    let (mut db, state) = connected();
    state
        .borrow_mut()
        .executions
        .push_back(Err(DriverError::Execute("no such table".into())));
    let err = db.insert("rooms", &FieldMap::new().with("number", "1A")).unwrap_err();
    assert!(matches!(err, KiwiError::QueryExecutionFailed(_)));
}

#[test]
fn test_prepare_failure_is_build_error() {
    let (mut db, state) = connected();
    state
        .borrow_mut()
        .executions
        .push_back(Err(DriverError::Prepare("syntax".into())));
    let err = db
        .update("rooms", &FieldMap::new().with("seats", 40), &Condition::eq("room_id", 1))
        .unwrap_err();
    assert!(matches!(err, KiwiError::QueryBuildFailed(_)));
}

#[test]
fn test_update_binds_data_then_conditions() {
    let (mut db, state) = connected();
    state.borrow_mut().executions.push_back(Ok(Execution {
        rows_affected: 1,
        last_insert_id: None,
    }));

    let fields = FieldMap::new()
        .with("last_activity", Value::raw("CURRENT_TIMESTAMP"))
        .with("ip", "10.0.0.1");
    let affected = db
        .update("sessions", &fields, &Condition::eq("session_id", 5))
        .unwrap();
    assert_eq!(affected, 1);

    let state = state.borrow();
    assert_eq!(
        state.executed[0].sql,
        "UPDATE sessions SET last_activity=CURRENT_TIMESTAMP, ip=? WHERE session_id = ?"
    );
    assert_eq!(
        state.executed[0].params,
        vec![Param::Text("10.0.0.1".into()), Param::Int(5)]
    );
}

#[test]
fn test_update_matching_nothing_returns_zero() {
    let (mut db, state) = connected();
    state.borrow_mut().executions.push_back(Ok(Execution::default()));
    let affected = db
        .update(
            "accounts",
            &FieldMap::new().with("email", "new@x.com"),
            &Condition::eq("login", "nobody"),
        )
        .unwrap();
    assert_eq!(affected, 0);
}

#[test]
fn test_delete_returns_count() {
    let (mut db, state) = connected();
    state.borrow_mut().executions.push_back(Ok(Execution {
        rows_affected: 3,
        last_insert_id: None,
    }));
    assert_eq!(db.delete("sessions", &Condition::lt("expires", 100)).unwrap(), 3);
}

#[test]
fn test_select_rows() {
    let (mut db, state) = connected();
    state.borrow_mut().result_sets.push_back(Ok(ResultSet {
        columns: vec!["login".into()],
        rows: vec![login_row("bob123")],
    }));

    let rows = db
        .select("accounts", &["login"], &Condition::eq("login", "bob123"))
        .unwrap();
    assert_eq!(rows, vec![login_row("bob123")]);
    assert_eq!(
        state.borrow().executed[0].sql,
        "SELECT login FROM accounts WHERE login = ?"
    );
}

#[test]
fn test_select_shape_mismatch() {
    let (mut db, state) = connected();
    state.borrow_mut().result_sets.push_back(Ok(ResultSet {
        columns: vec!["login".into(), "email".into()],
        rows: vec![Row::from([
            ("login".to_string(), json!("bob")),
            ("email".to_string(), json!("b@x.com")),
        ])],
    }));
    let err = db
        .select("accounts", &["login"], &Condition::none())
        .unwrap_err();
    assert!(matches!(err, KiwiError::QueryResultInvalid(_)));
}

#[test]
fn test_select_empty_result_skips_shape_check() {
    let (mut db, _state) = connected();
    let rows = db
        .select("accounts", &["login", "email"], &Condition::eq("login", "ghost"))
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_select_one() {
    let (mut db, state) = connected();
    state.borrow_mut().result_sets.push_back(Ok(ResultSet {
        columns: vec!["login".into()],
        rows: vec![login_row("first")],
    }));

    let row = db
        .select_one("accounts", &["login"], &Condition::none())
        .unwrap();
    assert_eq!(row, Some(login_row("first")));
    assert!(state.borrow().executed[0].sql.ends_with(" LIMIT 1"));

    assert_eq!(
        db.select_one("accounts", &["login"], &Condition::none()).unwrap(),
        None
    );
}

#[test]
fn test_stale_connection_reconnects() {
    let (mut db, state) = connected();
    state.borrow_mut().alive = false;

    db.delete("sessions", &Condition::eq("session_id", 1)).unwrap();

    let state = state.borrow();
    assert_eq!(state.opens, 2);
    assert_eq!(state.closes, 1);
    assert_eq!(state.executed.len(), 1);
}

#[test]
fn test_failed_reconnect_is_not_connected() {
    let (mut db, state) = connected();
    {
        let mut state = state.borrow_mut();
        state.alive = false;
        state.refuse_open = true;
    }
    let err = db.delete("sessions", &Condition::eq("session_id", 1)).unwrap_err();
    assert!(matches!(err, KiwiError::NotConnected(_)));
}

#[test]
fn test_is_connected_discards_dead_handle() {
    let (mut db, state) = connected();
    state.borrow_mut().alive = false;
    assert!(!db.is_connected());
    assert_eq!(state.borrow().closes, 1);
    // handle is gone; a second probe does not close again
    assert!(!db.is_connected());
    assert_eq!(state.borrow().closes, 1);
}

#[test]
fn test_disconnect_is_idempotent_and_runs_on_drop() {
    let (mut db, state) = connected();
    db.disconnect().unwrap();
    db.disconnect().unwrap();
    assert_eq!(state.borrow().closes, 1);

    let (db, state) = connected();
    drop(db);
    assert_eq!(state.borrow().closes, 1);
}

#[test]
fn test_statement_after_disconnect() {
    let (mut db, state) = connected();
    db.disconnect().unwrap();

    let err = db.delete("sessions", &Condition::eq("session_id", 1)).unwrap_err();
    assert!(matches!(err, KiwiError::NotConnected(_)));
    assert!(matches!(db.execute_raw("SELECT 1"), Err(KiwiError::NotConnected(_))));
    {
        let state = state.borrow();
        assert_eq!(state.opens, 1);
        assert!(state.executed.is_empty());
    }

    // an explicit connect brings it back
    db.connect("localhost", "root", "", "kiwi").unwrap();
    assert_eq!(db.delete("sessions", &Condition::eq("session_id", 1)).unwrap(), 1);
    assert_eq!(state.borrow().opens, 2);
}

#[test]
fn test_execute_raw() {
    let (mut db, state) = connected();
    db.execute_raw("CREATE TABLE t (id INTEGER)").unwrap();
    assert_eq!(state.borrow().raw, vec!["CREATE TABLE t (id INTEGER)"]);
}

#[test]
fn test_verify_bindings() {
    let good = Statement {
        kind: StatementKind::Select,
        sql: "SELECT a FROM t WHERE a = ?".into(),
        params: vec![Param::Int(1)],
    };
    assert!(verify_bindings(&good).is_ok());

    let bad = Statement {
        params: Vec::new(),
        ..good
    };
    let err = verify_bindings(&bad).unwrap_err();
    assert!(matches!(err, KiwiError::QueryBuildFailed(_)));
}
