//! Execution contract and transaction lifecycle against a recording driver.

mod common;

use common::{mock_connection, row, Event};
use querykit::{Cursor, DbError, ParamType, Record, UpsertOutcome, Value};

#[test]
fn begin_with_tables_locks_before_opening_transaction() {
    let (conn, state) = mock_connection();
    conn.begin_transaction(&["orders"]).unwrap();

    assert_eq!(
        state.borrow().events,
        vec![Event::ExecRaw("LOCK TABLES orders WRITE".into()), Event::Begin]
    );
    assert!(conn.in_transaction());
}

#[test]
fn begin_without_tables_does_not_lock() {
    let (conn, state) = mock_connection();
    conn.begin_transaction(&[]).unwrap();
    assert_eq!(state.borrow().events, vec![Event::Begin]);
}

#[test]
fn commit_finishes_then_unlocks() {
    let (conn, state) = mock_connection();
    conn.begin_transaction(&["orders", "items"]).unwrap();
    conn.commit().unwrap();

    assert_eq!(
        state.borrow().events,
        vec![
            Event::ExecRaw("LOCK TABLES orders WRITE, items WRITE".into()),
            Event::Begin,
            Event::Commit,
            Event::ExecRaw("UNLOCK TABLES".into()),
        ]
    );
    assert!(!conn.in_transaction());
}

#[test]
fn failed_commit_still_unlocks_and_reports_failure() {
    let (conn, state) = mock_connection();
    state.borrow_mut().fail_commit = true;
    conn.begin_transaction(&["orders"]).unwrap();

    let err = conn.commit().unwrap_err();
    assert!(err.is_query());
    assert_eq!(err.sql(), Some("COMMIT"));
    assert_eq!(
        state.borrow().raw_statements(),
        vec!["LOCK TABLES orders WRITE", "UNLOCK TABLES"]
    );
}

#[test]
fn failed_unlock_makes_commit_fail() {
    let (conn, state) = mock_connection();
    conn.begin_transaction(&["orders"]).unwrap();
    state.borrow_mut().fail_raw_prefix = Some("UNLOCK".into());

    let err = conn.commit().unwrap_err();
    assert_eq!(err.sql(), Some("UNLOCK TABLES"));
    assert!(state.borrow().events.contains(&Event::Commit));
}

#[test]
fn rollback_reports_finish_error_when_both_steps_fail() {
    let (conn, state) = mock_connection();
    conn.begin_transaction(&["orders"]).unwrap();
    {
        let mut s = state.borrow_mut();
        s.fail_rollback = true;
        s.fail_raw_prefix = Some("UNLOCK".into());
    }

    let err = conn.rollback().unwrap_err();
    assert_eq!(err.sql(), Some("ROLLBACK"));
    assert!(err.to_string().contains("rollback failed"));
    assert_eq!(
        state.borrow().raw_statements().last().map(String::as_str),
        Some("UNLOCK TABLES")
    );
}

#[test]
fn rollback_always_unlocks() {
    let (conn, state) = mock_connection();
    conn.begin_transaction(&["orders"]).unwrap();
    conn.rollback().unwrap();
    assert_eq!(
        state.borrow().events[2..],
        [Event::Rollback, Event::ExecRaw("UNLOCK TABLES".into())]
    );
}

#[test]
fn drivers_without_table_locks_skip_lock_statements() {
    let (conn, state) = mock_connection();
    state.borrow_mut().supports_locks = false;

    conn.begin_transaction(&["orders"]).unwrap();
    conn.commit().unwrap();
    assert_eq!(state.borrow().events, vec![Event::Begin, Event::Commit]);
}

#[test]
fn lock_tables_requires_a_table() {
    let (conn, _) = mock_connection();
    assert!(conn.lock_tables(&[]).unwrap_err().is_invalid_usage());
}

#[test]
fn binds_positionally_with_type_hints() {
    let (conn, state) = mock_connection();
    state.borrow_mut().affected = 1;

    let n = conn
        .table("t")
        .where_eq("id", 5)
        .update(Record::from([("name", "Bob")]))
        .unwrap();
    assert_eq!(n, 1);

    let s = state.borrow();
    assert_eq!(s.prepared(), vec!["UPDATE t SET name = ? WHERE id = ?"]);
    assert_eq!(
        s.binds(),
        vec![
            (1, Value::from("Bob"), ParamType::Text),
            (2, Value::Int(5), ParamType::Integer),
        ]
    );
}

#[test]
fn execution_failure_carries_interpolated_sql() {
    let (conn, state) = mock_connection();
    state.borrow_mut().fail_execute = Some("Duplicate entry".into());

    let err = conn
        .table("users")
        .insert(Record::new().set("id", 1).set("name", "O'Neil"))
        .unwrap_err();

    match &err {
        DbError::Query { sql, source } => {
            assert_eq!(sql, "INSERT INTO users (id, name) VALUES (1, 'O''Neil')");
            assert_eq!(source.message(), "Duplicate entry");
        }
        other => panic!("expected query error, got {other:?}"),
    }
    assert_eq!(err.driver_code(), Some("23000"));
    assert_eq!(
        err.to_string(),
        "Duplicate entry\n Query: INSERT INTO users (id, name) VALUES (1, 'O''Neil')"
    );
}

#[test]
fn insert_returns_last_insert_id() {
    let (conn, state) = mock_connection();
    state.borrow_mut().last_id = 42;

    let id = conn.table("users").insert(Record::from([("name", "x")])).unwrap();
    assert_eq!(id, 42);
}

#[test]
fn aggregate_reads_valor_column() {
    let (conn, state) = mock_connection();
    state.borrow_mut().rows = vec![row(&[("valor", Value::Int(7))])];

    let n = conn.table("users").select(["ignored"]).count("id").unwrap();
    assert_eq!(n, Some(Value::Int(7)));
    assert_eq!(
        state.borrow().prepared(),
        vec!["SELECT COUNT(id) AS valor FROM users"]
    );
}

#[test]
fn aggregate_without_row_is_none() {
    let (conn, _) = mock_connection();
    assert_eq!(conn.table("users").max("age").unwrap(), None);
}

#[test]
fn fetch_one_passes_cursor_through() {
    let (conn, state) = mock_connection();
    state.borrow_mut().rows = vec![
        row(&[("id", Value::Int(1))]),
        row(&[("id", Value::Int(2))]),
    ];

    let last: Option<querykit::Row> = conn
        .fetch_one("SELECT id FROM t", &[], Cursor::Last)
        .unwrap();
    assert_eq!(last.unwrap().get("id"), Some(&Value::Int(2)));
    assert!(state.borrow().events.contains(&Event::Fetch(Cursor::Last)));
}

#[test]
fn first_adds_no_limit() {
    let (conn, state) = mock_connection();
    conn.table("users").where_eq("id", 3).first().unwrap();
    assert_eq!(
        state.borrow().prepared(),
        vec!["SELECT * FROM users WHERE id = ?"]
    );
}

#[test]
fn update_or_insert_updates_when_a_row_matches() {
    let (conn, state) = mock_connection();
    {
        let mut s = state.borrow_mut();
        s.rows = vec![row(&[("id", Value::Int(1))])];
        s.affected = 1;
    }

    let outcome = conn
        .table("users")
        .update_or_insert(
            Record::from([("email", "a@x.io")]),
            Record::from([("name", "Ana")]),
        )
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated(1));
    assert_eq!(
        state.borrow().prepared(),
        vec![
            "SELECT * FROM users WHERE email = ?",
            "UPDATE users SET name = ? WHERE email = ?",
        ]
    );
}

#[test]
fn update_or_insert_inserts_union_on_a_fresh_builder() {
    let (conn, state) = mock_connection();
    state.borrow_mut().last_id = 9;

    let outcome = conn
        .table("users")
        .update_or_insert(
            Record::from([("email", "a@x.io")]),
            Record::from([("name", "Ana")]),
        )
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Inserted(9));

    let s = state.borrow();
    assert_eq!(
        s.prepared()[1],
        "INSERT INTO users (email, name) VALUES (?, ?)"
    );
    // The lookup's predicate value is not carried into the insert.
    let insert_binds: Vec<_> = s.binds().into_iter().skip(1).collect();
    assert_eq!(
        insert_binds,
        vec![
            (1, Value::from("a@x.io"), ParamType::Text),
            (2, Value::from("Ana"), ParamType::Text),
        ]
    );
}
