#![cfg(feature = "sqlite")]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use sql_dispatch::prelude::*;

fn drain_until_idle(connector: &mut Connector) -> Result<usize, DispatchError> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut total = 0;
    while connector.in_flight() > 0 && Instant::now() < deadline {
        total += connector.check_results()?;
        thread::sleep(Duration::from_millis(5));
    }
    Ok(total)
}

fn templates() -> Vec<StatementTemplate> {
    vec![
        StatementTemplate::new(
            "create_schema",
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER);\n\
             CREATE INDEX idx_users_name ON users(name);",
            Vec::<String>::new(),
        ),
        StatementTemplate::new(
            "insert_user",
            "INSERT INTO users (name, age) VALUES (:name, :age)",
            ["name", "age"],
        ),
        StatementTemplate::new(
            "select_adults",
            "SELECT name, age FROM users WHERE age >= :min_age ORDER BY name",
            ["min_age"],
        ),
        StatementTemplate::new(
            "update_age",
            "UPDATE users SET age = :age WHERE name = :name",
            ["age", "name"],
        ),
        StatementTemplate::new(
            "delete_user",
            "DELETE FROM users WHERE name = :name",
            ["name"],
        ),
        StatementTemplate::new(
            "bad_insert",
            "INSERT INTO missing_table (name) VALUES (:name)",
            ["name"],
        ),
    ]
}

fn user(name: &str, age: i64) -> NamedArgs {
    let mut args = NamedArgs::new();
    args.insert("name".to_string(), SqlValue::Text(name.to_string()));
    args.insert("age".to_string(), SqlValue::Int(age));
    args
}

#[test]
fn sqlite_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("dispatch.db");
    let mut connector = Connector::sqlite(&db_path, 2)?;
    connector.set_query_logging(true);
    connector.load_queries(templates())?;

    // Schema first; drain before inserting so a second worker cannot race
    // the DDL.
    let created = Arc::new(AtomicBool::new(false));
    {
        let created = Arc::clone(&created);
        connector.execute_generic(
            "create_schema",
            &NamedArgs::new(),
            move || created.store(true, Ordering::SeqCst),
            None,
        )?;
    }
    drain_until_idle(&mut connector)?;
    assert!(created.load(Ordering::SeqCst));
    assert!(connector.connection_established());
    assert!(!connector.has_connection_error());

    // Concurrent inserts; row ids are unique regardless of completion order.
    let insert_ids = Arc::new(Mutex::new(Vec::new()));
    for (name, age) in [("Alice", 30), ("Bob", 25), ("Carol", 35)] {
        let insert_ids = Arc::clone(&insert_ids);
        connector.execute_insert(
            "insert_user",
            &user(name, age),
            move |id, affected| {
                assert_eq!(affected, 1);
                insert_ids.lock().unwrap().push(id);
            },
            None,
        )?;
    }
    drain_until_idle(&mut connector)?;
    let ids: HashSet<i64> = insert_ids.lock().unwrap().iter().copied().collect();
    assert_eq!(ids, HashSet::from([1, 2, 3]));

    // Select with a bound threshold.
    let adults = Arc::new(Mutex::new(Vec::new()));
    {
        let adults = Arc::clone(&adults);
        let mut args = NamedArgs::new();
        args.insert("min_age".to_string(), SqlValue::Int(28));
        connector.execute_select(
            "select_adults",
            &args,
            move |rows| {
                let mut adults = adults.lock().unwrap();
                for row in rows.rows() {
                    adults.push((
                        row.get("name").unwrap().as_text().unwrap().to_string(),
                        *row.get("age").unwrap().as_int().unwrap(),
                    ));
                }
            },
            None,
        )?;
    }
    drain_until_idle(&mut connector)?;
    assert_eq!(
        *adults.lock().unwrap(),
        vec![("Alice".to_string(), 30), ("Carol".to_string(), 35)]
    );

    // DML reports affected rows.
    let affected = Arc::new(AtomicUsize::new(0));
    {
        let affected = Arc::clone(&affected);
        connector.execute_change(
            "update_age",
            &user("Bob", 26),
            move |rows| {
                affected.store(rows as usize, Ordering::SeqCst);
            },
            None,
        )?;
    }
    drain_until_idle(&mut connector)?;
    assert_eq!(affected.load(Ordering::SeqCst), 1);

    // Generic statements take parameters too.
    let deleted = Arc::new(AtomicBool::new(false));
    {
        let deleted = Arc::clone(&deleted);
        let mut args = NamedArgs::new();
        args.insert("name".to_string(), SqlValue::Text("Carol".to_string()));
        connector.execute_generic(
            "delete_user",
            &args,
            move || deleted.store(true, Ordering::SeqCst),
            None,
        )?;
    }
    drain_until_idle(&mut connector)?;
    assert!(deleted.load(Ordering::SeqCst));

    // Execution failures carry the failing query to the error branch.
    let failure = Arc::new(Mutex::new(None));
    {
        let failure = Arc::clone(&failure);
        let mut args = NamedArgs::new();
        args.insert("name".to_string(), SqlValue::Text("Dave".to_string()));
        connector.execute_insert(
            "bad_insert",
            &args,
            |_, _| panic!("bad_insert must not succeed"),
            Some(Box::new(move |f| *failure.lock().unwrap() = Some(f))),
        )?;
    }
    drain_until_idle(&mut connector)?;
    let failure = failure.lock().unwrap().take().expect("error callback fired");
    assert!(failure.message.contains("missing_table"));
    assert!(failure.query.unwrap().contains("INSERT INTO missing_table"));

    connector.close()?;
    Ok(())
}

#[test]
fn statement_files_load_as_json_records() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let file_path = dir.path().join("statements.json");
    let records = vec![
        StatementTemplate::new("create_t", "CREATE TABLE t (v TEXT)", Vec::<String>::new()),
        StatementTemplate::new("insert_t", "INSERT INTO t (v) VALUES (:v)", ["v"]),
    ];
    std::fs::write(&file_path, serde_json::to_string_pretty(&records)?)?;

    let mut connector = Connector::sqlite(dir.path().join("t.db"), 1)?;
    connector.load_query_file(&file_path)?;
    assert!(connector.statements().contains("create_t"));
    assert!(connector.statements().contains("insert_t"));

    // Duplicate names in a second file surface as load errors.
    let err = connector.load_query_file(&file_path).unwrap_err();
    assert!(matches!(err, DispatchError::DuplicateStatement(_)));

    let hit = Arc::new(AtomicBool::new(false));
    {
        let hit = Arc::clone(&hit);
        connector.execute_generic(
            "create_t",
            &NamedArgs::new(),
            move || hit.store(true, Ordering::SeqCst),
            None,
        )?;
    }
    drain_until_idle(&mut connector)?;
    assert!(hit.load(Ordering::SeqCst));

    connector.close()?;
    Ok(())
}

#[test]
fn failed_connections_answer_with_error_envelopes() -> Result<(), Box<dyn std::error::Error>> {
    // A path whose parent directory does not exist: the worker thread spawns
    // but its connection attempt fails.
    let mut connector = Connector::sqlite("/nonexistent-dir/sql-dispatch/x.db", 1)?;
    connector.load_query(StatementTemplate::new(
        "ping",
        "SELECT 1",
        Vec::<String>::new(),
    ))?;

    let deadline = Instant::now() + Duration::from_secs(5);
    while !connector.has_connection_error() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(connector.has_connection_error());
    assert!(!connector.connection_established());
    assert!(connector.last_connection_error().is_some());

    // Requests still complete their callback contract, via the error branch.
    let failure = Arc::new(Mutex::new(None));
    {
        let failure = Arc::clone(&failure);
        connector.execute_generic(
            "ping",
            &NamedArgs::new(),
            || panic!("must not succeed without a connection"),
            Some(Box::new(move |f| *failure.lock().unwrap() = Some(f))),
        )?;
    }
    drain_until_idle(&mut connector)?;
    let failure = failure.lock().unwrap().take().expect("error callback fired");
    assert!(failure.message.contains("no connection"));

    connector.close()?;
    Ok(())
}
