use sqlstencil::driver::{row_to_json, Driver, SqliteDriver, Value};
use sqlstencil::{compile_with, execute, Commit, Session, StencilError, Substitutions, Template, TransactionState};

fn setup() -> Session<SqliteDriver> {
    let mut session = Session::new(SqliteDriver::open_in_memory().expect("open"));
    session
        .execute_script("create table person (id integer primary key, name text not null);")
        .expect("schema");
    session
}

fn count(session: &mut Session<SqliteDriver>) -> i64 {
    let rows = session
        .execute(&Template::new("select count(*) from {table}"), &Substitutions::new().with("table", "person"))
        .expect("count")
        .expect("rows");
    rows[0][0].as_integer().expect("integer")
}

fn insert() -> Template {
    Template::new("insert into {table} ({columns}) values (%values%)")
}

fn person(id: &str, name: &str) -> Substitutions {
    Substitutions::new()
        .with("table", "person")
        .with("columns", vec!["id", "name"])
        .with("values", vec![id, name])
}

#[test]
fn mutations_return_nothing_and_queries_return_rows() {
    let mut session = setup();
    let inserted = session.execute(&insert(), &person("1", "Alice")).expect("insert");
    assert!(inserted.is_none());
    let rows = session
        .execute(
            &Template::new("select {column} from {table} where id = %id%"),
            &Substitutions::new().with("column", "name").with("table", "person").with("id", "1"),
        )
        .expect("select")
        .expect("rows");
    assert_eq!(rows, vec![vec![Value::Text("Alice".to_string())]]);
    assert!(!session.driver().in_transaction(), "single statements commit immediately");
}

#[test]
fn query_without_matches_returns_empty_rows() {
    let mut session = setup();
    let rows = session
        .execute(&Template::new("select * from person where id = %id%"), &Substitutions::new().with("id", "42"))
        .expect("select");
    assert_eq!(rows, Some(vec![]));
}

#[test]
fn batch_commits_once() {
    let mut session = setup();
    let mut batch = session.batch();
    for (id, name) in [("1", "Alice"), ("2", "Bob"), ("3", "Carol")] {
        batch.execute(&insert(), &person(id, name)).expect("insert");
    }
    assert_eq!(batch.len(), 3);
    assert_eq!(batch.state(), TransactionState::Open);
    batch.commit().expect("commit");
    assert_eq!(count(&mut session), 3);
}

#[test]
fn failing_row_rolls_back_the_whole_batch() {
    let mut session = setup();
    let mut batch = session.batch();
    batch.execute(&insert(), &person("1", "Alice")).expect("first row");
    let err = batch.execute(&insert(), &person("1", "Bob")).unwrap_err();
    assert!(matches!(err, StencilError::ExecutionFailure { .. }), "unexpected {err}");
    assert_eq!(batch.state(), TransactionState::RolledBack);
    // the batch is closed, later rows cannot sneak into a fresh transaction
    let err = batch.execute(&insert(), &person("3", "Carol")).unwrap_err();
    assert!(matches!(err, StencilError::TransactionClosed));
    assert!(matches!(batch.commit(), Err(StencilError::TransactionClosed)));
    assert!(!session.driver().in_transaction());
    assert_eq!(count(&mut session), 0);
}

#[test]
fn execution_failure_leaves_no_open_transaction() {
    let mut session = setup();
    let err = session.execute(&Template::new("selec 1"), &Substitutions::new()).unwrap_err();
    assert!(matches!(err, StencilError::ExecutionFailure { .. }));
    assert!(!err.is_composition());
    assert!(!session.driver().in_transaction());

    session.execute(&insert(), &person("1", "Alice")).expect("insert");
    let err = session.execute(&insert(), &person("1", "Again")).unwrap_err();
    assert!(matches!(err, StencilError::ExecutionFailure { ref sql, .. } if sql.contains("insert into")));
    assert!(!session.driver().in_transaction());
    assert_eq!(count(&mut session), 1);
}

#[test]
fn composition_errors_never_reach_the_database() {
    let mut session = setup();
    let mut batch = session.batch();
    batch.execute(&insert(), &person("1", "Alice")).expect("insert");
    let err = batch
        .execute(&insert(), &Substitutions::new().with("table", "person").with("nope", "x"))
        .unwrap_err();
    assert!(err.is_composition());
    // a template mistake does not abort the batch
    assert_eq!(batch.state(), TransactionState::Open);
    batch.commit().expect("commit");
    assert_eq!(count(&mut session), 1);
}

#[test]
fn dropped_batch_rolls_back() {
    let mut session = setup();
    {
        let mut batch = session.batch();
        batch.execute(&insert(), &person("1", "Alice")).expect("insert");
    }
    assert!(!session.driver().in_transaction());
    assert_eq!(count(&mut session), 0);
}

#[test]
fn explicit_rollback() {
    let mut session = setup();
    let mut batch = session.batch();
    batch.execute(&insert(), &person("1", "Alice")).expect("insert");
    batch.rollback().expect("rollback");
    assert_eq!(count(&mut session), 0);
}

#[test]
fn deferred_commit_keeps_the_transaction_open() {
    let mut driver = SqliteDriver::open_in_memory().expect("open");
    driver.execute_script("create table person (id integer primary key, name text not null);").expect("schema");
    driver.commit().expect("commit");

    let statement = compile_with(&insert(), &person("1", "Alice"), &driver, driver.placeholder()).expect("compile");
    assert_eq!(statement.sql(), r#"insert into "person" ("id", "name") values (?, ?)"#);
    execute(&mut driver, &statement, Commit::Deferred).expect("insert");
    assert!(driver.in_transaction());
    driver.rollback().expect("rollback");

    let rows = driver.execute("select count(*) from person", &[]).expect("count").expect("rows");
    assert_eq!(rows[0][0], Value::Integer(0));
}

#[test]
fn failure_at_commit_rolls_the_batch_back() {
    let driver = SqliteDriver::open_in_memory().expect("open");
    // only takes effect outside a transaction
    driver.connection().execute_batch("PRAGMA foreign_keys = ON").expect("pragma");
    let mut session = Session::new(driver);
    session
        .execute_script(
            "create table parent (id integer primary key);
             create table child (
                 id integer primary key,
                 parent_id integer references parent(id) deferrable initially deferred
             );",
        )
        .expect("schema");

    let mut batch = session.batch();
    let orphan = Substitutions::new()
        .with("table", "child")
        .with("columns", vec!["id", "parent_id"])
        .with("values", vec!["1", "99"]);
    batch.execute(&insert(), &orphan).expect("deferred constraint is not checked yet");
    assert_eq!(batch.state(), TransactionState::Open);
    let err = batch.commit().unwrap_err();
    assert!(matches!(err, StencilError::ExecutionFailure { ref sql, .. } if sql == "COMMIT"), "unexpected {err}");

    assert!(!session.driver().in_transaction(), "the failed commit was rolled back");
    let rows = session
        .execute(&Template::new("select count(*) from {table}"), &Substitutions::new().with("table", "child"))
        .expect("count")
        .expect("rows");
    assert_eq!(rows[0][0], Value::Integer(0));
}

#[test]
fn rows_render_as_json_arrays() {
    let row = vec![Value::Null, Value::Integer(1), Value::Real(1.5), Value::Text("a.mp4".to_string())];
    assert_eq!(row_to_json(&row).expect("json"), r#"[null,1,1.5,"a.mp4"]"#);
}
