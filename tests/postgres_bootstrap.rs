//! Bootstrap against a live PostgreSQL server.
//!
//! Run with:
//! `MIGRATE_TEST_PG_DSN="host=localhost user=postgres password=postgres dbname=postgres" cargo test -- --ignored`

#![cfg(feature = "postgres")]

use std::sync::{Arc, Mutex};

use migrate_bootstrap::database::{quote_ident, QueryLogger};
use migrate_bootstrap::*;

fn connect() -> DatabaseConn {
    let dsn = std::env::var("MIGRATE_TEST_PG_DSN").expect("MIGRATE_TEST_PG_DSN must be set");
    DatabaseConn::connect_postgres(&parse_connection_config(&dsn)).unwrap()
}

fn use_fresh_schema(db: &mut DatabaseConn, schema: &str) {
    db.execute(
        &format!("DROP SCHEMA IF EXISTS {} CASCADE", quote_ident(schema)),
        &[],
    )
    .unwrap();
    db.execute(&format!("CREATE SCHEMA {}", quote_ident(schema)), &[])
        .unwrap();
    db.execute(&format!("SET search_path TO {}", quote_ident(schema)), &[])
        .unwrap();
}

fn drop_schema(db: &mut DatabaseConn, schema: &str) {
    db.execute(
        &format!("DROP SCHEMA IF EXISTS {} CASCADE", quote_ident(schema)),
        &[],
    )
    .unwrap();
}

#[test]
#[ignore]
fn test_bootstrap_creates_table_once() {
    let mut db = connect();
    let schema = "migrate_bootstrap_it_a";
    use_fresh_schema(&mut db, schema);

    assert_eq!(get_current_schema(&mut db).unwrap(), schema);

    let table = register_migration_table(schema);
    assert!(!migration_table_exists(&mut db, &table).unwrap());

    let engine = TrackingTableEngine::new();
    let first = init_migration_table_if_needed(&mut db, &engine).unwrap();
    assert_eq!(first, BootstrapOutcome::Initialized { table: table.clone() });
    assert!(migration_table_exists(&mut db, &table).unwrap());

    let second = init_migration_table_if_needed(&mut db, &engine).unwrap();
    assert_eq!(second, BootstrapOutcome::AlreadyInitialized { table: table.clone() });

    let change = engine
        .run(&mut db, &table, MigrationCommand::SetVersion(4))
        .unwrap();
    assert_eq!(change, VersionChange { old: 0, new: 4 });

    drop_schema(&mut db, schema);
}

#[test]
#[ignore]
fn test_bootstrap_logs_queries() {
    let logged = Arc::new(Mutex::new(Vec::new()));
    let sink = logged.clone();

    let mut db = connect();
    let schema = "migrate_bootstrap_it_b";
    use_fresh_schema(&mut db, schema);

    db.set_hook(Some(Arc::new(QueryLogger::new(
        move |query, _| sink.lock().unwrap().push(query.to_string()),
        |err| panic!("unexpected format error: {}", err),
    ))));

    init_migration_table_if_needed(&mut db, &TrackingTableEngine::new()).unwrap();

    let logged = logged.lock().unwrap();
    assert_eq!(logged[0], "SHOW search_path");
    assert!(logged[1].contains("table_schema = 'migrate_bootstrap_it_b'::text"));
    assert!(logged
        .iter()
        .any(|q| q.starts_with("CREATE TABLE IF NOT EXISTS")));

    db.set_hook(None);
    drop_schema(&mut db, schema);
}
