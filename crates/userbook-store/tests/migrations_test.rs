// Integration tests for the schema migration framework

use rusqlite::Connection;
use userbook_core::errors::ExErrorKind;
use userbook_store::migrations::{self, LATEST_VERSION};
use userbook_store::repo::SqliteRepo;
use userbook_store::UserStore;

fn setup_test_db() -> Connection {
    Connection::open_in_memory().expect("Failed to create in-memory database")
}

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
        .unwrap();
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    tables
}

fn user_columns(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info('user')")
        .unwrap();
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    columns
}

#[test]
fn test_apply_migrations_on_empty_db() {
    let mut conn = setup_test_db();

    let version = migrations::apply_migrations(&mut conn).unwrap();

    assert_eq!(version, LATEST_VERSION);
    assert_eq!(
        table_names(&conn),
        vec!["schema_version", "sqlite_sequence", "user"]
    );
    assert_eq!(
        user_columns(&conn),
        vec!["id", "first_name", "last_name", "age", "created_at", "avatar", "email"]
    );
}

#[test]
fn test_migration_idempotency() {
    let mut conn = setup_test_db();
    migrations::apply_migrations(&mut conn).unwrap();

    migrations::apply_migrations(&mut conn).unwrap();
    migrations::migrate(&mut conn, 0, LATEST_VERSION).unwrap();

    let version_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version_count, i64::from(LATEST_VERSION));
}

#[test]
fn test_v1_to_v2_preserves_rows_and_leaves_email_absent() {
    // Given: a database that stopped at version 1 with existing users
    let mut conn = setup_test_db();
    assert_eq!(migrations::migrate(&mut conn, 0, 1).unwrap(), 1);
    assert!(!user_columns(&conn).contains(&"email".to_string()));

    conn.execute_batch(
        "INSERT INTO user (first_name, last_name, age, created_at) VALUES ('John', 'Doe', 30, 1000);
         INSERT INTO user (first_name, last_name) VALUES ('Ann', 'Lee');",
    )
    .unwrap();

    // When: it is upgraded to version 2
    assert_eq!(migrations::migrate(&mut conn, 1, 2).unwrap(), 2);

    // Then: every row survives with email absent and defaults intact
    let users = SqliteRepo::list_users(&conn).unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].fields.first_name.as_deref(), Some("Ann"));
    assert_eq!(users[0].fields.age, 0);
    assert_eq!(users[1].fields.first_name.as_deref(), Some("John"));
    assert_eq!(users[1].fields.created_at, Some(1000));
    assert!(users.iter().all(|u| u.fields.email.is_none()));
}

#[test]
fn test_store_open_upgrades_v1_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    {
        let mut conn = Connection::open(&path).unwrap();
        migrations::migrate(&mut conn, 0, 1).unwrap();
        conn.execute(
            "INSERT INTO user (first_name, last_name, age) VALUES ('Old', 'Timer', 70)",
            [],
        )
        .unwrap();
    }

    let store = UserStore::open(&path).unwrap();

    assert_eq!(store.schema_version().unwrap(), 2);
    let old = store.get_by_id(1).unwrap().unwrap();
    assert_eq!(old.full_name(), "Old Timer");
    assert!(old.fields.email.is_none());
}

#[test]
fn test_checksums_are_recorded() {
    let mut conn = setup_test_db();
    migrations::apply_migrations(&mut conn).unwrap();

    let checksum: String = conn
        .query_row(
            "SELECT checksum FROM schema_version WHERE migration_id = ?",
            ["001_create_user"],
            |row| row.get(0),
        )
        .unwrap();

    assert_eq!(checksum.len(), 64, "SHA256 checksum should be 64 hex chars");
    migrations::verify_checksums(&conn).unwrap();
}

#[test]
fn test_checksum_mismatch_blocks_open() {
    let mut conn = setup_test_db();
    migrations::apply_migrations(&mut conn).unwrap();
    conn.execute(
        "UPDATE schema_version SET checksum = 'tampered' WHERE version = 1",
        [],
    )
    .unwrap();

    let err = migrations::apply_migrations(&mut conn).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);

    let err = UserStore::from_connection(conn).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
}

#[test]
fn test_newer_database_is_refused() {
    let mut conn = setup_test_db();
    migrations::apply_migrations(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO schema_version (version, migration_id, applied_at, checksum)
         VALUES (?1, '999_future', 0, 'x')",
        [LATEST_VERSION + 1],
    )
    .unwrap();

    let err = migrations::apply_migrations(&mut conn).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Migration);
    assert!(err.message().contains("newer"));
}

#[test]
fn test_get_migrations_lists_every_version() {
    let ids: Vec<_> = migrations::get_migrations().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["001_create_user", "002_add_user_email"]);
}
