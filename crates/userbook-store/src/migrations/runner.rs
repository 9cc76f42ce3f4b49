//! Migration runner
//!
//! Advances the schema one version at a time. Each step and its
//! `schema_version` row commit together, so the recorded version always
//! describes the schema on disk.

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use crate::migrations::checksums::compute_checksum;
use crate::migrations::embedded::{get_migrations, Migration, LATEST_VERSION};
use rusqlite::{Connection, OptionalExtension};
use userbook_core::errors::UserbookError;

/// Bring the database up to `LATEST_VERSION`
///
/// Verifies the checksums of already-applied migrations first, then applies
/// whatever is pending. Returns the resulting schema version.
///
/// # Errors
/// - `Migration` if the database is newer than this build or a step fails
/// - `ConstraintViolation` if an applied migration no longer matches its SQL
pub fn apply_migrations(conn: &mut Connection) -> Result<u32> {
    create_schema_version_table(conn)?;

    let current = current_version(conn)?;
    if current > LATEST_VERSION {
        return Err(UserbookError::SchemaAhead {
            on_disk: current,
            supported: LATEST_VERSION,
        }
        .into());
    }

    verify_checksums(conn)?;
    migrate(conn, current, LATEST_VERSION)
}

/// Apply the registered migrations `from + 1 ..= to` in order
///
/// Versions at or below the recorded version are skipped, so repeating a
/// migration request is a no-op. Returns the resulting schema version.
///
/// # Errors
/// - `MigrationGap` if `to < from` or `from` is ahead of the recorded version
/// - `UnknownSchemaVersion` if `to` has no registered migration
/// - `Migration` if a step fails; earlier steps stay applied
pub fn migrate(conn: &mut Connection, from: u32, to: u32) -> Result<u32> {
    migrate_with(conn, get_migrations(), from, to)
}

fn migrate_with(conn: &mut Connection, migrations: &[Migration], from: u32, to: u32) -> Result<u32> {
    create_schema_version_table(conn)?;

    if to < from {
        return Err(UserbookError::MigrationGap { from, to }.into());
    }
    if to as usize > migrations.len() {
        return Err(UserbookError::UnknownSchemaVersion { version: to }.into());
    }

    let current = current_version(conn)?;
    if from > current {
        // Starting past the recorded version would skip steps
        return Err(UserbookError::MigrationGap { from, to }.into());
    }

    for migration in &migrations[from as usize..to as usize] {
        if migration.version <= current {
            tracing::debug!(
                schema_version = migration.version,
                migration_id = migration.id,
                "migration already applied"
            );
            continue;
        }
        apply_migration(conn, migration)?;
    }

    current_version(conn)
}

/// Highest applied schema version, or 0 for an empty database
///
/// # Errors
/// `Persistence` if the version table cannot be read.
pub fn current_version(conn: &Connection) -> Result<u32> {
    if !schema_version_exists(conn)? {
        return Ok(0);
    }

    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(from_rusqlite)
}

/// Check every recorded migration against the embedded SQL
///
/// Rows for versions newer than this build are left to `apply_migrations`,
/// which refuses such databases outright.
///
/// # Errors
/// `ConstraintViolation` on the first id or checksum that differs.
pub fn verify_checksums(conn: &Connection) -> Result<()> {
    verify_with(conn, get_migrations())
}

fn verify_with(conn: &Connection, migrations: &[Migration]) -> Result<()> {
    if !schema_version_exists(conn)? {
        return Ok(());
    }

    let mut stmt = conn
        .prepare("SELECT version, migration_id, checksum FROM schema_version ORDER BY version")
        .map_err(from_rusqlite)?;
    let recorded: Vec<(u32, String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    for (version, migration_id, checksum) in recorded {
        let Some(migration) = migrations.iter().find(|m| m.version == version) else {
            continue;
        };
        let expected = compute_checksum(migration.sql);
        if migration.id != migration_id || expected != checksum {
            return Err(checksum_mismatch(&migration_id, &expected, &checksum));
        }
    }

    Ok(())
}

fn schema_version_exists(conn: &Connection) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |_| Ok(()),
        )
        .optional()
        .map_err(from_rusqlite)?;
    Ok(found.is_some())
}

/// Create the schema_version table if it doesn't exist
fn create_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            migration_id TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL,
            checksum TEXT NOT NULL
        )",
        [],
    )
    .map_err(from_rusqlite)?;

    Ok(())
}

/// Apply a single migration and record it, all in one transaction
fn apply_migration(conn: &mut Connection, migration: &Migration) -> Result<()> {
    let checksum = compute_checksum(migration.sql);

    let tx = conn.transaction().map_err(from_rusqlite)?;

    // Dropping `tx` on the error path rolls the step back
    tx.execute_batch(migration.sql).map_err(|e| {
        let reason = e.to_string();
        migration_error(migration.id, &reason).with_source(from_rusqlite(e))
    })?;

    let now = chrono::Utc::now().timestamp_millis();
    tx.execute(
        "INSERT INTO schema_version (version, migration_id, applied_at, checksum) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![migration.version, migration.id, now, checksum],
    )
    .map_err(from_rusqlite)?;

    tx.commit().map_err(from_rusqlite)?;

    tracing::info!(
        schema_version = migration.version,
        migration_id = migration.id,
        "applied migration"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use userbook_core::errors::ExErrorKind;

    fn columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("SELECT name FROM pragma_table_info('{}')", table))
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        names
    }

    const BROKEN: [Migration; 2] = [
        Migration {
            version: 1,
            id: "001_create_user",
            sql: include_str!("../../migrations/001_create_user.sql"),
        },
        Migration {
            version: 2,
            id: "002_half_applied",
            sql: "ALTER TABLE user ADD COLUMN nickname TEXT;
                  INSERT INTO no_such_table VALUES (1);",
        },
    ];

    #[test]
    fn test_apply_migrations() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(apply_migrations(&mut conn).unwrap(), LATEST_VERSION);
        assert!(columns(&conn, "user").contains(&"email".to_string()));
    }

    #[test]
    fn test_idempotency() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        assert_eq!(apply_migrations(&mut conn).unwrap(), LATEST_VERSION);
        assert_eq!(migrate(&mut conn, 1, 2).unwrap(), LATEST_VERSION);
    }

    #[test]
    fn test_current_version_of_empty_database() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(current_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_failed_step_rolls_back_to_previous_version() {
        let mut conn = Connection::open_in_memory().unwrap();

        let err = migrate_with(&mut conn, &BROKEN, 0, 2).unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::Migration);
        assert!(err.message().contains("002_half_applied"));
        assert_eq!(current_version(&conn).unwrap(), 1);
        assert!(!columns(&conn, "user").contains(&"nickname".to_string()));
    }

    #[test]
    fn test_checksum_verification_detects_renamed_migration() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate_with(&mut conn, &BROKEN[..1], 0, 1).unwrap();

        let renamed = [Migration {
            id: "001_renamed",
            ..BROKEN[0]
        }];
        let err = verify_with(&conn, &renamed).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
    }

    #[test]
    fn test_rejects_backwards_and_skipping_requests() {
        let mut conn = Connection::open_in_memory().unwrap();

        let backwards = migrate(&mut conn, 2, 1).unwrap_err();
        assert_eq!(backwards.kind(), ExErrorKind::Migration);

        // Nothing applied yet, so starting at 1 would skip version 1
        let skipping = migrate(&mut conn, 1, 2).unwrap_err();
        assert_eq!(skipping.kind(), ExErrorKind::Migration);

        let unknown = migrate(&mut conn, 0, LATEST_VERSION + 1).unwrap_err();
        assert!(unknown.message().contains("Unknown schema version"));

        assert_eq!(current_version(&conn).unwrap(), 0);
    }
}
