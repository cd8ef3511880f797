// Integration tests for the migration framework

use fieldtrail_store::migrations::{applied_migrations, apply_migrations, compute_checksum};
use rusqlite::Connection;

fn setup_test_db() -> Connection {
    Connection::open_in_memory().expect("Failed to create in-memory database")
}

fn get_table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    let mut conn = setup_test_db();

    let result = apply_migrations(&mut conn);
    assert!(
        result.is_ok(),
        "Migrations should succeed: {:?}",
        result.err()
    );

    let tables = get_table_names(&conn);
    assert_eq!(tables, vec!["documents", "schema_version"]);
}

#[test]
fn test_migration_idempotency() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    apply_migrations(&mut conn).unwrap();

    let version_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version_count, 1, "Each migration is recorded once");
    assert_eq!(applied_migrations(&conn).unwrap(), vec!["001_documents"]);
}

#[test]
fn test_recorded_checksum_matches_embedded_sql() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();

    let stored: String = conn
        .query_row(
            "SELECT checksum FROM schema_version WHERE migration_id = '001_documents'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(
        stored,
        compute_checksum(include_str!("../migrations/001_documents.sql"))
    );
}

#[test]
fn test_tampered_checksum_is_rejected() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    conn.execute(
        "UPDATE schema_version SET checksum = 'deadbeef' WHERE migration_id = '001_documents'",
        [],
    )
    .unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();
    assert_eq!(err.code(), "ERR_PERSISTENCE");
    assert!(err.message().contains("Checksum mismatch for migration 001_documents"));
}

#[test]
fn test_documents_primary_key_is_collection_and_id() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();

    conn.execute(
        "INSERT INTO documents (collection, id, body, created_at, updated_at) VALUES ('a', '1', '{}', 0, 0)",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO documents (collection, id, body, created_at, updated_at) VALUES ('b', '1', '{}', 0, 0)",
        [],
    )
    .unwrap();
    let duplicate = conn.execute(
        "INSERT INTO documents (collection, id, body, created_at, updated_at) VALUES ('a', '1', '{}', 0, 0)",
        [],
    );
    assert!(duplicate.is_err());
}
