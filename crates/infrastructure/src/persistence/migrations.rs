//! Database migrations
//!
//! Manages the `message_mappings` and `contacts` schema, tracked in
//! `schema_migrations(version, applied_at)`.

use rusqlite::Connection;
use tracing::{debug, info};

use super::connection::DatabaseError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_schema_version(conn)?;

    if current_version < SCHEMA_VERSION {
        info!(
            from_version = current_version,
            to_version = SCHEMA_VERSION,
            "Running database migrations"
        );

        if current_version < 1 {
            migrate_v1(conn)?;
            set_schema_version(conn, 1)?;
        }

        info!(version = SCHEMA_VERSION, "Database migrations complete");
    } else {
        debug!(version = current_version, "Database schema is up to date");
    }

    Ok(())
}

/// Get current schema version
fn get_schema_version(conn: &Connection) -> Result<i32, DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;

    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(version)
}

/// Record that `version` has been applied.
fn set_schema_version(conn: &Connection, version: i32) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![version, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Migration to version 1: mapping store + contact cache.
///
/// `whatsapp_chat_id`, `whatsapp_msg_id`, `signal_msg_id`, and
/// `phone_number` are stored encrypted (BLOB); the `*_index` sibling
/// columns carry a deterministic HMAC blind index so lookups stay possible
/// without decrypting every row.
fn migrate_v1(conn: &Connection) -> Result<(), DatabaseError> {
    debug!("Applying migration v1: message_mappings and contacts");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS message_mappings (
            whatsapp_chat_id BLOB NOT NULL,
            whatsapp_chat_id_index TEXT NOT NULL,
            whatsapp_msg_id BLOB NOT NULL,
            whatsapp_msg_id_index TEXT NOT NULL,
            signal_msg_id BLOB NOT NULL,
            signal_msg_id_index TEXT NOT NULL,
            signal_timestamp INTEGER NOT NULL,
            session_name TEXT NOT NULL,
            media_type TEXT NOT NULL,
            delivery_status TEXT NOT NULL,
            forwarded_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (whatsapp_msg_id_index, signal_msg_id_index)
        );

        CREATE INDEX IF NOT EXISTS idx_mappings_whatsapp_id
            ON message_mappings(whatsapp_msg_id_index);
        CREATE INDEX IF NOT EXISTS idx_mappings_signal_id
            ON message_mappings(signal_msg_id_index);
        CREATE INDEX IF NOT EXISTS idx_mappings_session_chat
            ON message_mappings(session_name, whatsapp_chat_id_index, created_at);
        CREATE INDEX IF NOT EXISTS idx_mappings_forwarded_at
            ON message_mappings(forwarded_at);

        CREATE TABLE IF NOT EXISTS contacts (
            contact_id TEXT PRIMARY KEY,
            phone_number BLOB NOT NULL,
            phone_number_index TEXT NOT NULL UNIQUE,
            name TEXT,
            push_name TEXT,
            short_name TEXT,
            is_blocked INTEGER NOT NULL,
            is_group INTEGER NOT NULL,
            is_my_contact INTEGER NOT NULL,
            cached_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_contacts_phone
            ON contacts(phone_number_index);
        CREATE INDEX IF NOT EXISTS idx_contacts_cached_at
            ON contacts(cached_at);
        ",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            ",
        )
        .unwrap();
        conn
    }

    #[test]
    fn run_migrations_creates_tables() {
        let conn = create_test_connection();
        run_migrations(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert!(tables.contains(&"message_mappings".to_string()));
        assert!(tables.contains(&"contacts".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = create_test_connection();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
    }

    #[test]
    fn schema_version_tracked() {
        let conn = create_test_connection();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn mapping_composite_pk_rejects_duplicate() {
        let conn = create_test_connection();
        run_migrations(&conn).unwrap();

        let insert = "INSERT INTO message_mappings (
            whatsapp_chat_id, whatsapp_chat_id_index, whatsapp_msg_id, whatsapp_msg_id_index,
            signal_msg_id, signal_msg_id_index, signal_timestamp, session_name, media_type,
            delivery_status, forwarded_at, created_at, updated_at
        ) VALUES (x'00', 'c1', x'00', 'w1', x'00', 's1', 1, 'personal', 'text', 'pending', '2024-01-01', '2024-01-01', '2024-01-01')";

        conn.execute(insert, []).unwrap();
        let result = conn.execute(insert, []);
        assert!(result.is_err());
    }

    #[test]
    fn contact_phone_index_is_unique() {
        let conn = create_test_connection();
        run_migrations(&conn).unwrap();

        let insert = "INSERT INTO contacts (
            contact_id, phone_number, phone_number_index, name, push_name, short_name,
            is_blocked, is_group, is_my_contact, cached_at
        ) VALUES (?1, x'00', 'p1', NULL, NULL, NULL, 0, 0, 1, '2024-01-01')";

        conn.execute(insert, [uuid::Uuid::new_v4().to_string()])
            .unwrap();
        let result = conn.execute(insert, [uuid::Uuid::new_v4().to_string()]);
        assert!(result.is_err());
    }
}
