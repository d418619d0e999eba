//! SQLite-based store implementation

use chrono::{DateTime, Local};
use curfew_api::Schedule;
use curfew_util::PackageId;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{AuditEvent, AuditEventType, Store, StoreError, StoreResult};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Full schedule list per application
            CREATE TABLE IF NOT EXISTS schedules (
                package_id TEXT PRIMARY KEY,
                schedules_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Legacy manual lock flags
            CREATE TABLE IF NOT EXISTS manual_locks (
                package_id TEXT PRIMARY KEY,
                locked INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

impl Store for SqliteStore {
    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| curfew_util::now());
            let event: AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn load_schedules(&self, package_id: &PackageId) -> StoreResult<Vec<Schedule>> {
        let conn = self.conn()?;

        let json: Option<String> = conn
            .query_row(
                "SELECT schedules_json FROM schedules WHERE package_id = ?",
                [package_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(s) => Ok(serde_json::from_str(&s)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_schedules(&self, package_id: &PackageId, schedules: &[Schedule]) -> StoreResult<()> {
        let json = serde_json::to_string(schedules)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO schedules (package_id, schedules_json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(package_id)
            DO UPDATE SET schedules_json = excluded.schedules_json,
                          updated_at = excluded.updated_at
            "#,
            params![
                package_id.as_str(),
                json,
                curfew_util::now().to_rfc3339()
            ],
        )?;
        tx.commit()?;

        debug!(
            package_id = %package_id,
            schedule_count = schedules.len(),
            "Schedules saved"
        );
        Ok(())
    }

    fn load_manual_lock(&self, package_id: &PackageId) -> StoreResult<bool> {
        let conn = self.conn()?;

        let locked: Option<bool> = conn
            .query_row(
                "SELECT locked FROM manual_locks WHERE package_id = ?",
                [package_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(locked.unwrap_or(false))
    }

    fn save_manual_lock(&self, package_id: &PackageId, locked: bool) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO manual_locks (package_id, locked)
            VALUES (?, ?)
            ON CONFLICT(package_id)
            DO UPDATE SET locked = excluded.locked
            "#,
            params![package_id.as_str(), locked],
        )?;

        debug!(package_id = %package_id, locked, "Manual lock saved");
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
