// ABOUTME: Name-addressed registry of open SQLite handles
// ABOUTME: Every call returns a bool or a result envelope; engine errors never escape

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, info, warn};
use rusqlite::{params_from_iter, Connection};
use thiserror::Error;

use crate::models::{ExecResult, QueryResult};
use crate::value::{Row, SqlValue};

const DB_SUFFIX: &str = ".db";

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Database not opened")]
    NotOpened(String),
    #[error("Invalid database name: {0:?}")]
    InvalidName(String),
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection registry lock poisoned")]
    Poisoned,
    #[error("Missing or mistyped column: {column}")]
    Column { column: String },
    #[error("{0}")]
    Failed(String),
}

/// Open database handles keyed by logical name.
///
/// Each handle backs one `<name>.db` file under `base_dir`. A single mutex
/// guards the map and is held while a statement runs, so calls made through
/// one registry are serialized.
pub struct ConnectionRegistry {
    base_dir: PathBuf,
    connections: Mutex<HashMap<String, Connection>>,
}

impl ConnectionRegistry {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            connections: Mutex::new(HashMap::new()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// File backing `name`; `.db` is appended unless already present
    pub fn db_path(&self, name: &str) -> PathBuf {
        if name.ends_with(DB_SUFFIX) {
            self.base_dir.join(name)
        } else {
            self.base_dir.join(format!("{name}{DB_SUFFIX}"))
        }
    }

    /// Names map to a file directly under `base_dir`; no separators or parent hops
    fn check_name(name: &str) -> Result<(), BridgeError> {
        let stem = name.strip_suffix(DB_SUFFIX).unwrap_or(name);
        if stem.is_empty()
            || Path::new(name).is_absolute()
            || name.contains(['/', '\\'])
            || name.contains("..")
        {
            return Err(BridgeError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    fn connections(&self) -> Result<MutexGuard<'_, HashMap<String, Connection>>, BridgeError> {
        self.connections.lock().map_err(|_| BridgeError::Poisoned)
    }

    /// Open or create the database for `name`. Already-open names succeed
    /// without reopening.
    pub fn open(&self, name: &str) -> bool {
        match self.try_open(name) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to open database '{}': {}", name, e);
                false
            }
        }
    }

    fn try_open(&self, name: &str) -> Result<(), BridgeError> {
        Self::check_name(name)?;
        let mut connections = self.connections()?;
        if connections.contains_key(name) {
            return Ok(());
        }

        std::fs::create_dir_all(&self.base_dir)?;
        let path = self.db_path(name);
        let conn = Connection::open(&path)?;
        connections.insert(name.to_string(), conn);

        info!("Opened database '{}' at {}", name, path.display());
        Ok(())
    }

    /// Release the handle for `name`. Closing an unknown name succeeds.
    pub fn close(&self, name: &str) -> bool {
        match self.try_close(name) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to close database '{}': {}", name, e);
                false
            }
        }
    }

    fn try_close(&self, name: &str) -> Result<(), BridgeError> {
        let mut connections = self.connections()?;
        let Some(conn) = connections.remove(name) else {
            return Ok(());
        };

        match conn.close() {
            Ok(()) => {
                info!("Closed database '{}'", name);
                Ok(())
            }
            Err((conn, e)) => {
                // Handle is still live; keep it registered
                connections.insert(name.to_string(), conn);
                Err(e.into())
            }
        }
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.connections()
            .map(|connections| connections.contains_key(name))
            .unwrap_or(false)
    }

    /// Names with a live handle, sorted
    pub fn open_names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.connections() {
            Ok(connections) => connections.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Run a mutating statement once with positional `?` parameters
    pub fn execute(&self, name: &str, sql: &str, args: &[SqlValue]) -> ExecResult {
        match self.try_execute(name, sql, args) {
            Ok(changes) => ExecResult::ok(changes),
            Err(e) => {
                warn!("execute on '{}' failed: {}", name, e);
                ExecResult::failed(e.to_string())
            }
        }
    }

    /// Run a mutating statement, reporting the engine's change count
    pub fn try_execute(&self, name: &str, sql: &str, args: &[SqlValue]) -> Result<usize, BridgeError> {
        let connections = self.connections()?;
        let conn = connections
            .get(name)
            .ok_or_else(|| BridgeError::NotOpened(name.to_string()))?;

        let changes = conn.execute(sql, params_from_iter(args.iter()))?;
        debug!("execute on '{}' changed {} row(s)", name, changes);
        Ok(changes)
    }

    /// Run a read statement and collect every row
    pub fn query(&self, name: &str, sql: &str, args: &[SqlValue]) -> QueryResult {
        match self.try_query(name, sql, args) {
            Ok(rows) => QueryResult::ok(rows),
            Err(e) => {
                warn!("query on '{}' failed: {}", name, e);
                QueryResult::failed(e.to_string())
            }
        }
    }

    pub fn try_query(&self, name: &str, sql: &str, args: &[SqlValue]) -> Result<Vec<Row>, BridgeError> {
        let connections = self.connections()?;
        let conn = connections
            .get(name)
            .ok_or_else(|| BridgeError::NotOpened(name.to_string()))?;

        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|column| column.to_string())
            .collect();

        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        let mut data = Vec::new();
        while let Some(row) = rows.next()? {
            let mut decoded = Row::with_capacity(columns.len());
            for (idx, column) in columns.iter().enumerate() {
                decoded.push(column.as_str(), SqlValue::from(row.get_ref(idx)?));
            }
            data.push(decoded);
        }

        debug!("query on '{}' returned {} row(s)", name, data.len());
        Ok(data)
    }
}

impl Drop for ConnectionRegistry {
    fn drop(&mut self) {
        let connections = match self.connections.get_mut() {
            Ok(connections) => connections,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (name, conn) in connections.drain() {
            if let Err((_, e)) = conn.close() {
                warn!("Failed to close database '{}' on shutdown: {}", name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry() -> (TempDir, ConnectionRegistry) {
        let dir = TempDir::new().unwrap();
        let registry = ConnectionRegistry::new(dir.path());
        (dir, registry)
    }

    #[test]
    fn test_db_path_suffix() {
        let (dir, registry) = registry();
        assert_eq!(registry.db_path("app"), dir.path().join("app.db"));
        assert_eq!(registry.db_path("app.db"), dir.path().join("app.db"));
    }

    #[test]
    fn test_open_twice_keeps_one_handle() {
        let (dir, registry) = registry();
        assert!(registry.open("app"));
        assert!(registry.open("app"));
        assert_eq!(registry.open_names(), vec!["app".to_string()]);
        assert!(registry.is_open("app"));
        assert!(dir.path().join("app.db").exists());
        assert_eq!(registry.base_dir(), dir.path());
    }

    #[test]
    fn test_open_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("data");
        let registry = ConnectionRegistry::new(&nested);
        assert!(registry.open("app"));
        assert!(nested.join("app.db").exists());
    }

    #[test]
    fn test_open_failure_returns_false() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let registry = ConnectionRegistry::new(&blocker);
        assert!(!registry.open("app"));
        assert!(!registry.is_open("app"));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (_dir, registry) = registry();
        assert!(registry.close("never"));

        assert!(registry.open("app"));
        assert!(registry.close("app"));
        assert!(!registry.is_open("app"));
        assert!(registry.close("app"));
    }

    #[test]
    fn test_unopened_name_fails_without_panic() {
        let (_dir, registry) = registry();

        let exec = registry.execute("ghost", "CREATE TABLE t(id INTEGER)", &[]);
        assert!(!exec.success);
        assert_eq!(exec.error.as_deref(), Some("Database not opened"));

        let query = registry.query("ghost", "SELECT 1", &[]);
        assert!(!query.success);
        assert!(query.data.is_empty());
        assert_eq!(query.error.as_deref(), Some("Database not opened"));
    }

    #[test]
    fn test_closed_name_does_not_reopen() {
        let (_dir, registry) = registry();
        assert!(registry.open("app"));
        assert!(registry.close("app"));

        let exec = registry.execute("app", "CREATE TABLE t(id INTEGER)", &[]);
        assert_eq!(exec.error.as_deref(), Some("Database not opened"));
        assert!(!registry.is_open("app"));
    }

    #[test]
    fn test_insert_then_select_round_trip() {
        let (_dir, registry) = registry();
        assert!(registry.open("app"));

        let created = registry.execute("app", "CREATE TABLE t(id INTEGER, name TEXT)", &[]);
        assert!(created.success);
        assert_eq!(created.rows_affected, 0);

        let inserted = registry.execute(
            "app",
            "INSERT INTO t VALUES (?, ?)",
            &[SqlValue::Integer(1), SqlValue::from("Ann")],
        );
        assert_eq!(inserted, ExecResult::ok(1));

        let result = registry.query("app", "SELECT * FROM t WHERE id = ?", &[SqlValue::Integer(1)]);
        assert!(result.success);
        assert_eq!(result.data.len(), 1);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": true, "data": [{"id": 1, "name": "Ann"}]})
        );
    }

    #[test]
    fn test_rows_affected_counts_changes() {
        let (_dir, registry) = registry();
        registry.open("app");
        registry.execute("app", "CREATE TABLE t(id INTEGER)", &[]);
        for i in 0..3 {
            registry.execute("app", "INSERT INTO t VALUES (?)", &[SqlValue::Integer(i)]);
        }

        let deleted = registry.execute("app", "DELETE FROM t WHERE id >= ?", &[SqlValue::Integer(1)]);
        assert_eq!(deleted.rows_affected, 2);
    }

    #[test]
    fn test_empty_query_is_success() {
        let (_dir, registry) = registry();
        registry.open("app");
        registry.execute("app", "CREATE TABLE t(id INTEGER)", &[]);

        let result = registry.query("app", "SELECT * FROM t WHERE id = ?", &[SqlValue::Integer(42)]);
        assert_eq!(result, QueryResult::ok(Vec::new()));
    }

    #[test]
    fn test_null_parameter_round_trips() {
        let (_dir, registry) = registry();
        registry.open("app");
        registry.execute("app", "CREATE TABLE t(id INTEGER, note TEXT)", &[]);
        registry.execute(
            "app",
            "INSERT INTO t VALUES (?, ?)",
            &[SqlValue::Integer(1), SqlValue::Null],
        );

        let result = registry.query("app", "SELECT note FROM t WHERE id = ?", &[SqlValue::Integer(1)]);
        assert!(result.data[0].get("note").is_some_and(SqlValue::is_null));
    }

    #[test]
    fn test_column_types_decode() {
        let (_dir, registry) = registry();
        registry.open("app");

        let result = registry.query("app", "SELECT 1 AS i, 2.5 AS r, 'x' AS t, NULL AS n, x'0aff' AS b", &[]);
        let row = &result.data[0];
        assert_eq!(row.get("i"), Some(&SqlValue::Integer(1)));
        assert_eq!(row.get("r"), Some(&SqlValue::Real(2.5)));
        assert_eq!(row.get("t"), Some(&SqlValue::from("x")));
        assert_eq!(row.get("n"), Some(&SqlValue::Null));
        assert_eq!(row.get("b"), Some(&SqlValue::from("0AFF")));
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["i", "r", "t", "n", "b"]);
    }

    #[test]
    fn test_engine_errors_become_envelopes() {
        let (_dir, registry) = registry();
        registry.open("app");

        let syntax = registry.execute("app", "CREAT TABLE t(id INTEGER)", &[]);
        assert!(!syntax.success);
        assert!(syntax.error.unwrap().contains("syntax error"));

        registry.execute("app", "CREATE TABLE u(id INTEGER PRIMARY KEY)", &[]);
        registry.execute("app", "INSERT INTO u VALUES (1)", &[]);
        let duplicate = registry.execute("app", "INSERT INTO u VALUES (1)", &[]);
        assert!(!duplicate.success);
        assert!(duplicate.error.unwrap().contains("UNIQUE constraint failed"));

        let missing = registry.query("app", "SELECT * FROM nowhere", &[]);
        assert!(!missing.success);
        assert!(missing.error.unwrap().contains("no such table"));
    }

    #[test]
    fn test_names_are_isolated() {
        let (_dir, registry) = registry();
        registry.open("a");
        registry.open("b");
        registry.execute("a", "CREATE TABLE t(id INTEGER)", &[]);

        assert!(registry.query("a", "SELECT * FROM t", &[]).success);
        assert!(!registry.query("b", "SELECT * FROM t", &[]).success);
        assert_eq!(registry.open_names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_data_survives_reopen() {
        let (_dir, registry) = registry();
        registry.open("app");
        registry.execute("app", "CREATE TABLE t(id INTEGER)", &[]);
        registry.execute("app", "INSERT INTO t VALUES (7)", &[]);
        registry.close("app");

        registry.open("app");
        let result = registry.query("app", "SELECT id FROM t", &[]);
        assert_eq!(result.data[0].get("id"), Some(&SqlValue::Integer(7)));
    }

    #[test]
    fn test_names_outside_base_dir_are_rejected() {
        let (dir, registry) = registry();
        let outside = TempDir::new().unwrap();
        let absolute = outside.path().join("evil");

        assert!(!registry.open(absolute.to_str().unwrap()));
        assert!(!outside.path().join("evil.db").exists());
        assert!(!registry.open("../x"));
        assert!(!dir.path().parent().unwrap().join("x.db").exists());
        for name in ["", ".db", "a/b", "a\\b", "..", "x..y"] {
            assert!(!registry.open(name), "accepted {name:?}");
        }
        assert!(registry.open_names().is_empty());

        assert!(registry.open("app.db"));
        assert!(registry.db_path("app.db").starts_with(registry.base_dir()));
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConnectionRegistry>();
    }

    #[test]
    fn test_concurrent_inserts_are_serialized() {
        use std::sync::Arc;

        const THREADS: i64 = 8;
        const PER_THREAD: i64 = 25;

        let (_dir, registry) = registry();
        let registry = Arc::new(registry);
        assert!(registry.open("app"));
        assert!(registry.execute("app", "CREATE TABLE t(worker INTEGER, n INTEGER)", &[]).success);

        let handles: Vec<_> = (0..THREADS)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    (0..PER_THREAD).all(|n| {
                        let result = registry.execute(
                            "app",
                            "INSERT INTO t VALUES (?, ?)",
                            &[SqlValue::Integer(worker), SqlValue::Integer(n)],
                        );
                        result.success && result.rows_affected == 1
                    })
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }

        let result = registry.query("app", "SELECT COUNT(*) AS total FROM t", &[]);
        assert_eq!(result.data[0].get("total"), Some(&SqlValue::Integer(THREADS * PER_THREAD)));
    }

    #[test]
    fn test_non_finite_reals_render_as_text() {
        let (_dir, registry) = registry();
        registry.open("app");

        let result = registry.query("app", "SELECT 1e999 AS big, -1e999 AS small", &[]);
        assert_eq!(result.data[0].get("big"), Some(&SqlValue::from("inf")));
        assert_eq!(result.data[0].get("small"), Some(&SqlValue::from("-inf")));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["data"][0]["big"], "inf");
    }
}
