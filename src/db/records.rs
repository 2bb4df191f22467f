// ABOUTME: User record storage for the home page
// ABOUTME: Goes through the connection registry only, never touching rusqlite directly

use log::info;

use crate::config::RecordsConfig;
use crate::db::registry::{BridgeError, ConnectionRegistry};
use crate::models::{NewUser, ScoreTier, UserCard, UserRecord};
use crate::value::{Row, SqlValue};

const MAX_AGE: i64 = 150;
const MAX_SCORE: f64 = 100.0;

pub struct RecordStore<'a> {
    registry: &'a ConnectionRegistry,
    name: String,
    table: String,
    excellent_score: f64,
    good_score: f64,
}

impl<'a> RecordStore<'a> {
    pub fn new(
        registry: &'a ConnectionRegistry,
        name: impl Into<String>,
        config: &RecordsConfig,
    ) -> Result<Self, BridgeError> {
        if !is_identifier(&config.table) {
            return Err(BridgeError::Failed(format!(
                "Invalid table name: {}",
                config.table
            )));
        }

        Ok(Self {
            registry,
            name: name.into(),
            table: config.table.clone(),
            excellent_score: config.excellent_score,
            good_score: config.good_score,
        })
    }

    /// Open the connection and create the table if needed
    pub fn init(&self) -> Result<(), BridgeError> {
        if !self.registry.open(&self.name) {
            return Err(BridgeError::Failed(format!(
                "Failed to open database: {}",
                self.name
            )));
        }

        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                gender TEXT,
                age INTEGER,
                score REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
            self.table
        );
        self.registry.try_execute(&self.name, &sql, &[])?;

        info!("Record table '{}' ready in '{}'", self.table, self.name);
        Ok(())
    }

    /// Insert a record and return its id
    pub fn add(&self, user: &NewUser) -> Result<i64, BridgeError> {
        validate(user)?;

        // RETURNING keeps the id lookup under the same registry lock as the insert
        let sql = format!(
            "INSERT INTO {} (name, gender, age, score, created_at) VALUES (?, ?, ?, ?, ?) RETURNING id",
            self.table
        );
        let rows = self.registry.try_query(
            &self.name,
            &sql,
            &[
                SqlValue::from(user.name.trim()),
                SqlValue::from(user.gender.clone()),
                SqlValue::from(user.age),
                SqlValue::Real(user.score),
                SqlValue::from(chrono::Utc::now().to_rfc3339()),
            ],
        )?;

        rows.first()
            .and_then(|row| row.get("id"))
            .and_then(SqlValue::as_i64)
            .ok_or_else(|| BridgeError::Column {
                column: "id".to_string(),
            })
    }

    /// All records, newest first
    pub fn list(&self) -> Result<Vec<UserRecord>, BridgeError> {
        let sql = format!(
            "SELECT id, name, gender, age, score, created_at FROM {} ORDER BY id DESC",
            self.table
        );
        self.registry
            .try_query(&self.name, &sql, &[])?
            .iter()
            .map(decode_user)
            .collect()
    }

    pub fn cards(&self) -> Result<Vec<UserCard>, BridgeError> {
        Ok(self
            .list()?
            .into_iter()
            .map(|record| UserCard {
                tier: self.tier(&record),
                record,
            })
            .collect())
    }

    pub fn count(&self) -> Result<i64, BridgeError> {
        let sql = format!("SELECT COUNT(*) AS total FROM {}", self.table);
        let rows = self.registry.try_query(&self.name, &sql, &[])?;
        rows.first()
            .and_then(|row| row.get("total"))
            .and_then(SqlValue::as_i64)
            .ok_or_else(|| BridgeError::Column {
                column: "total".to_string(),
            })
    }

    /// Returns true when a record was removed
    pub fn delete(&self, id: i64) -> Result<bool, BridgeError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.table);
        let changes = self
            .registry
            .try_execute(&self.name, &sql, &[SqlValue::Integer(id)])?;
        Ok(changes > 0)
    }

    /// Remove every record, returning how many went away
    pub fn clear(&self) -> Result<usize, BridgeError> {
        let sql = format!("DELETE FROM {}", self.table);
        let removed = self.registry.try_execute(&self.name, &sql, &[])?;
        info!("Cleared {} record(s) from '{}'", removed, self.table);
        Ok(removed)
    }

    pub fn tier(&self, record: &UserRecord) -> ScoreTier {
        ScoreTier::classify(record.score, self.excellent_score, self.good_score)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate(user: &NewUser) -> Result<(), BridgeError> {
    if user.name.trim().is_empty() {
        return Err(BridgeError::Failed("Name is required".to_string()));
    }
    if let Some(age) = user.age {
        if !(0..=MAX_AGE).contains(&age) {
            return Err(BridgeError::Failed(format!(
                "Age must be between 0 and {MAX_AGE}"
            )));
        }
    }
    if !(0.0..=MAX_SCORE).contains(&user.score) {
        return Err(BridgeError::Failed(format!(
            "Score must be between 0 and {MAX_SCORE}"
        )));
    }
    Ok(())
}

fn decode_user(row: &Row) -> Result<UserRecord, BridgeError> {
    let column = |name: &str| BridgeError::Column {
        column: name.to_string(),
    };

    Ok(UserRecord {
        id: row.get("id").and_then(SqlValue::as_i64).ok_or_else(|| column("id"))?,
        name: row
            .get("name")
            .and_then(SqlValue::as_str)
            .ok_or_else(|| column("name"))?
            .to_string(),
        gender: row.get("gender").and_then(SqlValue::as_str).map(str::to_string),
        age: row.get("age").and_then(SqlValue::as_i64),
        score: row
            .get("score")
            .and_then(SqlValue::as_f64)
            .ok_or_else(|| column("score"))?,
        created_at: row
            .get("created_at")
            .and_then(SqlValue::as_str)
            .map(str::to_string),
    })
}
