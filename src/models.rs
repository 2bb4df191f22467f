// ABOUTME: Shared data models for oh-sqlite
// ABOUTME: Result envelopes returned by the bridge and the user records shown on the home page

use serde::{Deserialize, Serialize};

use crate::value::Row;

/// Envelope for mutating statements
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecResult {
    pub success: bool,
    #[serde(rename = "rowsAffected")]
    pub rows_affected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecResult {
    pub fn ok(rows_affected: usize) -> Self {
        Self {
            success: true,
            rows_affected,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            rows_affected: 0,
            error: Some(message.into()),
        }
    }
}

/// Envelope for read statements; rows are fully materialized
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub success: bool,
    pub data: Vec<Row>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    pub fn ok(data: Vec<Row>) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// A stored user record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub score: f64,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

/// Fields for a record that has not been inserted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    pub score: f64,
}

/// Score band used for card styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    Excellent,
    Good,
    Low,
}

impl ScoreTier {
    pub fn classify(score: f64, excellent: f64, good: f64) -> Self {
        if score >= excellent {
            ScoreTier::Excellent
        } else if score >= good {
            ScoreTier::Good
        } else {
            ScoreTier::Low
        }
    }
}

/// Record plus its tier, as rendered in the list
#[derive(Debug, Clone, Serialize)]
pub struct UserCard {
    #[serde(flatten)]
    pub record: UserRecord,
    pub tier: ScoreTier,
}
