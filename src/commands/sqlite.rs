// ABOUTME: SQL bridge Tauri commands
// ABOUTME: Thin pass-through from the frontend to the connection registry

use tauri::State;

use crate::db::ConnectionRegistry;
use crate::models::{ExecResult, QueryResult};
use crate::value::SqlValue;
use crate::HealthResponse;

/// Open (or create) the database for a logical name
#[tauri::command]
pub fn open_db(registry: State<'_, ConnectionRegistry>, name: String) -> bool {
    registry.open(&name)
}

#[tauri::command]
pub fn close_db(registry: State<'_, ConnectionRegistry>, name: String) -> bool {
    registry.close(&name)
}

#[tauri::command]
pub fn is_open(registry: State<'_, ConnectionRegistry>, name: String) -> bool {
    registry.is_open(&name)
}

/// Run an insert/update/delete/DDL statement
#[tauri::command]
pub fn execute_sql(
    registry: State<'_, ConnectionRegistry>,
    name: String,
    sql: String,
    args: Option<Vec<SqlValue>>,
) -> ExecResult {
    registry.execute(&name, &sql, &args.unwrap_or_default())
}

/// Run a read statement and return every row
#[tauri::command]
pub fn query_sql(
    registry: State<'_, ConnectionRegistry>,
    name: String,
    sql: String,
    args: Option<Vec<SqlValue>>,
) -> QueryResult {
    registry.query(&name, &sql, &args.unwrap_or_default())
}

/// Check overall health status
#[tauri::command]
pub fn check_health(registry: State<'_, ConnectionRegistry>) -> crate::ApiResponse<HealthResponse> {
    let open_databases = registry.open_names();
    crate::ApiResponse::success(HealthResponse {
        connected: !open_databases.is_empty(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        platform: std::env::consts::OS.to_string(),
        open_databases,
    })
}
