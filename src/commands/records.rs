// ABOUTME: Record management Tauri commands for the home page
// ABOUTME: Init, add, list, delete and clear user records through the SQL bridge

use tauri::State;

use crate::config::AppConfig;
use crate::db::{BridgeError, ConnectionRegistry, RecordStore};
use crate::models::{NewUser, UserCard};
use crate::ApiResponse;

fn record_store<'a>(
    registry: &'a ConnectionRegistry,
    config: &AppConfig,
) -> Result<RecordStore<'a>, BridgeError> {
    RecordStore::new(registry, config.database_name.clone(), &config.records)
}

/// Open the app database and create the records table
#[tauri::command]
pub fn init_records(
    registry: State<'_, ConnectionRegistry>,
    config: State<'_, AppConfig>,
) -> ApiResponse<()> {
    let store = match record_store(&registry, &config) {
        Ok(s) => s,
        Err(e) => return ApiResponse::error(format!("Failed to open record store: {}", e)),
    };

    match store.init() {
        Ok(_) => ApiResponse::success(()),
        Err(e) => ApiResponse::error(format!("Failed to initialize records: {}", e)),
    }
}

#[tauri::command]
pub fn add_user(
    registry: State<'_, ConnectionRegistry>,
    config: State<'_, AppConfig>,
    user: NewUser,
) -> ApiResponse<i64> {
    let store = match record_store(&registry, &config) {
        Ok(s) => s,
        Err(e) => return ApiResponse::error(format!("Failed to open record store: {}", e)),
    };

    match store.add(&user) {
        Ok(id) => ApiResponse::success(id),
        Err(e) => ApiResponse::error(format!("Failed to add user: {}", e)),
    }
}

/// Get all records with their score tier, newest first
#[tauri::command]
pub fn list_users(
    registry: State<'_, ConnectionRegistry>,
    config: State<'_, AppConfig>,
) -> ApiResponse<Vec<UserCard>> {
    let store = match record_store(&registry, &config) {
        Ok(s) => s,
        Err(e) => return ApiResponse::error(format!("Failed to open record store: {}", e)),
    };

    match store.cards() {
        Ok(cards) => ApiResponse::success(cards),
        Err(e) => ApiResponse::error(format!("Failed to get users: {}", e)),
    }
}

#[tauri::command]
pub fn user_count(
    registry: State<'_, ConnectionRegistry>,
    config: State<'_, AppConfig>,
) -> ApiResponse<i64> {
    let store = match record_store(&registry, &config) {
        Ok(s) => s,
        Err(e) => return ApiResponse::error(format!("Failed to open record store: {}", e)),
    };

    match store.count() {
        Ok(count) => ApiResponse::success(count),
        Err(e) => ApiResponse::error(format!("Failed to count users: {}", e)),
    }
}

#[tauri::command]
pub fn delete_user(
    registry: State<'_, ConnectionRegistry>,
    config: State<'_, AppConfig>,
    id: i64,
) -> ApiResponse<bool> {
    let store = match record_store(&registry, &config) {
        Ok(s) => s,
        Err(e) => return ApiResponse::error(format!("Failed to open record store: {}", e)),
    };

    match store.delete(id) {
        Ok(true) => ApiResponse::success(true),
        Ok(false) => ApiResponse::error(format!("User not found: {}", id)),
        Err(e) => ApiResponse::error(format!("Failed to delete user: {}", e)),
    }
}

/// Remove every record
#[tauri::command]
pub fn clear_users(
    registry: State<'_, ConnectionRegistry>,
    config: State<'_, AppConfig>,
) -> ApiResponse<usize> {
    let store = match record_store(&registry, &config) {
        Ok(s) => s,
        Err(e) => return ApiResponse::error(format!("Failed to open record store: {}", e)),
    };

    match store.clear() {
        Ok(removed) => ApiResponse::success(removed),
        Err(e) => ApiResponse::error(format!("Failed to clear users: {}", e)),
    }
}
