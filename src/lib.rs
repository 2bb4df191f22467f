// ABOUTME: Main library for the oh-sqlite application
// ABOUTME: Contains app setup, command registration, and module declarations

use serde::{Deserialize, Serialize};

// Module declarations
#[cfg(feature = "app")]
pub mod commands;
pub mod config;
pub mod db;
pub mod models;
pub mod value;

pub use db::{BridgeError, ConnectionRegistry, RecordStore};
pub use models::{ExecResult, QueryResult};
pub use value::{Row, SqlValue};

/// Standard response format for the app-level commands
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub messages: Messages,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Messages {
    pub error: Vec<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            messages: Messages::default(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            messages: Messages {
                error: vec![message],
            },
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub connected: bool,
    pub version: String,
    pub platform: String,
    #[serde(rename = "openDatabases", default)]
    pub open_databases: Vec<String>,
}

#[cfg(feature = "app")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    let (config, config_error) = match config::AppConfig::load() {
        Ok(c) => (c, None),
        Err(e) => (config::AppConfig::default(), Some(e)),
    };

    tauri::Builder::default()
        .plugin(
            tauri_plugin_log::Builder::default()
                .level(config.log_level_filter())
                .build(),
        )
        .setup(move |app| {
            if let Some(e) = config_error {
                log::warn!("Failed to load config, using defaults: {}", e);
            }

            let platform_dir = app.path().app_data_dir().ok();
            let data_dir = config.resolve_data_dir(platform_dir)?;
            log::info!("Database directory: {}", data_dir.display());

            app.manage(ConnectionRegistry::new(data_dir));
            app.manage(config);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::open_db,
            commands::close_db,
            commands::is_open,
            commands::execute_sql,
            commands::query_sql,
            commands::check_health,
            commands::init_records,
            commands::add_user,
            commands::list_users,
            commands::user_count,
            commands::delete_user,
            commands::clear_users,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
