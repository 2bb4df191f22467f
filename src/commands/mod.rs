// ABOUTME: Tauri command module exports
// ABOUTME: Organizes all frontend-callable commands by category

pub mod records;
pub mod sqlite;

pub use records::*;
pub use sqlite::*;
