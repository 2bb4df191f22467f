// ABOUTME: Database module exports for oh-sqlite
// ABOUTME: Connection registry (the SQL bridge) and the record store built on it

pub mod records;
pub mod registry;

pub use records::RecordStore;
pub use registry::{BridgeError, ConnectionRegistry};
