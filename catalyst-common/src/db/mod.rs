//! Database initialization and schema management

pub mod init;
pub mod migrations;

pub use init::{init_database, init_memory_database};
pub use migrations::{run_migrations, CURRENT_SCHEMA_VERSION};
