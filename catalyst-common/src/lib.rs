//! # Catalyst Common Library
//!
//! Shared code for the Catalyst project-management backend including:
//! - Domain models (projects, users, labels, cycles, modules, tickets)
//! - Database initialization and versioned schema migrations
//! - Configuration loading and root folder resolution
//! - Common error type

pub mod color;
pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
