//! # PVID Common Library
//!
//! Shared code for PVID archive analysis tools including:
//! - Error types
//! - Configuration loading and connection-string assembly
//! - Database models and connection pools
//! - Date and list utilities

pub mod collections;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
