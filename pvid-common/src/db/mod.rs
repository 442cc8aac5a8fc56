//! Database models and connection handling

pub mod init;
pub mod models;

pub use init::*;
pub use models::*;
