//! # SusuCircle Shared Library
//!
//! This crate contains the models, persistence layer, and group
//! coordination logic shared by the SusuCircle API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and repository operations
//! - `groups`: Lifecycle engine, membership manager, invitation manager
//! - `auth`: Identity-provider adapters and authentication middleware
//! - `db`: Connection pooling and migrations

pub mod auth;
pub mod db;
pub mod groups;
pub mod models;

/// Current version of the SusuCircle shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
